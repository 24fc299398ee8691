//! Trait definitions for transform stages.

use crate::source::SourceText;

/// Executable output of a transform stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Function body in CommonJS form. Expects `React`, `exports`, `require`
    /// and `module` to be bound by the caller.
    pub code: String,

    /// Module specifiers the unit passes to `require`, in source order
    pub imports: Vec<String>,

    /// Names the unit assigns on `exports` (`default` included)
    pub exports: Vec<String>,
}

impl CompiledUnit {
    /// Build a unit with no recorded imports or exports.
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Whether the unit assigns a default export.
    pub fn has_default_export(&self) -> bool {
        self.exports.iter().any(|name| name == "default")
    }
}

/// Errors that can occur during transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Source is empty")]
    Empty,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported syntax: {0}")]
    Unsupported(String),
}

/// A source-to-source compiler front end for generated components.
///
/// Implementations must be deterministic: the same source always produces
/// the same unit.
pub trait Transform: Send + Sync {
    /// Transform identifier (e.g., "oxc", "passthrough")
    fn name(&self) -> &'static str;

    /// Compile component source into an executable unit.
    ///
    /// No partial output is returned on failure.
    fn transform(&self, source: &SourceText) -> Result<CompiledUnit, TransformError>;
}
