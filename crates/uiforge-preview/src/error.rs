//! Preview error types.

use uiforge_sandbox::{SandboxError, NO_COMPONENT_MESSAGE};
use uiforge_transform::TransformError;

/// Why a submission could not be previewed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    /// Source could not be compiled
    #[error("{0}")]
    Compile(String),

    /// Source compiled but threw while executing or rendering
    #[error("{0}")]
    Runtime(String),

    #[error("{}", NO_COMPONENT_MESSAGE)]
    NoDefaultExport { exports: Vec<String> },
}

impl PreviewError {
    /// Stable identifier used in snapshots.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compile(_) => "compile",
            Self::Runtime(_) => "runtime",
            Self::NoDefaultExport { .. } => "no_default_export",
        }
    }
}

impl From<TransformError> for PreviewError {
    fn from(err: TransformError) -> Self {
        Self::Compile(err.to_string())
    }
}

impl From<SandboxError> for PreviewError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Compile(message) => Self::Compile(message),
            SandboxError::NoDefaultExport { exports } => Self::NoDefaultExport { exports },
            other => Self::Runtime(other.to_string()),
        }
    }
}
