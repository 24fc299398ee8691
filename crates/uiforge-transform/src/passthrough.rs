//! Identity transform.

use crate::source::SourceText;
use crate::traits::{CompiledUnit, Transform, TransformError};

/// Hands the source to the sandbox untouched.
///
/// Useful for feeding hand-written CommonJS, or deliberately malformed
/// input, straight into the execution stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Passthrough {
    /// Create a passthrough transform.
    pub fn new() -> Self {
        Self
    }
}

impl Transform for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn transform(&self, source: &SourceText) -> Result<CompiledUnit, TransformError> {
        Ok(CompiledUnit::from_code(source.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_source_verbatim() {
        let unit = Passthrough::new()
            .transform(&SourceText::from("exports.default = (("))
            .unwrap();

        assert_eq!(unit.code, "exports.default = ((");
        assert!(unit.imports.is_empty());
    }
}
