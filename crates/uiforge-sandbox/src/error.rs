//! Sandbox error types.

use std::time::Duration;

/// Message reported when no renderable export could be found.
pub const NO_COMPONENT_MESSAGE: &str =
    "No component found. Ensure the component is exported as default.";

/// Errors that can occur while executing a compiled unit.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Sandbox bootstrap failed: {0}")]
    Bootstrap(String),

    /// The unit could not be turned into a callable body
    #[error("{0}")]
    Compile(String),

    /// The body, or a later render, threw
    #[error("{0}")]
    Runtime(String),

    #[error("Execution exceeded the {}ms time limit", .0.as_millis())]
    Timeout(Duration),

    #[error("{}", NO_COMPONENT_MESSAGE)]
    NoDefaultExport {
        /// Keys present on `module.exports` at extraction time
        exports: Vec<String>,
    },

    #[error("Malformed sandbox reply: {0}")]
    Protocol(String),
}

impl SandboxError {
    /// Whether the failure happened before any user code ran.
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_default_export_uses_fixed_message() {
        let err = SandboxError::NoDefaultExport {
            exports: vec!["Button".to_string()],
        };

        assert_eq!(err.to_string(), NO_COMPONENT_MESSAGE);
    }

    #[test]
    fn timeout_reports_limit() {
        let err = SandboxError::Timeout(Duration::from_millis(250));

        assert_eq!(err.to_string(), "Execution exceeded the 250ms time limit");
    }
}
