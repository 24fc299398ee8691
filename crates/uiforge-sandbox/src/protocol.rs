//! Replies returned by the in-isolate harness.
//!
//! Every harness entry point returns a JSON string. The host decodes it here
//! and never inspects live script values.

use serde::Deserialize;

use crate::error::SandboxError;

/// A value thrown by script code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptError {
    pub name: String,
    pub message: String,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name == "Error" || self.name.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

/// One captured `console.*` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleLine {
    pub level: String,
    pub message: String,
}

/// Forward captured console output to tracing.
pub(crate) fn forward_logs(lines: &[ConsoleLine]) {
    for line in lines {
        match line.level.as_str() {
            "error" => tracing::error!(target: "uiforge::console", "{}", line.message),
            "warn" => tracing::warn!(target: "uiforge::console", "{}", line.message),
            "debug" => tracing::debug!(target: "uiforge::console", "{}", line.message),
            _ => tracing::info!(target: "uiforge::console", "{}", line.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Stage {
    Compile,
    Execute,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecuteReply {
    pub ok: bool,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub error: Option<ScriptError>,
    #[serde(default)]
    pub unresolved: Vec<String>,
    #[serde(default)]
    pub logs: Vec<ConsoleLine>,
}

impl ExecuteReply {
    /// Map a failed execution onto the matching error kind.
    pub(crate) fn into_result(self) -> Result<Vec<String>, SandboxError> {
        if self.ok {
            return Ok(self.unresolved);
        }

        let message = self
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());

        match self.stage {
            Some(Stage::Compile) => Err(SandboxError::Compile(message)),
            _ => Err(SandboxError::Runtime(message)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenderReply {
    pub ok: bool,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub error: Option<ScriptError>,
    #[serde(default)]
    pub logs: Vec<ConsoleLine>,
}

impl RenderReply {
    pub(crate) fn into_result(self) -> Result<String, SandboxError> {
        match (self.ok, self.html, self.error) {
            (true, Some(html), _) => Ok(html),
            (_, _, Some(error)) => Err(SandboxError::Runtime(error.to_string())),
            _ => Err(SandboxError::Protocol("render reply without markup".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_show_only_the_message() {
        let err = ScriptError {
            name: "Error".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "boom");

        let err = ScriptError {
            name: "TypeError".into(),
            message: "x is not a function".into(),
        };
        assert_eq!(err.to_string(), "TypeError: x is not a function");
    }

    #[test]
    fn compile_stage_maps_to_compile_error() {
        let reply: ExecuteReply = serde_json::from_str(
            r#"{"ok":false,"stage":"compile","error":{"name":"SyntaxError","message":"Unexpected token ')'"},"logs":[]}"#,
        )
        .unwrap();

        match reply.into_result() {
            Err(SandboxError::Compile(message)) => {
                assert_eq!(message, "SyntaxError: Unexpected token ')'")
            }
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn execute_stage_maps_to_runtime_error() {
        let reply: ExecuteReply = serde_json::from_str(
            r#"{"ok":false,"stage":"execute","error":{"name":"Error","message":"boom"},"unresolved":[]}"#,
        )
        .unwrap();

        assert!(matches!(reply.into_result(), Err(SandboxError::Runtime(m)) if m == "boom"));
    }

    #[test]
    fn successful_execution_reports_unresolved_modules() {
        let reply: ExecuteReply =
            serde_json::from_str(r#"{"ok":true,"unresolved":["framer-motion"]}"#).unwrap();

        assert_eq!(reply.into_result().unwrap(), vec!["framer-motion".to_string()]);
    }

    #[test]
    fn render_reply_without_markup_is_a_protocol_error() {
        let reply: RenderReply = serde_json::from_str(r#"{"ok":true}"#).unwrap();

        assert!(matches!(reply.into_result(), Err(SandboxError::Protocol(_))));
    }
}
