//! Default-export extraction.
//!
//! After a unit has run, the artifact is the first renderable value among,
//! in order: `module.exports.default`, `exports.default`, `module.exports`.

use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::protocol::{ConsoleLine, ScriptError};

/// Where the artifact was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOrigin {
    ModuleDefault,
    ExportsDefault,
    ModuleExports,
}

impl ExportOrigin {
    /// Candidates in the order they are tried.
    pub const PRECEDENCE: [ExportOrigin; 3] = [
        ExportOrigin::ModuleDefault,
        ExportOrigin::ExportsDefault,
        ExportOrigin::ModuleExports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleDefault => "module.exports.default",
            Self::ExportsDefault => "exports.default",
            Self::ModuleExports => "module.exports",
        }
    }
}

impl std::fmt::Display for ExportOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub origin: ExportOrigin,

    /// `displayName` or function name of the artifact, when it has one
    pub name: Option<String>,

    /// Keys present on `module.exports`
    pub exports: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExtractReply {
    pub ok: bool,
    #[serde(default)]
    pub origin: Option<ExportOrigin>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub error: Option<ScriptError>,
    #[serde(default)]
    pub logs: Vec<ConsoleLine>,
}

impl ExtractReply {
    pub(crate) fn into_extraction(self) -> Result<Extraction, SandboxError> {
        if let Some(error) = self.error {
            return Err(SandboxError::Runtime(error.to_string()));
        }

        if !self.ok {
            return Err(SandboxError::NoDefaultExport {
                exports: self.exports,
            });
        }

        let origin = self
            .origin
            .ok_or_else(|| SandboxError::Protocol("extraction reply without origin".into()))?;

        Ok(Extraction {
            origin,
            name: self.name.filter(|name| !name.is_empty()),
            exports: self.exports,
        })
    }
}
