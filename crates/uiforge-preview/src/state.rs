//! Preview state and its serializable snapshot.

use serde::Serialize;
use uiforge_sandbox::{Artifact, ExportOrigin};

use crate::error::PreviewError;

/// A successfully rendered submission.
#[derive(Debug)]
pub struct Rendered {
    pub artifact: Artifact,
    pub markup: String,
    pub revision: u64,
}

/// A failed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: PreviewError,
    pub revision: u64,
}

/// What the preview currently shows.
#[derive(Debug, Default)]
pub enum PreviewState {
    /// Nothing submitted yet
    #[default]
    Idle,
    Rendering(Rendered),
    Failed(Failure),
}

impl PreviewState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_rendering(&self) -> bool {
        matches!(self, Self::Rendering(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn revision(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Rendering(rendered) => Some(rendered.revision),
            Self::Failed(failure) => Some(failure.revision),
        }
    }

    pub fn markup(&self) -> Option<&str> {
        match self {
            Self::Rendering(rendered) => Some(&rendered.markup),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Rendering(rendered) => Some(&rendered.artifact),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PreviewError> {
        match self {
            Self::Failed(failure) => Some(&failure.error),
            _ => None,
        }
    }

    /// Detach a thread-safe view of this state. An idle state reports
    /// revision 0; [`PreviewController::snapshot`](crate::PreviewController::snapshot)
    /// fills in the controller's revision.
    pub fn snapshot(&self) -> PreviewSnapshot {
        match self {
            Self::Idle => PreviewSnapshot::Idle { revision: 0 },
            Self::Rendering(rendered) => PreviewSnapshot::Rendering {
                revision: rendered.revision,
                markup: rendered.markup.clone(),
                component: rendered.artifact.name().map(str::to_owned),
                origin: rendered.artifact.origin(),
                exports: rendered.artifact.export_names().to_vec(),
            },
            Self::Failed(failure) => PreviewSnapshot::Failed {
                revision: failure.revision,
                kind: failure.error.kind().to_string(),
                message: failure.error.to_string(),
            },
        }
    }
}

/// Owned copy of a [`PreviewState`] that can cross threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewSnapshot {
    /// Nothing to show. `revision` is the last revision handled, so a
    /// cleared preview still settles earlier tickets.
    Idle {
        revision: u64,
    },
    Rendering {
        revision: u64,
        markup: String,
        component: Option<String>,
        origin: ExportOrigin,
        exports: Vec<String>,
    },
    Failed {
        revision: u64,
        kind: String,
        message: String,
    },
}

impl Default for PreviewSnapshot {
    fn default() -> Self {
        Self::Idle { revision: 0 }
    }
}

impl PreviewSnapshot {
    /// Revision the snapshot was produced for; 0 before any submission.
    pub fn revision(&self) -> u64 {
        match self {
            Self::Idle { revision }
            | Self::Rendering { revision, .. }
            | Self::Failed { revision, .. } => *revision,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }

    pub fn markup(&self) -> Option<&str> {
        match self {
            Self::Rendering { markup, .. } => Some(markup),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}
