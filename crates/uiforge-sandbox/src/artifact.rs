//! The extracted, renderable component.

use serde_json::Value;

use crate::error::SandboxError;
use crate::extract::{ExportOrigin, Extraction};
use crate::traits::Renderable;

/// A component extracted from an executed unit.
///
/// Owns the runtime it came from. Artifacts backed by an isolate must be
/// dropped before another isolate is created on the same thread.
pub struct Artifact {
    inner: Box<dyn Renderable>,
    extraction: Extraction,
}

impl Artifact {
    pub fn new(inner: Box<dyn Renderable>, extraction: Extraction) -> Self {
        Self { inner, extraction }
    }

    /// Display name of the component, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.extraction.name.as_deref()
    }

    pub fn origin(&self) -> ExportOrigin {
        self.extraction.origin
    }

    /// Keys present on `module.exports`.
    pub fn export_names(&self) -> &[String] {
        &self.extraction.exports
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    /// Render with the given props.
    pub fn render(&mut self, props: &Value) -> Result<String, SandboxError> {
        self.inner.render(props)
    }

    /// Render with empty props.
    pub fn render_default(&mut self) -> Result<String, SandboxError> {
        self.render(&Value::Object(Default::default()))
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("name", &self.extraction.name)
            .field("origin", &self.extraction.origin)
            .field("exports", &self.extraction.exports)
            .finish_non_exhaustive()
    }
}
