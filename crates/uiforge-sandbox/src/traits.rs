//! Trait definitions for execution backends.

use serde_json::Value;
use uiforge_transform::CompiledUnit;

use crate::artifact::Artifact;
use crate::error::SandboxError;
use crate::modules::ModuleEnvironment;

/// Runs compiled units in isolation and extracts their component.
pub trait Sandbox: Send + Sync {
    /// Backend identifier (e.g., "v8")
    fn name(&self) -> &'static str;

    /// Execute `unit` against `env` and return the extracted artifact.
    ///
    /// Every call starts from a fresh global environment. Nothing defined by
    /// one unit is visible to the next.
    fn run(&self, unit: &CompiledUnit, env: &ModuleEnvironment) -> Result<Artifact, SandboxError>;
}

/// A live component that can produce markup on demand.
pub trait Renderable {
    /// Render the component with `props` to an HTML fragment.
    fn render(&mut self, props: &Value) -> Result<String, SandboxError>;
}
