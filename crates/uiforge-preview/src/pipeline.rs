//! Transform, execute, extract and render in one pass.

use std::sync::Arc;

use serde_json::Value;
use uiforge_sandbox::{Artifact, IsolateSandbox, ModuleEnvironment, Sandbox, SandboxConfig};
use uiforge_transform::{CompiledUnit, OxcTransform, SourceText, Transform};

use crate::error::PreviewError;

/// The stages a submission passes through, wired together.
pub struct Pipeline {
    transform: Box<dyn Transform>,
    sandbox: Box<dyn Sandbox>,
    env: Arc<ModuleEnvironment>,
}

impl Pipeline {
    pub fn new(
        transform: Box<dyn Transform>,
        sandbox: Box<dyn Sandbox>,
        env: Arc<ModuleEnvironment>,
    ) -> Self {
        Self {
            transform,
            sandbox,
            env,
        }
    }

    /// oxc transform, V8 sandbox, standard module environment.
    pub fn standard(config: SandboxConfig) -> Self {
        Self::new(
            Box::new(OxcTransform::new()),
            Box::new(IsolateSandbox::new(config)),
            ModuleEnvironment::standard(),
        )
    }

    /// Swap the transform stage.
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn env(&self) -> &ModuleEnvironment {
        &self.env
    }

    /// Compile `source`, noting imports the environment cannot satisfy.
    pub fn compile(&self, source: &SourceText) -> Result<CompiledUnit, PreviewError> {
        let unit = self.transform.transform(source)?;

        for specifier in unit.imports.iter().filter(|s| self.env.resolve(s).is_none()) {
            tracing::warn!(
                %specifier,
                "Import is not available in the preview; it will resolve to null"
            );
        }

        Ok(unit)
    }

    /// Compile and execute `source`, returning its extracted component.
    pub fn run(&self, source: &SourceText) -> Result<Artifact, PreviewError> {
        let unit = self.compile(source)?;
        Ok(self.sandbox.run(&unit, &self.env)?)
    }

    /// Full cycle: run, then render once with `props`.
    pub fn render(&self, source: &SourceText, props: &Value) -> Result<(Artifact, String), PreviewError> {
        let mut artifact = self.run(source)?;
        let markup = artifact.render(props)?;
        Ok((artifact, markup))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard(SandboxConfig::default())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("transform", &self.transform.name())
            .field("sandbox", &self.sandbox.name())
            .field("modules", &self.env.specifiers().collect::<Vec<_>>())
            .finish()
    }
}
