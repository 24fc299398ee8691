//! Sandboxed execution for compiled components.
//!
//! A [`Sandbox`] takes a [`CompiledUnit`](uiforge_transform::CompiledUnit),
//! runs it with nothing but a fixed [`ModuleEnvironment`] in scope, and hands
//! back the component it exported as an [`Artifact`] that can be rendered to
//! HTML.
//!
//! Inside the body the following names are bound:
//!
//! - `React`, `exports`, `require`, `module`
//! - `console`, captured and forwarded to tracing under `uiforge::console`
//! - each of [`SHADOWED_GLOBALS`], bound to `undefined`

pub mod artifact;
pub mod config;
pub mod error;
pub mod extract;
pub mod isolate;
pub mod modules;
pub mod protocol;
pub mod traits;
mod watchdog;

pub use artifact::Artifact;
pub use config::{SandboxConfig, DEFAULT_TIMEOUT, SHADOWED_GLOBALS};
pub use error::{SandboxError, NO_COMPONENT_MESSAGE};
pub use extract::{ExportOrigin, Extraction};
pub use isolate::IsolateSandbox;
pub use modules::{Capability, ModuleEnvironment};
pub use traits::{Renderable, Sandbox};
