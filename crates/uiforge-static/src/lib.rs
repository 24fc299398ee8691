//! Standalone HTML output for generated components.
//!
//! Wraps preview snapshots in full documents (styled with the Tailwind CDN),
//! renders the dev server shell, and builds a static gallery from a directory
//! of component sources.

pub mod assets;
pub mod builder;
pub mod templates;

pub use assets::AssetPipeline;
pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use templates::{GalleryEntry, PreviewPage, TemplateEngine};
