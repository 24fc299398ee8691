//! Preview lifecycle for generated components.
//!
//! [`PreviewController`] runs every new [`SourceText`](uiforge_transform::SourceText)
//! through transform, sandbox and extraction, and keeps exactly one
//! [`PreviewState`]. [`PreviewWorker`] hosts a controller on its own thread
//! for callers that cannot own an isolate.

pub mod controller;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod worker;

pub use controller::PreviewController;
pub use error::PreviewError;
pub use pipeline::Pipeline;
pub use state::{Failure, PreviewSnapshot, PreviewState, Rendered};
pub use worker::{PreviewHandle, PreviewWorker, Ticket, WorkerClosed};
