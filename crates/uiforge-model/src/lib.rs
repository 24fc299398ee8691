//! Component generation through a hosted chat model.
//!
//! A [`Generator`] turns a prompt, plus optional file attachments, into
//! component source. Conversations are explicit [`ChatSession`] values so
//! follow-up prompts can refine the previous component.

pub mod attachment;
pub mod codeblock;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod session;

pub use attachment::{Attachment, AttachmentKind};
pub use codeblock::{code_blocks, extract_source, CodeBlock, Language};
pub use error::GenerationError;
pub use gemini::{GeminiClient, GeminiConfig};
pub use generator::Generator;
pub use prompt::{compose, SYSTEM_INSTRUCTION};
pub use session::{ChatSession, Part, Role, Turn};
