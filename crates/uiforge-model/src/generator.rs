use async_trait::async_trait;
use uiforge_transform::SourceText;

use crate::attachment::Attachment;
use crate::error::GenerationError;
use crate::session::ChatSession;

/// Produces component source from a natural-language prompt.
///
/// On success the exchange is appended to `session`. On failure the session
/// is left as it was.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend identifier (e.g., "gemini")
    fn name(&self) -> &str;

    async fn generate(
        &self,
        session: &mut ChatSession,
        prompt: &str,
        attachments: &[Attachment],
    ) -> Result<SourceText, GenerationError>;
}
