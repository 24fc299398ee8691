//! JSON API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uiforge_model::GenerationError;
use uiforge_preview::{PreviewSnapshot, WorkerClosed};
use uiforge_transform::SourceText;

use crate::server::AppState;

/// Error returned by API and page handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Service unavailable: {}", msg);
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            error: ErrorBody<'a>,
        }

        #[derive(Serialize)]
        struct ErrorBody<'a> {
            code: &'a str,
            message: &'a str,
        }

        (
            self.status,
            Json(ErrorEnvelope {
                error: ErrorBody {
                    code: self.code,
                    message: &self.message,
                },
            }),
        )
            .into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        tracing::warn!("Generation failed: {}", err);
        Self::new(StatusCode::BAD_GATEWAY, "GENERATION_FAILED", err.to_string())
    }
}

impl From<WorkerClosed> for ApiError {
    fn from(err: WorkerClosed) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        Self::internal(format!("Template error: {}", err))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub preview: PreviewSnapshot,
    /// Turns recorded in the chat session
    pub turns: usize,
    /// Configured generator, if any
    pub generator: Option<String>,
}

pub(crate) async fn state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let turns = state.session.lock().await.turns().len();

    Json(StateResponse {
        preview: state.preview.snapshot(),
        turns,
        generator: state.generator.as_ref().map(|g| g.name().to_string()),
    })
}

/// Generate a component from a prompt and preview it.
///
/// The ticket is taken before the model is called, so a reply that arrives
/// after a newer submission cannot replace it. The model sees a copy of the
/// session and only the new exchange is recorded back.
pub(crate) async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<PreviewSnapshot>, ApiError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("Prompt is empty"));
    }

    let generator = state.generator.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("No generator configured; set the model API key")
    })?;

    let ticket = state.preview.ticket();

    // The session lock is not held across the model call
    let mut working = state.session.lock().await.clone();
    let base = working.turns().len();
    let source = generator.generate(&mut working, prompt, &[]).await?;

    {
        let mut session = state.session.lock().await;
        let recorded = working.turns().get(base..).unwrap_or_default();
        for exchange in recorded.chunks_exact(2) {
            session.record(exchange[0].clone(), exchange[1].clone());
        }
    }

    state.preview.submit(ticket, source)?;
    let snapshot = state.preview.settled(ticket).await?;

    Ok(Json(snapshot))
}

/// Preview raw component source.
pub(crate) async fn source(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<PreviewSnapshot>, ApiError> {
    let ticket = state.preview.submit_now(SourceText::from(body))?;
    let snapshot = state.preview.settled(ticket).await?;

    Ok(Json(snapshot))
}

/// Start a new conversation. The current preview is kept.
pub(crate) async fn reset(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.lock().await.reset();
    tracing::info!("Chat session reset");
    StatusCode::NO_CONTENT
}
