//! Development server implementation.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::header,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;

use uiforge_model::{ChatSession, Generator};
use uiforge_preview::{Pipeline, PreviewHandle, PreviewWorker};
use uiforge_sandbox::SandboxConfig;
use uiforge_static::{PreviewPage, TemplateEngine};
use uiforge_transform::SourceText;

use crate::api::{self, ApiError};
use crate::watcher::{FileWatcher, WatchEvent};
use crate::websocket::{hmr_client_script, HmrHub, HmrMessage};

/// Generated markup runs in an opaque origin, away from the `/api` routes.
const PREVIEW_POLICY: &str = "sandbox allow-scripts";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// Component file re-previewed whenever it changes
    pub watch: Option<PathBuf>,

    /// Shell page title
    pub title: String,

    pub sandbox: SandboxConfig,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
            watch: None,
            title: "uiforge".to_string(),
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {0}: {1}")]
    BindError(String, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Failed to start preview worker: {0}")]
    WorkerError(String),
}

/// Shared server state.
pub struct AppState {
    pub(crate) preview: PreviewHandle,
    pub(crate) generator: Option<Arc<dyn Generator>>,
    pub(crate) session: Mutex<ChatSession>,
    pub(crate) templates: TemplateEngine,
    pub(crate) hmr: HmrHub,
    pub(crate) title: String,
}

impl AppState {
    pub fn new(preview: PreviewHandle, title: impl Into<String>) -> Self {
        Self {
            preview,
            generator: None,
            session: Mutex::new(ChatSession::default()),
            templates: TemplateEngine::new(),
            hmr: HmrHub::new(),
            title: title.into(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_session(mut self, session: ChatSession) -> Self {
        self.session = Mutex::new(session);
        self
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn hmr(&self) -> &HmrHub {
        &self.hmr
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/preview", get(preview_handler))
        .route("/api/state", get(api::state))
        .route("/api/generate", post(api::generate))
        .route("/api/source", post(api::source))
        .route("/api/reset", post(api::reset))
        .route("/__hmr", get(ws_handler))
        .route("/__hmr.js", get(hmr_script_handler))
        .with_state(state)
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
    generator: Option<Arc<dyn Generator>>,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self {
            config,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Start the development server. Runs until Ctrl-C.
    pub async fn start(self) -> Result<(), ServerError> {
        let worker = PreviewWorker::spawn(Pipeline::standard(self.config.sandbox))
            .map_err(|e| ServerError::WorkerError(e.to_string()))?;

        let mut state = AppState::new(worker.handle(), &self.config.title);
        if let Some(generator) = self.generator.clone() {
            tracing::info!("Generating with {}", generator.name());
            state = state.with_generator(generator);
        }
        let state = Arc::new(state);

        // Forward preview changes to connected browsers
        let mut snapshots = state.preview.subscribe();
        let hmr = state.hmr.clone();
        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let message = HmrMessage::from(&*snapshots.borrow_and_update());
                hmr.send(message);
            }
        });

        let _watcher = match &self.config.watch {
            Some(path) => Some(watch_source(Arc::clone(&state), path).await?),
            None => None,
        };

        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|e| {
                ServerError::BindError(
                    format!("{}:{}", self.config.host, self.config.port),
                    e.to_string(),
                )
            })?;

        let url = match listener.local_addr() {
            Ok(addr) => format!("http://{}", addr),
            Err(_) => format!("http://{}:{}", self.config.host, self.config.port),
        };

        tracing::info!("Starting dev server at {}", url);

        if self.config.open {
            let _ = open::that(&url);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(|e| ServerError::BindError(url, e.to_string()))?;

        // Stops the preview thread
        drop(worker);

        Ok(())
    }
}

/// Preview `path` now and after every change.
async fn watch_source(state: Arc<AppState>, path: &PathBuf) -> Result<FileWatcher, ServerError> {
    if path.exists() {
        submit_file(&state, path).await;
    } else {
        tracing::info!("Waiting for {} to be created", path.display());
    }

    let (watcher, mut rx) = FileWatcher::new(std::slice::from_ref(path))
        .map_err(|e| ServerError::WatchError(e.to_string()))?;

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            handle_watch_event(&state, event).await;
        }
    });

    Ok(watcher)
}

/// Handle file watch events.
async fn handle_watch_event(state: &AppState, event: WatchEvent) {
    match event {
        WatchEvent::Changed(path) => {
            tracing::info!("Source modified: {}", path.display());
            submit_file(state, &path).await;
        }
        WatchEvent::Removed(path) => {
            tracing::info!("Source removed: {}; keeping the last preview", path.display());
        }
    }
}

async fn submit_file(state: &AppState, path: &std::path::Path) {
    match tokio::fs::read_to_string(path).await {
        Ok(source) => {
            if let Err(e) = state.preview.submit_now(SourceText::from(source)) {
                tracing::error!("{}", e);
            }
        }
        Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
    }
}

/// Handler for the shell page.
async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.templates.render_shell(&state.title, "/")?))
}

/// Handler for the preview document.
async fn preview_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.preview.snapshot();
    let page = PreviewPage::from_snapshot("Preview", &snapshot)
        .with_site(&state.title, "/")
        .with_hmr(true);

    Ok((
        [(header::CONTENT_SECURITY_POLICY, PREVIEW_POLICY)],
        Html(state.templates.render_preview(&page)?),
    ))
}

/// Handler for the HMR WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.hmr.subscribe();

    if !send_message(&mut socket, &HmrMessage::Connected).await {
        return;
    }

    // Catch up on anything published before the subscription
    let current = HmrMessage::from(&state.preview.snapshot());
    if !send_message(&mut socket, &current).await {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if !send_message(&mut socket, &msg).await {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &HmrMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode HMR message: {}", e);
            return false;
        }
    };

    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handler for the HMR client script.
async fn hmr_script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        hmr_client_script("/__hmr"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;
    use uiforge_model::{Attachment, GenerationError, Part, Turn};

    /// Generator returning a fixed reply.
    struct Canned(Option<&'static str>);

    #[async_trait]
    impl Generator for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(
            &self,
            session: &mut ChatSession,
            prompt: &str,
            _attachments: &[Attachment],
        ) -> Result<SourceText, GenerationError> {
            let source = self.0.ok_or(GenerationError::EmptyResponse)?;
            session.record(
                Turn::user(vec![Part::Text(prompt.to_string())]),
                Turn::model(source),
            );
            Ok(SourceText::from(source))
        }
    }

    /// Generator that waits to be released before replying.
    struct Gated {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Generator for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        async fn generate(
            &self,
            session: &mut ChatSession,
            prompt: &str,
            _attachments: &[Attachment],
        ) -> Result<SourceText, GenerationError> {
            self.started.notify_one();
            self.release.notified().await;
            session.record(
                Turn::user(vec![Part::Text(prompt.to_string())]),
                Turn::model(CARD),
            );
            Ok(SourceText::from(CARD))
        }
    }

    const CARD: &str =
        "export default function Card() { return <div className=\"card\">Hello</div>; }";

    fn app(worker: &PreviewWorker, generator: Option<Canned>) -> (Arc<AppState>, Router) {
        let mut state = AppState::new(worker.handle(), "uiforge");
        if let Some(generator) = generator {
            state = state.with_generator(Arc::new(generator));
        }
        let state = Arc::new(state);
        (Arc::clone(&state), router(state))
    }

    fn worker() -> PreviewWorker {
        PreviewWorker::spawn(Pipeline::default()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config.port, 7777);
        assert!(server.config.watch.is_none());
    }

    #[tokio::test]
    async fn serves_shell_and_idle_preview() {
        let worker = worker();
        let (_, app) = app(&worker, None);

        let (status, shell) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(shell.contains("uiforge-frame"));

        let (status, preview) = send(&app, get("/preview")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(preview.contains("Waiting for code..."));
        assert!(preview.contains("__hmr.js"));
    }

    #[tokio::test]
    async fn preview_is_served_in_a_sandboxed_origin() {
        let worker = worker();
        let (_, app) = app(&worker, None);

        let response = app.clone().oneshot(get("/preview")).await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_SECURITY_POLICY].to_str().unwrap(),
            "sandbox allow-scripts"
        );

        let response = app.clone().oneshot(get("/")).await.unwrap();
        assert!(response.headers().get(header::CONTENT_SECURITY_POLICY).is_none());
    }

    #[tokio::test]
    async fn previews_posted_source() {
        let worker = worker();
        let (_, app) = app(&worker, None);

        let request = Request::post("/api/source").body(Body::from(CARD)).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let snapshot: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["status"], "rendering");
        assert_eq!(snapshot["revision"], 1);
        assert_eq!(snapshot["markup"], r#"<div class="card">Hello</div>"#);

        let (_, preview) = send(&app, get("/preview")).await;
        assert!(preview.contains(r#"<div class="card">Hello</div>"#));
    }

    #[tokio::test]
    async fn reports_failures_in_snapshot() {
        let worker = worker();
        let (_, app) = app(&worker, None);

        let request = Request::post("/api/source")
            .body(Body::from("export const x = 1;"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let snapshot: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["status"], "failed");
        assert_eq!(snapshot["kind"], "no_default_export");
    }

    #[tokio::test]
    async fn generate_without_generator_is_unavailable() {
        let worker = worker();
        let (_, app) = app(&worker, None);

        let (status, body) = send(&app, post_json("/api/generate", json!({ "prompt": "a card" }))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn generates_and_previews() {
        let worker = worker();
        let (state, app) = app(&worker, Some(Canned(Some(CARD))));

        let (status, body) = send(&app, post_json("/api/generate", json!({ "prompt": "a card" }))).await;
        assert_eq!(status, StatusCode::OK);

        let snapshot: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["status"], "rendering");
        assert_eq!(snapshot["component"], "Card");

        let (_, body) = send(&app, get("/api/state")).await;
        let current: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(current["turns"], 2);
        assert_eq!(current["generator"], "canned");

        let (status, _) = send(&app, Request::post("/api/reset").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.session.lock().await.is_empty());
        assert!(state.preview.snapshot().markup().is_some());
    }

    #[tokio::test]
    async fn state_and_reset_respond_during_generation() {
        let worker = worker();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let generator = Gated {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        };
        let state = Arc::new(AppState::new(worker.handle(), "uiforge").with_generator(Arc::new(generator)));
        let app = router(Arc::clone(&state));

        let pending = tokio::spawn({
            let app = app.clone();
            async move { send(&app, post_json("/api/generate", json!({ "prompt": "a card" }))).await }
        });
        started.notified().await;

        let (status, body) = tokio::time::timeout(Duration::from_secs(5), send(&app, get("/api/state")))
            .await
            .expect("state waited for the model");
        assert_eq!(status, StatusCode::OK);
        let current: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(current["turns"], 0);

        let reset = Request::post("/api/reset").body(Body::empty()).unwrap();
        let (status, _) = tokio::time::timeout(Duration::from_secs(5), send(&app, reset))
            .await
            .expect("reset waited for the model");
        assert_eq!(status, StatusCode::NO_CONTENT);

        release.notify_one();
        let (status, _) = pending.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.session.lock().await.turns().len(), 2);
    }

    #[tokio::test]
    async fn generation_failure_keeps_preview() {
        let worker = worker();
        let (state, app) = app(&worker, Some(Canned(None)));

        let ticket = state.preview.submit_now(SourceText::from(CARD)).unwrap();
        let before = state.preview.settled(ticket).await.unwrap();

        let (status, body) = send(&app, post_json("/api/generate", json!({ "prompt": "again" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["message"], "Model returned no content");
        assert_eq!(state.preview.snapshot(), before);
    }

    #[tokio::test]
    async fn rejects_blank_prompt() {
        let worker = worker();
        let (_, app) = app(&worker, Some(Canned(Some(CARD))));

        let (status, _) = send(&app, post_json("/api/generate", json!({ "prompt": "  " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn serves_hmr_script() {
        let worker = worker();
        let (_, app) = app(&worker, None);

        let response = app.oneshot(get("/__hmr.js")).await.unwrap();

        assert_eq!(
            response.headers()["content-type"],
            "application/javascript"
        );
    }
}
