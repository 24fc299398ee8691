//! Development server for generated components.
//!
//! Serves a prompt shell, the live preview document and a small JSON API.
//! Preview changes are pushed to browsers over a WebSocket.

pub mod api;
pub mod server;
pub mod watcher;
pub mod websocket;

pub use api::{ApiError, GenerateRequest, StateResponse};
pub use server::{router, AppState, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{HmrHub, HmrMessage};
