//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uiforge_preview::PreviewSnapshot;

/// Messages sent to preview clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmrMessage {
    /// Connection established
    Connected,

    /// Full page reload
    Reload,

    /// The preview state changed
    Update {
        revision: u64,
        /// "idle", "rendering" or "failed"
        status: String,
    },
}

impl From<&PreviewSnapshot> for HmrMessage {
    fn from(snapshot: &PreviewSnapshot) -> Self {
        let status = match snapshot {
            PreviewSnapshot::Idle { .. } => "idle",
            PreviewSnapshot::Rendering { .. } => "rendering",
            PreviewSnapshot::Failed { .. } => "failed",
        };

        Self::Update {
            revision: snapshot.revision(),
            status: status.to_string(),
        }
    }
}

/// Hub for broadcasting messages to all connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    sender: broadcast::Sender<HmrMessage>,
}

impl HmrHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: HmrMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client script for the preview document.
///
/// Reloads the page whenever the preview revision moves past the one the page
/// was rendered with, and reconnects with backoff when the server restarts.
pub fn hmr_client_script(path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const root = document.querySelector('[data-revision]');
  const shown = root ? Number(root.dataset.revision) : 0;
  const status = root ? root.dataset.status : 'idle';
  const url = (location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '{}';
  let attempts = 0;

  function connect() {{
    const ws = new WebSocket(url);

    ws.onopen = function() {{
      attempts = 0;
    }};

    ws.onmessage = function(event) {{
      const msg = JSON.parse(event.data);

      switch (msg.type) {{
        case 'reload':
          location.reload();
          break;

        case 'update':
          if (msg.revision !== shown || msg.status !== status) {{
            location.reload();
          }}
          break;
      }}
    }};

    ws.onclose = function() {{
      if (attempts < 10) {{
        attempts++;
        setTimeout(connect, 1000 * attempts);
      }}
    }};
  }}

  connect();
}})();
"#,
        path
    )
}
