use std::time::Duration;

/// Default execution budget for a single script entry.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Global names that are rebound to `undefined` inside component bodies.
pub const SHADOWED_GLOBALS: &[&str] = &[
    "Deno",
    "globalThis",
    "window",
    "self",
    "document",
    "fetch",
    "XMLHttpRequest",
    "WebSocket",
    "localStorage",
    "sessionStorage",
];

/// Sandbox configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Upper bound for executing a unit, extracting it, or rendering it
    pub timeout: Duration,
}

impl SandboxConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
