//! Configuration file (uiforge.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use uiforge_model::{GeminiClient, GeminiConfig, Generator};
use uiforge_sandbox::SandboxConfig;

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub sandbox: SandboxSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub temperature: f32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let defaults = GeminiConfig::default();
        Self {
            name: defaults.model,
            temperature: defaults.temperature,
            api_key_env: uiforge_model::gemini::DEFAULT_API_KEY_ENV.to_string(),
            base_url: defaults.base_url,
            timeout_seconds: defaults.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SandboxSettings {
    pub timeout_ms: u64,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            timeout_ms: uiforge_sandbox::config::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Component file previewed live
    pub watch: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            watch: Some(PathBuf::from("preview.jsx")),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    pub source: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub base_url: String,
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from("pages"),
            output: PathBuf::from("dist"),
            title: "Generated UI".to_string(),
            base_url: "/".to_string(),
            minify: true,
        }
    }
}

impl Config {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed or holds
    /// values no command can run with.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sandbox.timeout_ms == 0 {
            bail!("sandbox.timeout_ms must be greater than 0");
        }
        if self.model.timeout_seconds == 0 {
            bail!("model.timeout_seconds must be greater than 0");
        }
        Ok(())
    }

    pub fn sandbox(&self) -> SandboxConfig {
        SandboxConfig::with_timeout(Duration::from_millis(self.sandbox.timeout_ms))
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.model.name.clone(),
            temperature: self.model.temperature,
            base_url: self.model.base_url.clone(),
            timeout: Duration::from_secs(self.model.timeout_seconds),
        }
    }

    /// Gemini client using the configured key variable.
    pub fn generator(&self) -> Result<Arc<dyn Generator>> {
        let client = GeminiClient::from_env(self.gemini(), &self.model.api_key_env)?;
        Ok(Arc::new(client))
    }
}
