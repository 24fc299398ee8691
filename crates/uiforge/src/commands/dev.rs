//! Development server command.

use std::path::PathBuf;

use anyhow::Result;
use uiforge_server::{DevServer, DevServerConfig};

use crate::config::Config;

/// Run the dev server.
pub async fn run(config: &Config, port: Option<u16>, watch: Option<PathBuf>, open: bool) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    tracing::info!("Starting development server on port {}", port);

    let server_config = DevServerConfig {
        host: config.server.host.clone(),
        port,
        open,
        watch: watch.or_else(|| config.server.watch.clone()),
        sandbox: config.sandbox(),
        ..Default::default()
    };

    let mut server = DevServer::new(server_config);

    match config.generator() {
        Ok(generator) => server = server.with_generator(generator),
        Err(e) => tracing::warn!("Prompting disabled: {}", e),
    }

    server.start().await?;

    Ok(())
}
