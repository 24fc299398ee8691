//! Static gallery build command.

use std::path::PathBuf;

use anyhow::Result;
use uiforge_static::{BuildConfig, StaticBuilder};

use crate::config::Config;

/// Run the build command.
pub async fn run(
    config: &Config,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    minify: Option<bool>,
) -> Result<()> {
    tracing::info!("Building gallery...");

    let build_config = BuildConfig {
        source_dir: source.unwrap_or_else(|| config.build.source.clone()),
        output_dir: output.unwrap_or_else(|| config.build.output.clone()),
        minify: minify.unwrap_or(config.build.minify),
        base_url: config.build.base_url.clone(),
        title: config.build.title.clone(),
        sandbox: config.sandbox(),
    };

    let result = StaticBuilder::new(build_config).build().await?;

    tracing::info!(
        "Built {} pages ({} failed) in {}ms",
        result.pages,
        result.failed,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
