//! Generate a component from a prompt.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use uiforge_model::{Attachment, ChatSession};
use uiforge_preview::PreviewSnapshot;
use uiforge_static::{PreviewPage, TemplateEngine};

use crate::commands::preview::render;
use crate::config::Config;

/// Run the generate command.
pub async fn run(
    config: &Config,
    prompt: &str,
    attach: &[PathBuf],
    out: &Path,
    html: Option<PathBuf>,
) -> Result<()> {
    let generator = config.generator()?;

    let attachments = attach
        .iter()
        .map(|path| Attachment::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        "Generating with {} ({} attachments)...",
        config.model.name,
        attachments.len()
    );

    let mut session = ChatSession::default();
    let source = generator.generate(&mut session, prompt, &attachments).await?;

    fs::write(out, source.as_str()).with_context(|| format!("Failed to write {}", out.display()))?;
    tracing::info!("Wrote {}", out.display());

    let snapshot = render(config, &source, Value::Object(Default::default()));

    if let Some(path) = html {
        let title = out.file_stem().and_then(|s| s.to_str()).unwrap_or("Preview");
        let document = TemplateEngine::new()
            .render_preview(&PreviewPage::from_snapshot(title, &snapshot))
            .context("Failed to render preview document")?;

        fs::write(&path, document).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote {}", path.display());
    }

    match snapshot {
        PreviewSnapshot::Failed { kind, message, .. } => {
            bail!("Generated component failed to render ({}): {}", kind, message)
        }
        PreviewSnapshot::Rendering { component, .. } => {
            tracing::info!(
                "Rendered {}",
                component.as_deref().unwrap_or("anonymous component")
            );
            Ok(())
        }
        PreviewSnapshot::Idle { .. } => Ok(()),
    }
}
