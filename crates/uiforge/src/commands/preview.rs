//! Render a single component file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use uiforge_preview::{Pipeline, PreviewController, PreviewSnapshot};
use uiforge_static::{PreviewPage, TemplateEngine};
use uiforge_transform::SourceText;

use crate::config::Config;

/// Run the preview command.
pub async fn run(
    config: &Config,
    file: &Path,
    out: Option<PathBuf>,
    props: Option<&str>,
    fragment: bool,
) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let props = match props {
        Some(json) => serde_json::from_str::<Value>(json).context("Props must be valid JSON")?,
        None => Value::Object(Default::default()),
    };
    if !props.is_object() {
        bail!("Props must be a JSON object");
    }

    let snapshot = render(config, &SourceText::from(source), props);

    let output = if fragment {
        match &snapshot {
            PreviewSnapshot::Rendering { markup, .. } => markup.clone(),
            _ => String::new(),
        }
    } else {
        let title = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Preview");

        TemplateEngine::new()
            .render_preview(&PreviewPage::from_snapshot(title, &snapshot))
            .context("Failed to render preview document")?
    };

    if let PreviewSnapshot::Failed { kind, message, .. } = &snapshot {
        // A document with the error panel is still useful
        if !fragment {
            emit(&output, out.as_deref())?;
        }
        bail!("Rendering Error ({}): {}", kind, message);
    }

    emit(&output, out.as_deref())
}

/// Run one source through a fresh pipeline.
pub(crate) fn render(config: &Config, source: &SourceText, props: Value) -> PreviewSnapshot {
    let mut controller = PreviewController::new(Pipeline::standard(config.sandbox()));
    controller.set_props(props);
    controller.submit(source).snapshot()
}

fn emit(output: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn renders_with_props() {
        let source = SourceText::from(
            "export default function Hi({ name }) { return <p>Hi {name}</p>; }",
        );

        let snapshot = render(&Config::default(), &source, json!({ "name": "Ada" }));

        assert_eq!(snapshot.markup(), Some("<p>Hi Ada</p>"));
    }

    #[tokio::test]
    async fn writes_document() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("card.jsx");
        let out = temp.path().join("card.html");
        fs::write(&file, "export default () => <section>Card</section>;").unwrap();

        run(&Config::default(), &file, Some(out.clone()), None, false)
            .await
            .unwrap();

        let html = fs::read_to_string(&out).unwrap();
        assert!(html.contains("<section>Card</section>"));
        assert!(html.contains("<title>card</title>"));
    }

    #[tokio::test]
    async fn failures_are_errors() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("broken.jsx");
        fs::write(&file, "export const notDefault = 1;").unwrap();

        let err = run(&Config::default(), &file, None, None, true)
            .await
            .unwrap_err();

        assert!(err
            .to_string()
            .contains("No component found. Ensure the component is exported as default."));
    }

    #[tokio::test]
    async fn rejects_non_object_props() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("card.jsx");
        fs::write(&file, "export default () => null;").unwrap();

        let err = run(&Config::default(), &file, None, Some("[1]"), true)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("JSON object"));
    }
}
