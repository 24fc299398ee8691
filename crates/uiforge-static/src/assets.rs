//! Stylesheet for preview documents, the gallery and the dev shell.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// The uiforge stylesheet, minified when `minify` is set.
    ///
    /// Falls back to the readable source if minification fails.
    pub fn stylesheet(minify: bool) -> String {
        if !minify {
            return DEFAULT_CSS.to_string();
        }

        match Self::minify_css(DEFAULT_CSS) {
            Ok(css) => css,
            Err(e) => {
                tracing::warn!("Serving unminified stylesheet: {}", e);
                DEFAULT_CSS.to_string()
            }
        }
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

// Component markup is styled by Tailwind; these rules only cover the chrome
// around it.
const DEFAULT_CSS: &str = r#"
:root {
  --uiforge-bg: #0f172a;
  --uiforge-panel: #1e293b;
  --uiforge-border: #334155;
  --uiforge-muted: #64748b;
  --uiforge-text: #e2e8f0;
  --uiforge-accent: #6366f1;
  --uiforge-danger: #f87171;
}

.uiforge-stage {
  width: 100%;
  min-height: 100vh;
}

.uiforge-panel {
  display: flex;
  align-items: center;
  justify-content: center;
  min-height: 100vh;
  padding: 24px;
  font-family: system-ui, -apple-system, sans-serif;
  text-align: center;
}

.uiforge-idle {
  color: var(--uiforge-muted);
}

.uiforge-error {
  color: var(--uiforge-danger);
  background: rgba(127, 29, 29, 0.1);
}

.uiforge-error h3 {
  font-size: 1.125rem;
  font-weight: 600;
  margin-bottom: 8px;
}

.uiforge-error pre {
  font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
  font-size: 0.875rem;
  white-space: pre-wrap;
  opacity: 0.8;
}

.uiforge-dark {
  background: var(--uiforge-bg);
  color: var(--uiforge-text);
  font-family: system-ui, -apple-system, sans-serif;
}

.uiforge-gallery {
  max-width: 960px;
  margin: 0 auto;
  padding: 48px 24px;
}

.uiforge-gallery ul {
  display: grid;
  grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
  gap: 16px;
  list-style: none;
  padding: 0;
}

.uiforge-card {
  border: 1px solid var(--uiforge-border);
  border-radius: 8px;
  padding: 16px;
  background: var(--uiforge-panel);
}

.uiforge-card.failed {
  border-color: var(--uiforge-danger);
}

.uiforge-card a {
  color: var(--uiforge-text);
  font-weight: 600;
  text-decoration: none;
}

.uiforge-card p {
  margin-top: 8px;
  color: var(--uiforge-danger);
  font-size: 0.8125rem;
}

.uiforge-shell {
  display: grid;
  grid-template-columns: 380px 1fr;
  height: 100vh;
}

.uiforge-chat {
  display: flex;
  flex-direction: column;
  border-right: 1px solid var(--uiforge-border);
  background: var(--uiforge-panel);
}

.uiforge-log {
  flex: 1;
  overflow-y: auto;
  padding: 16px;
}

.uiforge-log .turn {
  margin-bottom: 12px;
  white-space: pre-wrap;
}

.uiforge-log .turn.user {
  color: var(--uiforge-accent);
}

.uiforge-form {
  display: flex;
  gap: 8px;
  padding: 16px;
  border-top: 1px solid var(--uiforge-border);
}

.uiforge-form textarea {
  flex: 1;
  min-height: 72px;
  resize: vertical;
  background: var(--uiforge-bg);
  color: var(--uiforge-text);
  border: 1px solid var(--uiforge-border);
  border-radius: 6px;
  padding: 8px;
}

.uiforge-form button {
  background: var(--uiforge-accent);
  color: white;
  border: 0;
  border-radius: 6px;
  padding: 0 16px;
  cursor: pointer;
}

.uiforge-form button:disabled {
  opacity: 0.5;
  cursor: wait;
}

.uiforge-frame {
  width: 100%;
  height: 100%;
  border: 0;
  background: white;
}
"#;
