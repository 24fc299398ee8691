//! Initialize uiforge in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing uiforge...");

    write_starter(config_path, DEFAULT_CONFIG, yes)?;
    write_starter(Path::new("preview.jsx"), DEFAULT_PREVIEW, yes)?;

    let pages_dir = Path::new("pages");
    if !pages_dir.exists() {
        fs::create_dir_all(pages_dir).context("Failed to create pages directory")?;
    }
    write_starter(&pages_dir.join("welcome.jsx"), DEFAULT_PAGE, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'uiforge dev' to start the development server.");

    Ok(())
}

fn write_starter(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

pub(crate) const DEFAULT_CONFIG: &str = r#"# uiforge configuration

[model]
name = "gemini-2.5-pro"
temperature = 0.5
# Environment variable holding the API key
api_key_env = "GEMINI_API_KEY"
base_url = "https://generativelanguage.googleapis.com/v1beta"
timeout_seconds = 120

[sandbox]
# Time limit for running a component
timeout_ms = 2000

[server]
host = "127.0.0.1"
port = 7777
# Component file previewed live by 'uiforge dev'
watch = "preview.jsx"

[build]
source = "pages"
output = "dist"
title = "Generated UI"
base_url = "/"
minify = true
"#;

const DEFAULT_PREVIEW: &str = r#"import { Sparkles } from 'lucide-react';

export default function Preview() {
  return (
    <div className="min-h-screen flex items-center justify-center bg-slate-50">
      <div className="rounded-xl bg-white p-8 shadow-lg text-center">
        <Sparkles className="mx-auto mb-4 text-indigo-500" size={32} />
        <h1 className="text-2xl font-semibold text-slate-900">Edit preview.jsx</h1>
        <p className="mt-2 text-slate-500">The preview refreshes on every save.</p>
      </div>
    </div>
  );
}
"#;

const DEFAULT_PAGE: &str = r#"import React, { useState } from 'react';

export default function Welcome({ name = 'uiforge' }) {
  const [count] = useState(0);

  return (
    <main className="max-w-2xl mx-auto p-12">
      <h1 className="text-4xl font-bold">Welcome to {name}</h1>
      <p className="mt-4 text-lg text-gray-600">
        Every .jsx and .tsx file in pages/ becomes a page in the gallery.
      </p>
      <button className="mt-8 rounded-md bg-indigo-600 px-4 py-2 text-white">
        Clicked {count} times
      </button>
    </main>
  );
}
"#;
