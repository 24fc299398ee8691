//! Gallery builder.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use uiforge_preview::{Pipeline, PreviewController, PreviewSnapshot};
use uiforge_sandbox::SandboxConfig;
use uiforge_transform::SourceText;

use crate::templates::{GalleryEntry, PreviewPage, TemplateEngine};

/// Configuration for building a gallery.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding component sources
    pub source_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Minify the embedded stylesheet
    pub minify: bool,

    /// Base URL for the site
    pub base_url: String,

    /// Site title
    pub title: String,

    /// Sandbox limits for every page
    pub sandbox: SandboxConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("pages"),
            output_dir: PathBuf::from("dist"),
            minify: true,
            base_url: "/".to_string(),
            title: "Generated UI".to_string(),
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Pages whose component failed to render
    pub failed: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read source directory: {0}")]
    ReadError(String),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// A page to be built.
#[derive(Debug)]
struct PageInfo {
    /// Source file path
    source_path: PathBuf,

    /// Output path
    output_path: PathBuf,

    /// URL path relative to the base URL
    url_path: String,

    title: String,

    source: SourceText,
}

/// Renders every component in a directory to a standalone page.
pub struct StaticBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        let templates = TemplateEngine::with_minify(config.minify);
        Self { config, templates }
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Build the gallery.
    ///
    /// A component that fails to compile or render still gets a page showing
    /// the error; only I/O and template failures abort the build.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let pages = self.discover_pages()?;

        // Isolates stay on the thread that created them: one controller per
        // rayon worker.
        let results: Vec<Result<GalleryEntry, BuildError>> = pages
            .par_iter()
            .map_init(
                || PreviewController::new(Pipeline::standard(self.config.sandbox)),
                |controller, page| self.build_page(controller, page),
            )
            .collect();

        let entries = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        let failed = entries.iter().filter(|e| e.status == "failed").count();

        self.write_gallery(&entries)?;

        let duration = start.elapsed();

        tracing::info!(
            pages = entries.len(),
            failed,
            "Built gallery in {}ms",
            duration.as_millis()
        );

        Ok(BuildResult {
            pages: entries.len(),
            failed,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Discover all component sources in the source directory.
    fn discover_pages(&self) -> Result<Vec<PageInfo>, BuildError> {
        let mut pages = Vec::new();

        if !self.config.source_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Source directory not found: {}",
                self.config.source_dir.display()
            )));
        }

        for entry in WalkDir::new(&self.config.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !path.is_file() || !is_component_file(path) {
                continue;
            }

            let content = fs::read_to_string(path)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

            let relative = path
                .strip_prefix(&self.config.source_dir)
                .unwrap_or(path)
                .with_extension("");

            let title = relative
                .file_name()
                .and_then(|s| s.to_str())
                .map(capitalize)
                .unwrap_or_else(|| "Untitled".to_string());

            pages.push(PageInfo {
                source_path: path.to_path_buf(),
                output_path: PathBuf::new(),
                url_path: slug_path(&relative),
                title,
                source: SourceText::from(content),
            });
        }

        // Sources whose names slug the same get numbered in path order
        pages.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        let mut taken = HashSet::new();
        for page in &mut pages {
            let mut slug = page.url_path.clone();
            let mut n = 2;
            while !taken.insert(slug.clone()) {
                slug = format!("{}-{}", page.url_path, n);
                n += 1;
            }
            page.output_path = self.config.output_dir.join(&slug).join("index.html");
            page.url_path = format!("{}/", slug);
        }

        pages.sort_by(|a, b| a.url_path.cmp(&b.url_path));

        Ok(pages)
    }

    /// Render a single page.
    fn build_page(
        &self,
        controller: &mut PreviewController,
        page: &PageInfo,
    ) -> Result<GalleryEntry, BuildError> {
        let snapshot = controller.submit(&page.source).snapshot();

        if let PreviewSnapshot::Failed { message, .. } = &snapshot {
            tracing::warn!("{}: {}", page.source_path.display(), message);
        }

        let preview = PreviewPage::from_snapshot(&page.title, &snapshot)
            .with_site(&self.config.title, &self.config.base_url);

        let html = self
            .templates
            .render_preview(&preview)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        // Release the isolate before this worker picks up another page.
        controller.clear();

        if let Some(parent) = page.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }

        fs::write(&page.output_path, html).map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(GalleryEntry {
            title: page.title.clone(),
            path: page.url_path.clone(),
            status: preview.status,
            message: preview.message,
        })
    }

    fn write_gallery(&self, entries: &[GalleryEntry]) -> Result<(), BuildError> {
        let html = self
            .templates
            .render_gallery(&self.config.title, &self.config.base_url, entries)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        fs::write(self.config.output_dir.join("index.html"), html)
            .map_err(|e| BuildError::WriteError(e.to_string()))
    }
}

/// `.jsx`/`.tsx` sources, excluding tests and stories.
fn is_component_file(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext != "jsx" && ext != "tsx" {
        return false;
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    !(name.contains(".test.") || name.contains(".spec.") || name.contains(".stories."))
}

/// URL-safe relative output directory: lowercase, runs of other characters
/// collapsed to `-`. Never empty, so a page cannot land on the gallery index.
fn slug_path(relative: &Path) -> String {
    let slug = relative
        .components()
        .map(|c| slugify(&c.as_os_str().to_string_lossy()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Capitalize first letter of a string.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
