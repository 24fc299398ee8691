//! Template engine for preview documents, the gallery and the dev shell.

use minijinja::{context, Environment};
use uiforge_preview::PreviewSnapshot;

use crate::assets::AssetPipeline;

/// Context for a standalone preview document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PreviewPage {
    /// Page title
    pub title: String,
    /// Site title
    pub site_title: String,
    /// Base URL
    pub base_url: String,
    /// Include the live-reload client
    pub hmr: bool,
    /// "idle", "rendering" or "failed"
    pub status: &'static str,
    pub revision: u64,
    pub markup: Option<String>,
    pub component: Option<String>,
    pub kind: Option<String>,
    pub message: Option<String>,
}

impl PreviewPage {
    pub fn from_snapshot(title: impl Into<String>, snapshot: &PreviewSnapshot) -> Self {
        let mut page = Self {
            title: title.into(),
            site_title: String::new(),
            base_url: "/".to_string(),
            hmr: false,
            status: "idle",
            revision: snapshot.revision(),
            markup: None,
            component: None,
            kind: None,
            message: None,
        };

        match snapshot {
            PreviewSnapshot::Idle { .. } => {}
            PreviewSnapshot::Rendering {
                markup, component, ..
            } => {
                page.status = "rendering";
                page.markup = Some(markup.clone());
                page.component = component.clone();
            }
            PreviewSnapshot::Failed { kind, message, .. } => {
                page.status = "failed";
                page.kind = Some(kind.clone());
                page.message = Some(message.clone());
            }
        }

        page
    }

    pub fn with_site(mut self, site_title: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.site_title = site_title.into();
        self.base_url = base_url.into();
        self
    }

    pub fn with_hmr(mut self, hmr: bool) -> Self {
        self.hmr = hmr;
        self
    }
}

/// A gallery entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GalleryEntry {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
    /// "rendering" or "failed"
    pub status: &'static str,
    /// Error message for failed pages
    pub message: Option<String>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
    css: String,
}

impl TemplateEngine {
    /// Create a new template engine with default templates.
    pub fn new() -> Self {
        Self::with_minify(true)
    }

    pub fn with_minify(minify: bool) -> Self {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())
            .expect("Failed to add base template");

        env.add_template_owned("preview.html".to_string(), PREVIEW_TEMPLATE.to_string())
            .expect("Failed to add preview template");

        env.add_template_owned("gallery.html".to_string(), GALLERY_TEMPLATE.to_string())
            .expect("Failed to add gallery template");

        env.add_template_owned("shell.html".to_string(), SHELL_TEMPLATE.to_string())
            .expect("Failed to add shell template");

        Self {
            env,
            css: AssetPipeline::stylesheet(minify),
        }
    }

    /// Render a standalone preview document.
    pub fn render_preview(&self, page: &PreviewPage) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("preview.html")?;

        tmpl.render(context! {
            css => &self.css,
            page => page,
            title => &page.title,
            site_title => &page.site_title,
            base_url => &page.base_url,
            hmr => page.hmr,
        })
    }

    /// Render the gallery index.
    pub fn render_gallery(
        &self,
        site_title: &str,
        base_url: &str,
        entries: &[GalleryEntry],
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("gallery.html")?;

        tmpl.render(context! {
            css => &self.css,
            title => site_title,
            site_title => "",
            base_url => base_url,
            hmr => false,
            entries => entries,
        })
    }

    /// Render the dev server shell page.
    pub fn render_shell(&self, title: &str, base_url: &str) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("shell.html")?;

        tmpl.render(context! {
            css => &self.css,
            title => title,
            site_title => "",
            base_url => base_url,
            hmr => false,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }}{% if site_title %} - {{ site_title }}{% endif %}</title>
  <script src="https://cdn.tailwindcss.com"></script>
  <style>{{ css | safe }}</style>
</head>
<body class="{% block body_class %}{% endblock %}">
  {% block content %}{% endblock %}
  {% if hmr %}<script src="{{ base_url }}__hmr.js"></script>{% endif %}
</body>
</html>"##;

const PREVIEW_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
{% if page.status == "rendering" %}
<div id="uiforge-root" class="uiforge-stage" data-status="rendering" data-revision="{{ page.revision }}"{% if page.component %} data-component="{{ page.component }}"{% endif %}>{{ page.markup | safe }}</div>
{% elif page.status == "failed" %}
<div class="uiforge-panel uiforge-error" role="alert" data-kind="{{ page.kind }}" data-status="failed" data-revision="{{ page.revision }}">
  <div>
    <h3>Rendering Error</h3>
    <pre>{{ page.message }}</pre>
  </div>
</div>
{% else %}
<div class="uiforge-panel uiforge-idle" data-status="idle" data-revision="{{ page.revision }}">
  <p>Waiting for code...</p>
</div>
{% endif %}
{% endblock %}"##;

const GALLERY_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block body_class %}uiforge-dark{% endblock %}

{% block content %}
<main class="uiforge-gallery">
  <h1 class="text-2xl font-bold mb-6">{{ title }}</h1>
  {% if entries %}
  <ul>
  {% for entry in entries %}
    <li class="uiforge-card {{ entry.status }}">
      <a href="{{ base_url }}{{ entry.path }}">{{ entry.title }}</a>
      {% if entry.message %}<p>{{ entry.message }}</p>{% endif %}
    </li>
  {% endfor %}
  </ul>
  {% else %}
  <p>No components found.</p>
  {% endif %}
</main>
{% endblock %}"##;

const SHELL_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block body_class %}uiforge-dark{% endblock %}

{% block content %}
<div class="uiforge-shell">
  <section class="uiforge-chat">
    <header class="p-4 font-semibold">{{ title }}</header>
    <div id="uiforge-log" class="uiforge-log"></div>
    <form id="uiforge-form" class="uiforge-form">
      <textarea name="prompt" placeholder="Describe the UI you want..."></textarea>
      <div class="flex flex-col gap-2">
        <button type="submit">Generate</button>
        <button type="button" id="uiforge-reset">Reset</button>
      </div>
    </form>
  </section>
  <iframe class="uiforge-frame" src="{{ base_url }}preview" title="Preview" sandbox="allow-scripts"></iframe>
</div>
<script>
(function () {
  const base = {{ base_url | tojson }};
  const form = document.getElementById('uiforge-form');
  const log = document.getElementById('uiforge-log');
  const input = form.querySelector('textarea');
  const buttons = form.querySelectorAll('button');

  function append(role, text) {
    const turn = document.createElement('div');
    turn.className = 'turn ' + role;
    turn.textContent = text;
    log.appendChild(turn);
    log.scrollTop = log.scrollHeight;
  }

  function busy(value) {
    buttons.forEach(function (button) { button.disabled = value; });
  }

  form.addEventListener('submit', async function (event) {
    event.preventDefault();
    const prompt = input.value.trim();
    if (!prompt) return;

    append('user', prompt);
    busy(true);
    try {
      const res = await fetch(base + 'api/generate', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ prompt: prompt }),
      });
      const body = await res.json();
      if (!res.ok) {
        append('error', (body.error && body.error.message) || res.statusText);
      } else if (body.status === 'failed') {
        append('model', 'Preview failed: ' + body.message);
        input.value = '';
      } else {
        append('model', 'Preview updated' + (body.component ? ': ' + body.component : ''));
        input.value = '';
      }
    } catch (err) {
      append('error', String(err));
    } finally {
      busy(false);
    }
  });

  document.getElementById('uiforge-reset').addEventListener('click', async function () {
    await fetch(base + 'api/reset', { method: 'POST' });
    log.textContent = '';
  });
})();
</script>
{% endblock %}"##;
