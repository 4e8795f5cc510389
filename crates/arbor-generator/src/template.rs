//! HTML templates: selection from layout overlays and interpolation.
//!
//! Templates are plain files using `{{ variable }}` placeholders
//! (`{{ variable? }}` for optional ones). A template is picked from an
//! ordered list of candidate names, looked up first in the site's layout
//! directory and then in the theme's. When nothing matches, a built-in
//! default is used.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::{
    error::{IoResultExt, Result as GeneratorResult},
    site::PageKind,
};

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Variables available to a template. Values are inserted already escaped
/// where escaping is needed.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: BTreeMap<String, String>,
}

impl TemplateContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// One `{{ name }}` or `{{ name? }}` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder<'a> {
    name: &'a str,
    optional: bool,
}

impl<'a> Placeholder<'a> {
    /// Parse the text between the braces.
    fn parse(inner: &'a str) -> Result<Self> {
        let inner = inner.trim();
        let (name, optional) = match inner.strip_suffix('?') {
            Some(name) => (name.trim_end(), true),
            None => (inner, false),
        };
        if name.is_empty() {
            return Err(TemplateError::InvalidSyntax("empty placeholder".to_string()));
        }
        Ok(Self { name, optional })
    }

    /// Value from the context; optional placeholders default to "".
    fn resolve<'c>(&self, context: &'c TemplateContext) -> Result<&'c str> {
        match context.get(self.name) {
            Some(value) => Ok(value),
            None if self.optional => Ok(""),
            None => Err(TemplateError::MissingVariable(self.name.to_string())),
        }
    }
}

/// A named template body.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Layout path or built-in name, for error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute every placeholder in one left-to-right pass. Inserted
    /// values are copied verbatim and never scanned for placeholders.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut output = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(open) = rest.find("{{") {
            output.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| TemplateError::InvalidSyntax("unclosed {{ delimiter".to_string()))?;
            output.push_str(Placeholder::parse(&after[..close])?.resolve(context)?);
            rest = &after[close + 2..];
        }
        output.push_str(rest);

        Ok(output)
    }
}

/// Finds template files in the site and theme layout directories.
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    site_layouts: PathBuf,
    theme_layouts: Option<PathBuf>,
}

impl TemplateSelector {
    #[must_use]
    pub fn new(site_layouts: impl Into<PathBuf>, theme_layouts: Option<PathBuf>) -> Self {
        Self {
            site_layouts: site_layouts.into(),
            theme_layouts,
        }
    }

    /// First candidate present in the site overlay, else the first present
    /// in the theme overlay.
    pub fn select<S: AsRef<str>>(&self, candidates: &[S]) -> Option<PathBuf> {
        std::iter::once(self.site_layouts.as_path())
            .chain(self.theme_layouts.as_deref())
            .find_map(|dir| {
                candidates
                    .iter()
                    .map(|name| dir.join(name.as_ref()))
                    .find(|path| path.is_file())
            })
    }
}

/// What the candidate chains are built from.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub kind: PageKind,
    pub content_type: &'a str,
    pub section: &'a str,
    pub layout: Option<&'a str>,
}

/// Candidate names for a page, most specific first.
pub fn candidates(lookup: &Lookup<'_>) -> Vec<String> {
    let Lookup {
        kind,
        content_type,
        section,
        layout,
    } = *lookup;

    let mut names = Vec::new();
    let layout = layout.map(str::trim).filter(|l| !l.is_empty());

    match kind {
        PageKind::Page | PageKind::Section => {
            let fallback = if kind == PageKind::Page { "single" } else { "list" };
            if let Some(layout) = layout {
                push_scoped(&mut names, content_type, section, layout);
                names.push(format!("_default/{layout}.html"));
                names.push(format!("{layout}.html"));
            }
            push_scoped(&mut names, content_type, section, fallback);
            names.push(format!("_default/{fallback}.html"));
        }
        PageKind::Home => {
            names.push("index.html".to_string());
            names.push("_default/home.html".to_string());
            names.push("_default/list.html".to_string());
        }
        PageKind::Term | PageKind::Taxonomy => {
            let name = if kind == PageKind::Term { "term" } else { "taxonomy" };
            if !content_type.is_empty() {
                names.push(format!("{content_type}/{name}.html"));
            }
            names.push(format!("_default/{name}.html"));
            names.push("_default/list.html".to_string());
        }
    }

    dedup(names)
}

/// Candidate names for the base wrapper.
pub fn base_candidates(content_type: &str, section: &str) -> Vec<String> {
    let mut names = Vec::new();
    push_scoped(&mut names, content_type, section, "baseof");
    names.push("_default/baseof.html".to_string());
    names.push("baseof.html".to_string());
    dedup(names)
}

fn push_scoped(names: &mut Vec<String>, content_type: &str, section: &str, name: &str) {
    for scope in [content_type, section] {
        if !scope.is_empty() {
            names.push(format!("{scope}/{name}.html"));
        }
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Loads selected templates, caching them per path.
#[derive(Debug)]
pub struct TemplateSet {
    selector: TemplateSelector,
    loaded: HashMap<PathBuf, Template>,
}

impl TemplateSet {
    #[must_use]
    pub fn new(selector: TemplateSelector) -> Self {
        Self {
            selector,
            loaded: HashMap::new(),
        }
    }

    /// Template for a page body.
    pub fn page_template(&mut self, lookup: &Lookup<'_>) -> GeneratorResult<Template> {
        let fallback = match lookup.kind {
            PageKind::Page => Template::new("default/single", DEFAULT_SINGLE_TEMPLATE),
            PageKind::Term => Template::new("default/term", DEFAULT_TERM_TEMPLATE),
            PageKind::Taxonomy => Template::new("default/taxonomy", DEFAULT_TAXONOMY_TEMPLATE),
            PageKind::Home | PageKind::Section => {
                Template::new("default/list", DEFAULT_LIST_TEMPLATE)
            }
        };
        self.resolve(&candidates(lookup), fallback)
    }

    /// Base wrapper template.
    pub fn base_template(&mut self, content_type: &str, section: &str) -> GeneratorResult<Template> {
        self.resolve(
            &base_candidates(content_type, section),
            Template::new("default/baseof", DEFAULT_BASE_TEMPLATE),
        )
    }

    fn resolve(&mut self, names: &[String], fallback: Template) -> GeneratorResult<Template> {
        let Some(path) = self.selector.select(names) else {
            return Ok(fallback);
        };
        if let Some(template) = self.loaded.get(&path) {
            return Ok(template.clone());
        }

        debug!(path = %path.display(), "loading template");
        let content = fs::read_to_string(&path).at(&path)?;
        let template = Template::new(template_name(&path), content);
        self.loaded.insert(path, template.clone());
        Ok(template)
    }
}

fn template_name(path: &Path) -> String {
    path.display().to_string()
}

/// Default base HTML template.
pub const DEFAULT_BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} | {{ site_title }}</title>
    <meta name="description" content="{{ description? }}">
    <link rel="canonical" href="{{ canonical_url }}">
    <link rel="alternate" type="application/rss+xml" title="{{ site_title }}" href="/index.xml">
    <style>
        :root {
            --color-primary: #3B82F6;
            --color-bg: #F8FAFC;
            --color-text: #1E293B;
            --color-text-muted: #64748B;
            --color-border: #E2E8F0;
            color-scheme: light dark;
        }

        @media (prefers-color-scheme: dark) {
            :root {
                --color-primary: #60A5FA;
                --color-bg: #0F172A;
                --color-text: #F1F5F9;
                --color-text-muted: #94A3B8;
                --color-border: #334155;
            }
        }

        body {
            font-family: system-ui, -apple-system, sans-serif;
            line-height: 1.7;
            color: var(--color-text);
            background-color: var(--color-bg);
            margin: 0;
        }

        .container { max-width: 860px; margin: 0 auto; padding: 0 1.5rem; }
        header, footer { border-color: var(--color-border); border-style: solid; border-width: 0; }
        header { border-bottom-width: 1px; }
        footer { border-top-width: 1px; color: var(--color-text-muted); font-size: 0.875rem; }
        header nav { display: flex; gap: 1.5rem; align-items: center; padding: 1rem 0; }
        header nav ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
        a { color: var(--color-primary); text-decoration: none; }
        a:hover { text-decoration: underline; }
        .site-title { font-weight: 600; color: var(--color-text); }
        .layout { display: flex; gap: 2rem; }
        .docs-nav { min-width: 14rem; font-size: 0.9rem; }
        .docs-nav .current > a { font-weight: 600; }
        .breadcrumbs { font-size: 0.875rem; color: var(--color-text-muted); }
        .post-list { list-style: none; padding: 0; }
        .post-item { padding: 0.75rem 0; border-bottom: 1px solid var(--color-border); }
        .post-item time { color: var(--color-text-muted); font-size: 0.875rem; margin-left: 0.5rem; }
        .menu .active > a { font-weight: 600; }
    </style>
</head>
<body>
    <header>
        <div class="container">
            <nav>
                <a href="/" class="site-title">{{ site_title }}</a>
                {{ menu_main? }}
            </nav>
        </div>
    </header>
    <main>
        <div class="container layout">
            {{ nav? }}
            <div class="main-content">
                {{ breadcrumbs? }}
                {{ content }}
            </div>
        </div>
    </main>
    <footer>
        <div class="container">
            <p>&copy; {{ year }} {{ site_title }}</p>
        </div>
    </footer>
</body>
</html>"##;

/// Default template for regular pages.
pub const DEFAULT_SINGLE_TEMPLATE: &str = r#"<article class="page">
    <header>
        <h1>{{ title }}</h1>
        {{ date_html? }}
        {{ tags_html? }}
    </header>
    <div class="content">
        {{ content }}
    </div>
</article>"#;

/// Default template for home and section pages.
pub const DEFAULT_LIST_TEMPLATE: &str = r#"<section class="list">
    <h1>{{ title }}</h1>
    <div class="content">
        {{ content? }}
    </div>
    <ul class="post-list">
        {{ items }}
    </ul>
</section>"#;

/// Default template for taxonomy term pages.
pub const DEFAULT_TERM_TEMPLATE: &str = r#"<section class="taxonomy post-list">
    <h1>{{ taxonomy_title }}: <span>{{ title }}</span></h1>
    <ul class="post-list">
        {{ items }}
    </ul>
</section>"#;

/// Default template for taxonomy roots.
pub const DEFAULT_TAXONOMY_TEMPLATE: &str = r#"<section class="taxonomy">
    <h1>{{ title }}</h1>
    <ul class="term-list">
        {{ items }}
    </ul>
</section>"#;
