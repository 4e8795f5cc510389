//! Build orchestration.
//!
//! Coordinates scan, assembly and rendering for content sites and docs sites.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use arbor_core::{Config, CoreError};
use arbor_parser::MarkdownRenderer;
use tracing::{debug, info};

use crate::{
    assets::AssetProcessor,
    docs::build_docs_site,
    error::{IoResultExt, Result},
    hierarchy::assemble,
    menu::{assemble_menus, menus_from_config},
    render::{SiteRenderer, render_bodies, write_site_files},
    scanner::ContentScanner,
    site::{PageKind, Site},
    taxonomy::index_taxonomies,
    template::{TemplateSelector, TemplateSet},
};

/// Everything a build needs to know.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Site root holding the config, content, layouts and static files.
    pub site_dir: PathBuf,

    pub config: Config,

    /// Output directory.
    pub destination: PathBuf,

    pub include_drafts: bool,

    /// Remove the destination before writing.
    pub clean_destination: bool,
}

impl BuildRequest {
    /// Request using the directories and flags from the configuration.
    #[must_use]
    pub fn new(site_dir: impl Into<PathBuf>, config: Config) -> Self {
        let site_dir = site_dir.into();
        Self {
            destination: site_dir.join(&config.build.output_dir),
            include_drafts: config.build.drafts,
            clean_destination: config.build.clean_destination,
            site_dir,
            config,
        }
    }

    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    #[must_use]
    pub fn with_drafts(mut self, include_drafts: bool) -> Self {
        self.include_drafts = include_drafts;
        self
    }

    #[must_use]
    pub fn with_clean_destination(mut self, clean: bool) -> Self {
        self.clean_destination = clean;
        self
    }

    pub fn content_dir(&self) -> PathBuf {
        self.site_dir.join(&self.config.site.content_dir)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.site_dir.join(&self.config.build.static_dir)
    }

    /// Template lookup over the site layouts, then the theme's.
    pub fn template_selector(&self) -> TemplateSelector {
        TemplateSelector::new(
            self.site_dir.join(&self.config.build.layout_dir),
            self.config.theme_layout_dir(&self.site_dir),
        )
    }
}

/// Build the site graph of a content site.
pub fn build_content_site(request: &BuildRequest) -> Result<Site> {
    let content_dir = request.content_dir();
    let scan = ContentScanner::new(&content_dir, request.include_drafts).scan()?;

    let mut site = Site::new(request.config.clone());
    site.menus = menus_from_config(&request.config);

    let hierarchy = assemble(&mut site, &scan.records, &scan.list_content, &content_dir)?;
    index_taxonomies(&mut site);

    let mut registrations = Vec::new();
    for (record, id) in scan.records.iter().zip(&hierarchy.pages) {
        if !record.menus.is_empty() {
            registrations.push((*id, record.menus.clone()));
        }
    }
    for (dir, content) in &scan.list_content {
        if content.menus.is_empty() {
            continue;
        }
        let id = if dir.is_empty() {
            hierarchy.home
        } else {
            hierarchy
                .sections
                .get(dir)
                .or_else(|| hierarchy.nested.get(dir))
                .copied()
        };
        if let Some(id) = id {
            registrations.push((id, content.menus.clone()));
        }
    }
    assemble_menus(&mut site, &registrations);

    site.fill_ancestors();
    Ok(site)
}

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Regular pages written.
    pub pages: usize,

    /// Home and section pages written.
    pub list_pages: usize,

    /// Term and taxonomy pages written.
    pub taxonomy_pages: usize,

    /// Static files and bundle resources copied.
    pub resources: usize,

    pub duration_ms: u64,
}

/// Runs a complete build: assemble, render, write.
#[derive(Debug)]
pub struct Builder {
    request: BuildRequest,
}

impl Builder {
    #[must_use]
    pub fn new(request: BuildRequest) -> Self {
        Self { request }
    }

    /// Execute the full build.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let request = &self.request;

        info!(
            site = %request.site_dir.display(),
            output = %request.destination.display(),
            docs = request.config.docs.is_some(),
            "starting build"
        );

        if let Some(docs) = &request.config.docs {
            docs.validate(&request.site_dir)?;
        }
        self.prepare_output()?;

        let mut site = match &request.config.docs {
            Some(docs) => build_docs_site(request, docs)?,
            None => build_content_site(request)?,
        };

        render_bodies(&mut site, &MarkdownRenderer::new())?;

        let templates = TemplateSet::new(request.template_selector());
        SiteRenderer::new(&site, templates, &request.destination).write_pages()?;

        let assets = AssetProcessor::new(&request.destination);
        let mut resources = assets.copy_resources(&site.resources)?;
        resources += assets.copy_static(&request.static_dir())?;

        write_site_files(&site, &request.destination)?;

        let stats = BuildStats {
            pages: site.count(PageKind::Page),
            list_pages: site.count(PageKind::Home) + site.count(PageKind::Section),
            taxonomy_pages: site.count(PageKind::Term) + site.count(PageKind::Taxonomy),
            resources,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        info!(
            pages = stats.pages,
            list_pages = stats.list_pages,
            taxonomy_pages = stats.taxonomy_pages,
            resources = stats.resources,
            duration_ms = stats.duration_ms,
            "build complete"
        );
        Ok(stats)
    }

    /// Clean (when requested) and create the output directory.
    fn prepare_output(&self) -> Result<()> {
        let dest = &self.request.destination;
        if self.request.clean_destination && dest.exists() {
            if contains_site(dest, &self.request.site_dir) {
                return Err(CoreError::config(format!(
                    "refusing to clean {}: it contains the site directory",
                    dest.display()
                ))
                .into());
            }
            debug!(dir = %dest.display(), "cleaning output directory");
            fs::remove_dir_all(dest).at(dest)?;
        }
        fs::create_dir_all(dest).at(dest)?;
        Ok(())
    }
}

fn contains_site(dest: &Path, site_dir: &Path) -> bool {
    match (dest.canonicalize(), site_dir.canonicalize()) {
        (Ok(dest), Ok(site)) => site.starts_with(dest),
        _ => false,
    }
}
