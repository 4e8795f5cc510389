//! Content scanning and routing.
//!
//! Walks the content directory, classifies every markdown file and derives
//! its URL and output path.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use arbor_core::{
    ContentRecord, FrontMatter, ListSourceContent, PageFile, content::is_content_file, humanize,
    parse_front_matter, slugify,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::{
    error::{IoResultExt, Result},
    site::{output_path_for, permalink_for},
};

/// Output of a content scan.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Ordinary pages, sorted by date, newest first.
    pub records: Vec<ContentRecord>,

    /// Branch index content keyed by directory.
    pub list_content: BTreeMap<String, ListSourceContent>,

    /// Number of drafts left out.
    pub skipped_drafts: usize,
}

/// URL routing of one content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub section: String,
    pub slug: String,
    pub segments: Vec<String>,
    pub permalink: String,
    pub output_path: PathBuf,
}

/// Walks a content directory into routed records.
#[derive(Debug)]
pub struct ContentScanner {
    content_dir: PathBuf,
    include_drafts: bool,
}

impl ContentScanner {
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>, include_drafts: bool) -> Self {
        Self {
            content_dir: content_dir.into(),
            include_drafts,
        }
    }

    /// Scan all content files.
    pub fn scan(&self) -> Result<ScanResult> {
        info!(dir = %self.content_dir.display(), "scanning content");

        let mut result = ScanResult::default();
        if !self.content_dir.is_dir() {
            debug!("content directory does not exist");
            return Ok(result);
        }

        for path in content_files(&self.content_dir)? {
            let Some(file) = PageFile::new(&path, &self.content_dir) else {
                continue;
            };

            let text = fs::read_to_string(&path).at(&path)?;
            let (front_matter, body) = parse_front_matter(&text, &path);

            if file.is_branch_index() {
                debug!(dir = %file.dir, "branch index");
                result
                    .list_content
                    .insert(file.dir.clone(), list_content(file, front_matter, body));
                continue;
            }

            if front_matter.draft && !self.include_drafts {
                debug!(path = %path.display(), "skipping draft");
                result.skipped_drafts += 1;
                continue;
            }

            let lastmod = modified_time(&path)?;
            result
                .records
                .push(build_record(file, front_matter, body, lastmod));
        }

        result.records.sort_by(|a, b| b.date.cmp(&a.date));

        info!(
            pages = result.records.len(),
            branches = result.list_content.len(),
            drafts = result.skipped_drafts,
            "content scan complete"
        );
        Ok(result)
    }
}

/// Markdown files below `root`, hidden entries skipped, in file-name order.
pub fn content_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_content_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

pub(crate) fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).at(path)?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Route a content file.
///
/// Leaf bundles take their defining name from the directory and replace
/// that directory in the URL; other files append their slug to the
/// directory segments.
pub fn route(file: &PageFile, explicit_slug: Option<&str>) -> Route {
    let mut dir_segments: Vec<String> = file
        .dir_segments()
        .into_iter()
        .map(str::to_string)
        .collect();

    let defining_name = if file.is_leaf_bundle_index() {
        dir_segments.pop().unwrap_or_default()
    } else {
        file.base_name.clone()
    };

    let slug = explicit_slug
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| slugify(&defining_name));

    let section = dir_segments.first().cloned().unwrap_or_default();

    let mut segments = dir_segments;
    segments.push(slug.clone());
    let permalink = permalink_for(&segments);
    let output_path = output_path_for(&permalink);

    Route {
        section,
        slug,
        segments,
        permalink,
        output_path,
    }
}

fn build_record(
    file: PageFile,
    front_matter: FrontMatter,
    body: String,
    lastmod: DateTime<Utc>,
) -> ContentRecord {
    let route = route(&file, front_matter.slug.as_deref());

    let content_type = front_matter
        .content_type
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| {
            if route.section.is_empty() {
                "page".to_string()
            } else {
                route.section.clone()
            }
        });

    let title = front_matter
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| humanize(&route.slug));

    ContentRecord {
        section: route.section,
        content_type,
        slug: route.slug,
        title,
        date: front_matter.date.unwrap_or(lastmod),
        lastmod,
        draft: front_matter.draft,
        description: front_matter.description,
        tags: front_matter.tags,
        categories: front_matter.categories,
        params: front_matter.params,
        raw_body: body,
        permalink: route.permalink,
        output_path: route.output_path,
        layout: front_matter.layout,
        weight: front_matter.weight,
        menus: front_matter.menus,
        file,
    }
}

fn list_content(file: PageFile, front_matter: FrontMatter, body: String) -> ListSourceContent {
    ListSourceContent {
        title: front_matter.title.filter(|t| !t.trim().is_empty()),
        raw_body: body,
        description: front_matter.description,
        content_type: front_matter.content_type,
        layout: front_matter.layout,
        params: front_matter.params,
        dir: file.dir.clone(),
        menus: front_matter.menus,
        file: Some(file),
    }
}
