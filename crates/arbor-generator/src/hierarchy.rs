//! Hierarchy assembly: home, section and nested list pages.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use arbor_core::{ContentRecord, ListSourceContent, content::is_content_file, humanize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    error::Result,
    scanner::is_hidden,
    site::{BundleResource, PageId, PageKind, PageNode, Site, permalink_for},
};

/// Pages created by [`assemble`].
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub home: Option<PageId>,

    /// Regular pages in record order.
    pub pages: Vec<PageId>,

    /// Top-level section pages by section name.
    pub sections: BTreeMap<String, PageId>,

    /// Nested list pages by directory key.
    pub nested: BTreeMap<String, PageId>,
}

/// Build the home page, regular pages, section pages and nested list pages.
///
/// Records must already be filtered for drafts and sorted by date.
pub fn assemble(
    site: &mut Site,
    records: &[ContentRecord],
    list_content: &BTreeMap<String, ListSourceContent>,
    content_dir: &Path,
) -> Result<Hierarchy> {
    let mut hierarchy = Hierarchy::default();

    let home = site.add_page(home_page(site, list_content.get("")));
    hierarchy.home = Some(home);

    for record in records {
        let id = site.add_page(PageNode::from_record(record));
        hierarchy.pages.push(id);

        if record.file.is_leaf_bundle_index()
            && let Some(parent) = record.file.path.parent()
        {
            let out_dir = record
                .output_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            site.resources.extend(bundle_resources(parent, &out_dir)?);
        }
    }

    // Sections with pages plus directories carrying a branch index.
    let mut directories: BTreeSet<String> = records
        .iter()
        .filter(|r| !r.section.is_empty())
        .map(|r| r.section.clone())
        .collect();
    directories.extend(list_content.keys().filter(|k| !k.is_empty()).cloned());

    for dir in &directories {
        let segments: Vec<&str> = dir.split('/').collect();
        let is_top_level = segments.len() == 1;

        let members: Vec<PageId> = if is_top_level {
            records
                .iter()
                .zip(&hierarchy.pages)
                .filter(|(r, _)| r.section == *dir)
                .map(|(_, id)| *id)
                .collect()
        } else {
            let prefix = format!("{}/", permalink_for(&segments));
            records
                .iter()
                .zip(&hierarchy.pages)
                .filter(|(r, _)| r.permalink.starts_with(&prefix))
                .map(|(_, id)| *id)
                .collect()
        };

        let content = list_content.get(dir);
        let mut node = list_page(&segments, content);
        node.children = members;
        let id = site.add_page(node);
        debug!(dir = %dir, members = site.page(id).children.len(), "list page");

        if let Some(source) = content.and_then(|c| c.file.as_ref())
            && let Some(source_dir) = source.path.parent()
        {
            let out_dir = site
                .page(id)
                .output_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            site.resources
                .extend(bundle_resources(source_dir, &out_dir)?);
        }

        if is_top_level {
            hierarchy.sections.insert(dir.clone(), id);
        } else {
            hierarchy.nested.insert(dir.clone(), id);
        }
    }

    if let Some(source) = list_content.get("").and_then(|c| c.file.as_ref())
        && source.path.parent() == Some(content_dir)
    {
        site.resources
            .extend(bundle_resources(content_dir, Path::new(""))?);
    }

    link_parents(site, &hierarchy, records);

    // Home lists the sections, then root-level pages.
    let mut home_children: Vec<PageId> = hierarchy.sections.values().copied().collect();
    home_children.extend(
        records
            .iter()
            .zip(&hierarchy.pages)
            .filter(|(r, _)| r.section.is_empty())
            .map(|(_, id)| *id),
    );
    site.page_mut(home).children = home_children;

    info!(
        pages = hierarchy.pages.len(),
        sections = hierarchy.sections.len(),
        nested = hierarchy.nested.len(),
        resources = site.resources.len(),
        "hierarchy assembled"
    );
    Ok(hierarchy)
}

fn home_page(site: &Site, content: Option<&ListSourceContent>) -> PageNode {
    let title = content
        .and_then(|c| c.title.clone())
        .unwrap_or_else(|| site.config.site.title.clone());
    let mut home = PageNode::new(PageKind::Home, title, "/");
    home.content_type = "home".to_string();
    home.description = site.config.site.description.clone().unwrap_or_default();
    if let Some(content) = content {
        apply_list_content(&mut home, content);
    }
    home
}

fn list_page(segments: &[&str], content: Option<&ListSourceContent>) -> PageNode {
    let last = segments.last().copied().unwrap_or_default();
    let title = content
        .and_then(|c| c.title.clone())
        .unwrap_or_else(|| humanize(last));

    let mut node = PageNode::new(PageKind::Section, title, permalink_for(segments));
    node.section = segments.first().copied().unwrap_or_default().to_string();
    node.slug = last.to_string();
    node.content_type = node.section.clone();
    node.source_dir = segments.join("/");
    if let Some(content) = content {
        apply_list_content(&mut node, content);
    }
    node
}

fn apply_list_content(node: &mut PageNode, content: &ListSourceContent) {
    if let Some(content_type) = content.content_type.clone().filter(|t| !t.is_empty()) {
        node.content_type = content_type;
    }
    if !content.description.is_empty() {
        node.description = content.description.clone();
    }
    node.layout = content.layout.clone();
    node.params = content.params.clone();
    node.source = content.file.as_ref().map(|f| f.path.clone());
    node.raw_body = content.has_body().then(|| content.raw_body.clone());
}

/// Pages and nested list pages point at the nearest enclosing nested list
/// page, else their top-level section, else home.
fn link_parents(site: &mut Site, hierarchy: &Hierarchy, records: &[ContentRecord]) {
    let Some(home) = hierarchy.home else {
        return;
    };

    let nested: Vec<(String, PageId)> = hierarchy
        .nested
        .iter()
        .map(|(dir, id)| {
            let segments: Vec<&str> = dir.split('/').collect();
            (format!("{}/", permalink_for(&segments)), *id)
        })
        .collect();
    let enclosing = |permalink: &str| {
        nested
            .iter()
            .filter(|(prefix, _)| permalink.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, id)| *id)
    };

    for (record, id) in records.iter().zip(&hierarchy.pages) {
        let parent = enclosing(&record.permalink)
            .or_else(|| hierarchy.sections.get(&record.section).copied())
            .unwrap_or(home);
        site.page_mut(*id).parent = Some(parent);
    }
    for id in hierarchy.sections.values() {
        site.page_mut(*id).parent = Some(home);
    }
    for (dir, id) in &hierarchy.nested {
        let top = dir.split('/').next().unwrap_or_default();
        let parent = enclosing(&site.page(*id).permalink)
            .or_else(|| hierarchy.sections.get(top).copied())
            .unwrap_or(home);
        site.page_mut(*id).parent = Some(parent);
    }
}

/// Non-markdown files next to an index file, copied into `out_dir`.
///
/// Descent stops at subdirectories that are bundles or hold markdown.
pub fn bundle_resources(source_dir: &Path, out_dir: &Path) -> Result<Vec<BundleResource>> {
    let mut resources = Vec::new();
    let mut walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    while let Some(entry) = walker.next() {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        if entry.file_type().is_dir() {
            if contains_markdown(entry.path()) {
                walker.skip_current_dir();
            }
            continue;
        }
        if !entry.file_type().is_file() || is_content_file(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
        resources.push(BundleResource {
            source: entry.path().to_path_buf(),
            output_path: out_dir.join(relative),
        });
    }

    Ok(resources)
}

fn contains_markdown(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .any(|e| e.path().is_file() && is_content_file(&e.path()))
        })
        .unwrap_or(false)
}
