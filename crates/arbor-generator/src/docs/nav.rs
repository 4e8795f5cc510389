//! Docs navigation: TOC documents and the generated fallback.

use std::{fs, path::Path, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::links::LinkResolver;
use crate::{
    error::{IoResultExt, Result},
    site::{PageId, PageKind, Site},
};

/// Inline markdown link: `[title](target "optional title")`. Group 1 is
/// set when the link is an image.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!)?\[([^\[\]]+)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("invalid link regex")
});

const TOC_HEADER: &str = "## table of contents";

/// Navigation tree item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
    pub is_section: bool,
    pub is_current: bool,
    pub order: usize,
}

impl NavItem {
    fn link(title: impl Into<String>, url: impl Into<String>, order: usize) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            order,
            ..Default::default()
        }
    }

    fn section(title: impl Into<String>, url: impl Into<String>, children: Vec<NavItem>, order: usize) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            children,
            is_section: true,
            order,
            ..Default::default()
        }
    }

    /// Mark items whose url equals `permalink`; returns whether any item in
    /// the subtree matched.
    pub fn mark_current(items: &mut [NavItem], permalink: &str) -> bool {
        let mut found = false;
        for item in items {
            item.is_current = !item.url.is_empty() && item.url == permalink;
            let below = Self::mark_current(&mut item.children, permalink);
            found |= item.is_current || below;
        }
        found
    }
}

/// Load a navigation document.
///
/// `.json` files use the JSON form; anything else is read as markdown.
/// `source_dir` is the document's directory relative to the mount root.
pub fn load_nav(path: &Path, source_dir: &str, resolver: &LinkResolver) -> Result<Vec<NavItem>> {
    let text = fs::read_to_string(path).at(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let items = if is_json {
        parse_json_nav(&text, source_dir, resolver)?
    } else {
        parse_markdown_nav(&text, source_dir, resolver)
    };
    debug!(path = %path.display(), items = items.len(), "loaded navigation");
    Ok(items)
}

/// Parse the `## Table of Contents` section of a markdown document.
///
/// `### Group` headers open groups; links before the first group are roots.
/// Without the header the whole document is read.
pub fn parse_markdown_nav(text: &str, source_dir: &str, resolver: &LinkResolver) -> Vec<NavItem> {
    let lines: Vec<&str> = text.lines().collect();
    let body: &[&str] = match lines
        .iter()
        .position(|line| line.trim().eq_ignore_ascii_case(TOC_HEADER))
    {
        Some(start) => {
            let rest = &lines[start + 1..];
            let end = rest
                .iter()
                .position(|line| {
                    let line = line.trim_start();
                    line.starts_with("## ") || line.starts_with("# ")
                })
                .unwrap_or(rest.len());
            &rest[..end]
        }
        None => &lines,
    };

    let mut roots: Vec<NavItem> = Vec::new();
    let mut group: Option<NavItem> = None;

    for line in body {
        let trimmed = line.trim_start();
        if let Some(title) = trimmed.strip_prefix("### ") {
            if let Some(done) = group.take() {
                roots.push(done);
            }
            group = Some(NavItem::section(title.trim(), "", Vec::new(), roots.len()));
            continue;
        }

        for captures in LINK_RE.captures_iter(line) {
            if captures.get(1).is_some() {
                continue;
            }
            let title = captures[2].trim();
            let Some(url) = resolver.resolve(&captures[3], source_dir) else {
                continue;
            };
            match group.as_mut() {
                Some(group) => {
                    let order = group.children.len();
                    group.children.push(NavItem::link(title, url, order));
                }
                None => {
                    let order = roots.len();
                    roots.push(NavItem::link(title, url, order));
                }
            }
        }
    }
    if let Some(done) = group.take() {
        roots.push(done);
    }
    roots
}

#[derive(Debug, Deserialize)]
struct NavDocument {
    #[serde(default)]
    items: Vec<NavDocumentItem>,
}

#[derive(Debug, Deserialize)]
struct NavDocumentItem {
    title: String,
    #[serde(default, alias = "path")]
    url: Option<String>,
    #[serde(default)]
    children: Vec<NavDocumentItem>,
}

/// Parse the JSON form: `{"items": [{"title", "url" | "path", "children"}]}`.
pub fn parse_json_nav(text: &str, source_dir: &str, resolver: &LinkResolver) -> Result<Vec<NavItem>> {
    let document: NavDocument = serde_json::from_str(text)?;
    Ok(convert_items(document.items, source_dir, resolver))
}

fn convert_items(items: Vec<NavDocumentItem>, source_dir: &str, resolver: &LinkResolver) -> Vec<NavItem> {
    let mut converted = Vec::with_capacity(items.len());
    for item in items {
        let children = convert_items(item.children, source_dir, resolver);
        let url = item
            .url
            .as_deref()
            .and_then(|target| resolver.resolve(target, source_dir));

        let order = converted.len();
        match (url, children.is_empty()) {
            (Some(url), true) => converted.push(NavItem::link(item.title, url, order)),
            (url, false) => converted.push(NavItem::section(
                item.title,
                url.unwrap_or_default(),
                children,
                order,
            )),
            (None, true) => {}
        }
    }
    converted
}

/// Navigation generated from the section tree below `root`.
pub fn auto_nav(site: &Site, children: &[PageId]) -> Vec<NavItem> {
    children
        .iter()
        .enumerate()
        .map(|(order, id)| {
            let page = site.page(*id);
            if page.kind == PageKind::Section {
                NavItem::section(
                    &page.title,
                    &page.permalink,
                    auto_nav(site, &page.children),
                    order,
                )
            } else {
                NavItem::link(&page.title, &page.permalink, order)
            }
        })
        .collect()
}

/// Navigation of one mount: its TOC document when configured and usable,
/// else the generated tree.
pub fn mount_nav(
    site: &Site,
    source_root: &Path,
    nav_path: Option<&Path>,
    resolver: &LinkResolver,
    root_children: &[PageId],
) -> Vec<NavItem> {
    if let Some(nav_path) = nav_path {
        let full = source_root.join(nav_path);
        let source_dir = nav_path
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        match load_nav(&full, &source_dir, resolver) {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => debug!(path = %full.display(), "navigation document is empty"),
            Err(error) => warn!(path = %full.display(), %error, "navigation document unusable"),
        }
    }
    auto_nav(site, root_children)
}

/// Wrap per-mount navigation into the site navigation.
pub fn combine(mut mounts: Vec<(String, String, Vec<NavItem>)>) -> Vec<NavItem> {
    if mounts.len() == 1 {
        return mounts.pop().map(|(_, _, items)| items).unwrap_or_default();
    }
    mounts
        .into_iter()
        .enumerate()
        .map(|(order, (title, url, items))| NavItem::section(title, url, items, order))
        .collect()
}
