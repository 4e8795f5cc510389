//! The site graph.
//!
//! Pages live in a flat arena and refer to each other by [`PageId`]:
//! parents, ancestors and children are indices, never owning references.
//! The [`Site`] owns the arena, the menus and (in docs mode) the navigation.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use arbor_core::{Config, ContentRecord, Params, RenderedContent};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{docs::LinkResolver, docs::NavItem, menu::Menus};

/// Index of a page in the site arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub usize);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a page node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Home,
    Section,
    Page,
    Term,
    Taxonomy,
}

impl PageKind {
    /// Name used in templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Section => "section",
            Self::Page => "page",
            Self::Term => "term",
            Self::Taxonomy => "taxonomy",
        }
    }

    /// Whether the page lists other pages.
    pub fn is_list(&self) -> bool {
        !matches!(self, Self::Page)
    }
}

/// A node of the site graph.
#[derive(Debug, Clone)]
pub struct PageNode {
    pub kind: PageKind,
    pub title: String,
    pub section: String,
    pub content_type: String,
    pub slug: String,

    /// Site-relative URL, always starting with `/`.
    pub permalink: String,

    /// Output file relative to the destination root.
    pub output_path: PathBuf,

    pub date: Option<DateTime<Utc>>,
    pub lastmod: Option<DateTime<Utc>>,
    pub description: String,
    pub params: Params,
    pub language: String,
    pub layout: Option<String>,
    pub weight: i32,
    pub draft: bool,
    pub tags: Vec<String>,
    pub categories: Vec<String>,

    /// Source file, if the page has one.
    pub source: Option<PathBuf>,

    /// Directory of the source relative to its content root, used to
    /// resolve relative links.
    pub source_dir: String,

    /// Markdown body. `None` skips rendering.
    pub raw_body: Option<String>,

    /// Docs mount the page belongs to.
    pub mount: Option<usize>,

    pub parent: Option<PageId>,
    pub ancestors: Vec<PageId>,
    pub children: Vec<PageId>,

    /// Filled by the renderer.
    pub rendered: Option<RenderedContent>,
}

impl PageNode {
    /// Empty node of the given kind.
    pub fn new(kind: PageKind, title: impl Into<String>, permalink: impl Into<String>) -> Self {
        let permalink = normalize_permalink(&permalink.into());
        let output_path = output_path_for(&permalink);
        Self {
            kind,
            title: title.into(),
            section: String::new(),
            content_type: String::new(),
            slug: String::new(),
            permalink,
            output_path,
            date: None,
            lastmod: None,
            description: String::new(),
            params: Params::new(),
            language: String::new(),
            layout: None,
            weight: 0,
            draft: false,
            tags: Vec::new(),
            categories: Vec::new(),
            source: None,
            source_dir: String::new(),
            raw_body: None,
            mount: None,
            parent: None,
            ancestors: Vec::new(),
            children: Vec::new(),
            rendered: None,
        }
    }

    /// Regular page built from a routed record.
    pub fn from_record(record: &ContentRecord) -> Self {
        Self {
            kind: PageKind::Page,
            title: record.title.clone(),
            section: record.section.clone(),
            content_type: record.content_type.clone(),
            slug: record.slug.clone(),
            permalink: record.permalink.clone(),
            output_path: record.output_path.clone(),
            date: Some(record.date),
            lastmod: Some(record.lastmod),
            description: record.description.clone(),
            params: record.params.clone(),
            language: String::new(),
            layout: record.layout.clone(),
            weight: record.weight,
            draft: record.draft,
            tags: record.tags.clone(),
            categories: record.categories.clone(),
            source: Some(record.file.path.clone()),
            source_dir: record.file.dir.clone(),
            raw_body: Some(record.raw_body.clone()),
            mount: None,
            parent: None,
            ancestors: Vec::new(),
            children: Vec::new(),
            rendered: None,
        }
    }

    /// Whether this is a regular content page.
    pub fn is_regular(&self) -> bool {
        self.kind == PageKind::Page
    }

    /// Last path segment of the permalink, empty at the root.
    pub fn last_segment(&self) -> &str {
        self.permalink.rsplit('/').next().unwrap_or_default()
    }
}

/// A non-content file to copy next to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResource {
    /// Absolute source path.
    pub source: PathBuf,

    /// Destination relative to the output root.
    pub output_path: PathBuf,
}

/// Top-level aggregate of one build.
#[derive(Debug)]
pub struct Site {
    pub config: Config,
    pub languages: Vec<String>,
    pub menus: Menus,
    pub resources: Vec<BundleResource>,

    /// Docs navigation tree; empty outside docs mode.
    pub nav: Vec<NavItem>,

    /// Per-mount link resolvers; empty outside docs mode.
    pub link_resolvers: Vec<LinkResolver>,

    pages: Vec<PageNode>,
    home: Option<PageId>,
    outputs: HashMap<PathBuf, PageId>,
}

impl Site {
    /// Empty site for a configuration.
    pub fn new(config: Config) -> Self {
        let languages = config.all_languages();
        Self {
            config,
            languages,
            menus: Menus::new(),
            resources: Vec::new(),
            nav: Vec::new(),
            link_resolvers: Vec::new(),
            pages: Vec::new(),
            home: None,
            outputs: HashMap::new(),
        }
    }

    /// Add a page to the arena.
    ///
    /// Two pages writing the same output file are allowed; the later one
    /// wins when rendering.
    pub fn add_page(&mut self, mut page: PageNode) -> PageId {
        let id = PageId(self.pages.len());
        if page.language.is_empty() {
            page.language = self.config.site.language_code.clone();
        }
        if let Some(previous) = self.outputs.insert(page.output_path.clone(), id) {
            warn!(
                output = %page.output_path.display(),
                first = %self.describe(previous),
                second = %describe_page(&page),
                "output path collision, last write wins"
            );
        }
        if page.kind == PageKind::Home {
            self.home = Some(id);
        }
        self.pages.push(page);
        id
    }

    pub fn page(&self, id: PageId) -> &PageNode {
        &self.pages[id.0]
    }

    pub fn page_mut(&mut self, id: PageId) -> &mut PageNode {
        &mut self.pages[id.0]
    }

    /// Pages in arena order.
    pub fn pages(&self) -> impl Iterator<Item = (PageId, &PageNode)> {
        self.pages.iter().enumerate().map(|(i, p)| (PageId(i), p))
    }

    /// Regular pages in arena order (date-sorted in content mode).
    pub fn regular_pages(&self) -> impl Iterator<Item = (PageId, &PageNode)> {
        self.pages().filter(|(_, p)| p.is_regular())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn home(&self) -> Option<PageId> {
        self.home
    }

    /// Find a page by permalink.
    pub fn find_by_permalink(&self, permalink: &str) -> Option<PageId> {
        let wanted = normalize_permalink(permalink);
        self.pages()
            .find(|(_, p)| p.permalink == wanted)
            .map(|(id, _)| id)
    }

    /// Page that owns an output path: the last one added for it.
    pub fn find_by_output(&self, output: &Path) -> Option<PageId> {
        self.outputs.get(output).copied()
    }

    /// Child pages of a node.
    pub fn children(&self, id: PageId) -> impl Iterator<Item = &PageNode> {
        self.pages[id.0].children.iter().map(|c| &self.pages[c.0])
    }

    /// Count pages by kind.
    pub fn count(&self, kind: PageKind) -> usize {
        self.pages.iter().filter(|p| p.kind == kind).count()
    }

    /// Fill every page's `ancestors` from its parent chain, root first.
    ///
    /// A chain that loops back on itself is cut where it repeats.
    pub fn fill_ancestors(&mut self) {
        for index in 0..self.pages.len() {
            let mut chain = Vec::new();
            let mut current = self.pages[index].parent;
            while let Some(parent) = current {
                if parent.0 == index || chain.contains(&parent) {
                    break;
                }
                chain.push(parent);
                current = self.pages[parent.0].parent;
            }
            chain.reverse();
            self.pages[index].ancestors = chain;
        }
    }

    /// Assign `parent` and `ancestors` top-down from `root` along child links.
    ///
    /// Pages reachable twice keep the first assignment.
    pub fn link_tree(&mut self, root: PageId) {
        let mut visited = vec![false; self.pages.len()];
        let mut stack = vec![root];
        visited[root.0] = true;
        self.pages[root.0].parent = None;
        self.pages[root.0].ancestors.clear();

        while let Some(id) = stack.pop() {
            let mut lineage = self.pages[id.0].ancestors.clone();
            lineage.push(id);
            let children = self.pages[id.0].children.clone();
            for child in children.into_iter().rev() {
                if visited[child.0] {
                    continue;
                }
                visited[child.0] = true;
                let node = &mut self.pages[child.0];
                node.parent = Some(id);
                node.ancestors = lineage.clone();
                stack.push(child);
            }
        }
    }

    fn describe(&self, id: PageId) -> String {
        describe_page(&self.pages[id.0])
    }
}

fn describe_page(page: &PageNode) -> String {
    match &page.source {
        Some(source) => source.display().to_string(),
        None => format!("{} {}", page.kind.as_str(), page.permalink),
    }
}

/// Permalink for URL segments: `/` + segments joined, `/` at the root.
pub fn permalink_for<S: AsRef<str>>(segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Output file for a permalink: `<segments>/index.html`, `index.html` at the root.
pub fn output_path_for(permalink: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in permalink.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join("index.html")
}

/// Leading slash, no trailing slash (except the root).
pub fn normalize_permalink(permalink: &str) -> String {
    let trimmed = permalink.trim().trim_matches('/');
    format!("/{trimmed}")
}
