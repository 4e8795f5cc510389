//! Docs mode: documentation mounts assembled into one site.
//!
//! Each mount is a source tree published under its own URL prefix. Every
//! directory becomes a section page, so empty intermediate directories still
//! get a listing. Mount roots are merged under a single home page and the
//! navigation is either read from a table-of-contents document or generated
//! from the section tree.

pub mod links;
pub mod nav;

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use arbor_core::{
    DocsConfig, FrontMatter, MenuReference, MountConfig, PageFile, content::is_content_file,
    humanize, parse_front_matter, slugify,
};
pub use links::{LinkResolver, PageLinks};
pub use nav::NavItem;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    build::BuildRequest,
    error::{IoResultExt, Result},
    menu::{assemble_menus, menus_from_config},
    scanner::{is_hidden, modified_time},
    site::{PageId, PageKind, PageNode, Site, permalink_for},
};

/// Rank of a directory index file name; lower wins.
fn index_rank(base_name: &str) -> Option<u8> {
    let name = base_name.to_ascii_lowercase();
    match name.as_str() {
        "_index" => Some(0),
        "index" => Some(1),
        "readme" => Some(2),
        _ => None,
    }
}

/// A markdown document found in a mount.
#[derive(Debug)]
struct DocFile {
    file: PageFile,
    front_matter: FrontMatter,
    body: String,
}

impl DocFile {
    fn relative_path(&self) -> String {
        self.file.relative_path()
    }

    /// Front matter title, ignoring blank ones.
    fn title(&self) -> Option<String> {
        self.front_matter
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Documents of one mount, split into directory indexes and leaves.
#[derive(Debug, Default)]
struct MountScan {
    indexes: BTreeMap<String, DocFile>,
    leaves: Vec<DocFile>,
    assets: usize,
    drafts: usize,
}

/// Walk a mount, copying non-markdown files to `out_dir` as they are found.
fn scan_mount(source_root: &Path, out_dir: &Path, include_drafts: bool) -> Result<MountScan> {
    let mut scan = MountScan::default();
    let mut ranked: BTreeMap<String, u8> = BTreeMap::new();

    for entry in WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        if !is_content_file(path) {
            let relative = path.strip_prefix(source_root).unwrap_or(path);
            let target = out_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).at(parent)?;
            }
            fs::copy(path, &target).at(&target)?;
            scan.assets += 1;
            continue;
        }

        let Some(file) = PageFile::new(path, source_root) else {
            continue;
        };
        let text = fs::read_to_string(path).at(path)?;
        let (front_matter, body) = parse_front_matter(&text, path);
        if front_matter.draft && !include_drafts {
            debug!(path = %path.display(), "skipping draft");
            scan.drafts += 1;
            continue;
        }

        let doc = DocFile {
            file,
            front_matter,
            body,
        };

        let Some(rank) = index_rank(&doc.file.base_name) else {
            scan.leaves.push(doc);
            continue;
        };
        let dir = doc.file.dir.clone();
        match ranked.get(&dir) {
            Some(best) if *best <= rank => scan.leaves.push(doc),
            _ => {
                ranked.insert(dir.clone(), rank);
                if let Some(displaced) = scan.indexes.insert(dir, doc) {
                    scan.leaves.push(displaced);
                }
            }
        }
    }

    Ok(scan)
}

/// Section type: explicit, else the section, else `page`.
fn effective_type(explicit: Option<&str>, section: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if section.is_empty() {
                "page".to_string()
            } else {
                section.to_string()
            }
        })
}

fn page_from_doc(doc: &DocFile, kind: PageKind, title: String, permalink: String, mount: usize) -> Result<PageNode> {
    let front_matter = &doc.front_matter;
    let mut node = PageNode::new(kind, title, permalink);
    node.section = node
        .permalink
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    node.content_type = effective_type(front_matter.content_type.as_deref(), &node.section);
    node.date = front_matter.date;
    node.lastmod = Some(modified_time(&doc.file.path)?);
    node.description = front_matter.description.clone();
    node.params = front_matter.params.clone();
    node.layout = front_matter.layout.clone();
    node.weight = front_matter.weight;
    node.draft = front_matter.draft;
    node.tags = front_matter.tags.clone();
    node.categories = front_matter.categories.clone();
    node.source = Some(doc.file.path.clone());
    node.source_dir = doc.file.dir.clone();
    node.mount = Some(mount);
    Ok(node)
}

fn parent_dir(dir: &str) -> Option<&str> {
    if dir.is_empty() {
        return None;
    }
    Some(dir.rsplit_once('/').map(|(parent, _)| parent).unwrap_or_default())
}

fn depth(dir: &str) -> usize {
    if dir.is_empty() {
        0
    } else {
        dir.split('/').count()
    }
}

/// Result of assembling one mount.
#[derive(Debug)]
struct MountTree {
    /// Root section, absent for mounts published at `/`.
    root: Option<PageId>,
    /// Children of the mount root.
    root_children: Vec<PageId>,
    /// Root index, when the mount has one.
    root_index: Option<DocFile>,
    title: String,
    url: String,
    resolver: LinkResolver,
    registrations: Vec<(PageId, Vec<MenuReference>)>,
}

fn assemble_mount(
    site: &mut Site,
    index: usize,
    mount: &MountConfig,
    mut scan: MountScan,
    strict_links: bool,
) -> Result<MountTree> {
    let prefix = mount.prefix_segments();
    let mut resolver = LinkResolver::new(mount, strict_links);
    let mut registrations = Vec::new();

    // Leaves, grouped by directory.
    let mut leaves_by_dir: BTreeMap<String, Vec<PageId>> = BTreeMap::new();
    for doc in &scan.leaves {
        let slug = doc
            .front_matter
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slugify(&doc.file.base_name));

        let mut segments = prefix.clone();
        segments.extend(doc.file.dir_segments().into_iter().map(str::to_string));
        segments.push(slug.clone());
        let permalink = permalink_for(&segments);
        resolver.insert_route(&doc.relative_path(), &permalink);

        let title = doc.title().unwrap_or_else(|| humanize(&slug));
        let mut node = page_from_doc(doc, PageKind::Page, title, permalink, index)?;
        node.slug = slug;
        node.raw_body = Some(doc.body.clone());
        let id = site.add_page(node);

        if !doc.front_matter.menus.is_empty() {
            registrations.push((id, doc.front_matter.menus.clone()));
        }
        leaves_by_dir.entry(doc.file.dir.clone()).or_default().push(id);
    }

    // Every directory with an index or a leaf, plus all ancestors.
    let mut directories: BTreeSet<String> = BTreeSet::new();
    directories.insert(String::new());
    for dir in scan.indexes.keys().chain(leaves_by_dir.keys()) {
        let mut current = Some(dir.as_str());
        while let Some(dir) = current {
            if !directories.insert(dir.to_string()) {
                break;
            }
            current = parent_dir(dir);
        }
    }

    // Deepest first, so nested sections exist before their parents.
    let mut ordered: Vec<String> = directories.into_iter().collect();
    ordered.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

    let mut sections: BTreeMap<String, PageId> = BTreeMap::new();
    let mut root = None;
    let mut root_children = Vec::new();
    let root_title = scan
        .indexes
        .get("")
        .and_then(DocFile::title)
        .unwrap_or_else(|| humanize(&mount.name));

    for dir in &ordered {
        let mut leaves = leaves_by_dir.remove(dir).unwrap_or_default();
        leaves.sort_by(|a, b| site.page(*a).title.cmp(&site.page(*b).title));

        // BTreeMap order gives nested sections sorted by name.
        let nested: Vec<PageId> = sections
            .iter()
            .filter(|(child, _)| parent_dir(child) == Some(dir.as_str()))
            .map(|(_, id)| *id)
            .collect();

        let mut children = leaves;
        children.extend(nested);

        let mut segments = prefix.clone();
        segments.extend(dir.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        let permalink = permalink_for(&segments);

        if dir.is_empty() && prefix.is_empty() {
            // Published at `/`: the home page takes the root's place.
            if let Some(doc) = scan.indexes.get("") {
                resolver.insert_route(&doc.relative_path(), "/");
            }
            root_children = children;
            continue;
        }

        let index_doc = scan.indexes.get(dir);
        let menus = index_doc
            .map(|doc| doc.front_matter.menus.clone())
            .unwrap_or_default();
        let title = if dir.is_empty() {
            root_title.clone()
        } else {
            index_doc
                .and_then(DocFile::title)
                .unwrap_or_else(|| humanize(dir.rsplit('/').next().unwrap_or_default()))
        };

        let mut node = match index_doc {
            Some(doc) => {
                resolver.insert_route(&doc.relative_path(), &permalink);
                let mut node = page_from_doc(doc, PageKind::Section, title, permalink, index)?;
                let body = doc.body.trim();
                node.raw_body = (!body.is_empty()).then(|| doc.body.clone());
                node
            }
            None => {
                let mut node = PageNode::new(PageKind::Section, title, permalink);
                node.section = segments.first().cloned().unwrap_or_default();
                node.content_type = effective_type(None, &node.section);
                node.source_dir = dir.clone();
                node.mount = Some(index);
                node
            }
        };
        node.slug = segments.last().cloned().unwrap_or_default();
        node.children = children;
        let id = site.add_page(node);
        if !menus.is_empty() {
            registrations.push((id, menus));
        }
        debug!(mount = %mount.name, dir = %dir, children = site.page(id).children.len(), "docs section");

        if dir.is_empty() {
            root_children = site.page(id).children.clone();
            root = Some(id);
        } else {
            sections.insert(dir.clone(), id);
        }
    }

    let url = permalink_for(&prefix);
    Ok(MountTree {
        root,
        root_children,
        root_index: scan.indexes.remove(""),
        title: root_title,
        url,
        resolver,
        registrations,
    })
}

/// Build the site graph for docs mode.
///
/// Mount configuration is validated before anything is written.
pub fn build_docs_site(request: &BuildRequest, docs: &DocsConfig) -> Result<Site> {
    docs.validate(&request.site_dir)?;

    let mut site = Site::new(request.config.clone());
    site.menus = menus_from_config(&request.config);

    let mut home_node = PageNode::new(PageKind::Home, docs.site_name.clone(), "/");
    home_node.content_type = "home".to_string();
    home_node.description = request.config.site.description.clone().unwrap_or_default();
    let home = site.add_page(home_node);

    let mut home_children = Vec::new();
    let mut mount_navs = Vec::new();
    let mut registrations = Vec::new();
    let mut home_source: Option<(usize, DocFile)> = None;

    for (index, mount) in docs.mounts.iter().enumerate() {
        let source_root = request.site_dir.join(&mount.source_dir);
        let out_dir = mount
            .prefix_segments()
            .iter()
            .fold(request.destination.clone(), |dir, segment| dir.join(segment));

        let scan = scan_mount(&source_root, &out_dir, request.include_drafts)?;
        info!(
            mount = %mount.name,
            documents = scan.leaves.len() + scan.indexes.len(),
            assets = scan.assets,
            drafts = scan.drafts,
            "mount scanned"
        );

        let mut tree = assemble_mount(&mut site, index, mount, scan, docs.strict_links)?;

        match tree.root {
            Some(root) => home_children.push(root),
            None => home_children.extend(tree.root_children.iter().copied()),
        }

        let items = nav::mount_nav(
            &site,
            &source_root,
            mount.nav_path.as_deref(),
            &tree.resolver,
            &tree.root_children,
        );
        mount_navs.push((tree.title.clone(), tree.url.clone(), items));
        registrations.append(&mut tree.registrations);

        let is_home_mount = docs.home_mount.as_deref() == Some(mount.name.as_str());
        let is_root_mount = tree.root.is_none() && docs.home_mount.is_none();
        if let Some(doc) = tree.root_index.take()
            && (is_home_mount || (is_root_mount && home_source.is_none()))
        {
            home_source = Some((index, doc));
        }

        info!(
            mount = %mount.name,
            routes = tree.resolver.route_count(),
            "mount assembled"
        );
        site.link_resolvers.push(tree.resolver);
    }

    if let Some((mount, doc)) = home_source {
        let page = site.page_mut(home);
        if docs.home_mount.is_some()
            && let Some(title) = doc.title()
        {
            page.title = title;
        }
        if !doc.front_matter.description.is_empty() {
            page.description = doc.front_matter.description.clone();
        }
        page.params = doc.front_matter.params.clone();
        page.source = Some(doc.file.path.clone());
        page.mount = Some(mount);
        page.raw_body = (!doc.body.trim().is_empty()).then_some(doc.body);
    }

    site.page_mut(home).children = home_children;
    site.link_tree(home);

    assemble_menus(&mut site, &registrations);
    site.nav = nav::combine(mount_navs);

    info!(pages = site.len(), mounts = docs.mounts.len(), "docs site assembled");
    Ok(site)
}

/// Breadcrumb trail of a page: its ancestors then the page itself.
pub fn breadcrumbs(site: &Site, id: PageId) -> Vec<(String, String)> {
    let page = site.page(id);
    page.ancestors
        .iter()
        .map(|ancestor| site.page(*ancestor))
        .chain(std::iter::once(page))
        .map(|p| (p.title.clone(), p.permalink.clone()))
        .collect()
}
