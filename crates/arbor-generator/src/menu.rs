//! Menu assembly.
//!
//! Menus are flat lists of entries related by `(identifier, parent)`.
//! The tree is derived on demand with [`Menu::tree`].

use std::collections::{BTreeMap, HashMap};

use arbor_core::{Config, Params, config::MenuEntryConfig};
use tracing::{debug, info};

use crate::site::{PageId, PageKind, Site};

/// Menus by name.
pub type Menus = BTreeMap<String, Menu>;

/// A single menu entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuEntry {
    pub name: String,
    pub url: String,
    pub page_ref: Option<String>,
    pub title: String,
    pub weight: i32,
    pub parent: Option<String>,
    pub identifier: String,
    pub pre: String,
    pub post: String,
    pub menu: String,
    pub params: Params,

    /// Page the entry points at, set at most once.
    pub page: Option<PageId>,
}

impl MenuEntry {
    fn from_config(menu: &str, config: &MenuEntryConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            page_ref: config.page_ref.clone().filter(|r| !r.trim().is_empty()),
            title: config.title.clone(),
            weight: config.weight,
            parent: config.parent.clone().filter(|p| !p.is_empty()),
            identifier: config
                .identifier
                .clone()
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| config.name.clone()),
            pre: config.pre.clone(),
            post: config.post.clone(),
            menu: menu.to_string(),
            params: config.params.clone(),
            page: None,
        }
    }

    /// Point the entry at a page unless it already has one.
    fn attach(&mut self, id: PageId, permalink: &str, title: &str) -> bool {
        if self.page.is_some() {
            return false;
        }
        self.page = Some(id);
        if self.url.is_empty() {
            self.url = permalink.to_string();
        }
        if self.name.is_empty() {
            self.name = title.to_string();
        }
        true
    }
}

/// A named menu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    pub name: String,
    pub entries: Vec<MenuEntry>,
}

/// A derived tree node borrowing its entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuNode<'a> {
    pub entry: &'a MenuEntry,
    pub children: Vec<MenuNode<'a>>,
}

impl Menu {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Effective parent index of every entry.
    ///
    /// An entry whose parent identifier matches no other entry, names
    /// itself, or sits on a parent cycle is a root.
    pub fn parent_indices(&self) -> Vec<Option<usize>> {
        let mut by_identifier: HashMap<&str, usize> = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            by_identifier.entry(entry.identifier.as_str()).or_insert(i);
        }

        let mut parents: Vec<Option<usize>> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .parent
                    .as_deref()
                    .and_then(|p| by_identifier.get(p).copied())
                    .filter(|&p| p != i)
            })
            .collect();

        let on_cycle: Vec<bool> = (0..parents.len())
            .map(|start| {
                let mut current = parents[start];
                for _ in 0..parents.len() {
                    match current {
                        Some(p) if p == start => return true,
                        Some(p) => current = parents[p],
                        None => return false,
                    }
                }
                false
            })
            .collect();

        for (i, cycle) in on_cycle.into_iter().enumerate() {
            if cycle {
                debug!(menu = %self.name, identifier = %self.entries[i].identifier, "menu parent cycle");
                parents[i] = None;
            }
        }
        parents
    }

    /// Derive the entry tree, siblings ordered by weight then name.
    pub fn tree(&self) -> Vec<MenuNode<'_>> {
        let parents = self.parent_indices();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.entries.len()];
        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }
        self.nodes(&roots, &children)
    }

    fn nodes(&self, indices: &[usize], children: &[Vec<usize>]) -> Vec<MenuNode<'_>> {
        let mut sorted = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            let (a, b) = (&self.entries[a], &self.entries[b]);
            a.weight.cmp(&b.weight).then_with(|| a.name.cmp(&b.name))
        });
        sorted
            .into_iter()
            .map(|i| MenuNode {
                entry: &self.entries[i],
                children: self.nodes(&children[i], children),
            })
            .collect()
    }
}

/// Menus declared in the site configuration.
pub fn menus_from_config(config: &Config) -> Menus {
    config
        .menus
        .iter()
        .map(|(name, entries)| {
            let menu = Menu {
                name: name.clone(),
                entries: entries
                    .iter()
                    .map(|e| MenuEntry::from_config(name, e))
                    .collect(),
            };
            (name.clone(), menu)
        })
        .collect()
}

/// Merge front matter menu registrations of every page into the site
/// menus, then resolve `page_ref`s.
pub fn assemble_menus(site: &mut Site, registrations: &[(PageId, Vec<arbor_core::MenuReference>)]) {
    let mut menus = std::mem::take(&mut site.menus);

    for (id, references) in registrations {
        let page = site.page(*id);
        for reference in references {
            let mut entry = MenuEntry {
                name: reference
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| page.title.clone()),
                url: page.permalink.clone(),
                page_ref: None,
                title: String::new(),
                weight: if reference.weight != 0 {
                    reference.weight
                } else {
                    page.weight
                },
                parent: reference.parent.clone().filter(|p| !p.is_empty()),
                identifier: reference
                    .identifier
                    .clone()
                    .filter(|i| !i.is_empty())
                    .unwrap_or_else(|| page.permalink.clone()),
                pre: reference.pre.clone(),
                post: reference.post.clone(),
                menu: reference.menu.clone(),
                params: reference.params.clone(),
                page: None,
            };
            entry.attach(*id, &page.permalink, &page.title);
            menus
                .entry(reference.menu.clone())
                .or_insert_with(|| Menu::new(reference.menu.clone()))
                .entries
                .push(entry);
        }
    }

    let resolved = resolve_page_refs(&mut menus, site);
    info!(
        menus = menus.len(),
        entries = menus.values().map(|m| m.entries.len()).sum::<usize>(),
        resolved,
        "menus assembled"
    );
    site.menus = menus;
}

/// Normalize a page reference or permalink for matching.
pub fn normalize_ref(target: &str) -> String {
    target.trim().trim_matches('/').to_lowercase()
}

/// Resolve `page_ref` of every entry still lacking a page.
///
/// Matches the normalized target against permalinks, then slugs, then
/// `section/slug`. Regular pages take a slug before sections do. Returns
/// the number of entries resolved.
pub fn resolve_page_refs(menus: &mut Menus, site: &Site) -> usize {
    let mut by_permalink: HashMap<String, PageId> = HashMap::new();
    let mut by_slug: HashMap<String, PageId> = HashMap::new();
    let mut by_section_slug: HashMap<String, PageId> = HashMap::new();

    for (id, page) in site.pages() {
        by_permalink.entry(normalize_ref(&page.permalink)).or_insert(id);
        if page.is_regular() && !page.slug.is_empty() {
            by_slug.entry(page.slug.to_lowercase()).or_insert(id);
            if !page.section.is_empty() {
                by_section_slug
                    .entry(format!("{}/{}", page.section, page.slug).to_lowercase())
                    .or_insert(id);
            }
        }
    }
    for (id, page) in site.pages().filter(|(_, page)| page.kind == PageKind::Section) {
        let slug = if page.slug.is_empty() {
            page.last_segment()
        } else {
            page.slug.as_str()
        };
        if !slug.is_empty() {
            by_slug.entry(slug.to_lowercase()).or_insert(id);
        }
    }

    let mut resolved = 0;
    for entry in menus.values_mut().flat_map(|m| m.entries.iter_mut()) {
        if entry.page.is_some() {
            continue;
        }
        let Some(target) = entry.page_ref.as_deref().map(normalize_ref) else {
            continue;
        };
        let found = by_permalink
            .get(&target)
            .or_else(|| by_slug.get(&target))
            .or_else(|| by_section_slug.get(&target))
            .copied();

        match found {
            Some(id) => {
                let page = site.page(id);
                if entry.attach(id, &page.permalink, &page.title) {
                    resolved += 1;
                }
            }
            None => debug!(menu = %entry.menu, page_ref = %target, "unresolved menu page reference"),
        }
    }
    resolved
}
