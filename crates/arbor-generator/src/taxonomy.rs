//! Taxonomy indexing: term pages and taxonomy roots for tags and categories.

use std::collections::BTreeMap;

use arbor_core::{humanize, slugify};
use serde_json::Value;
use tracing::{debug, info};

use crate::site::{PageId, PageKind, PageNode, Site, permalink_for};

/// Taxonomy name and how to read its terms from a page.
pub type TaxonomyDef = (&'static str, fn(&PageNode) -> &[String]);

/// The taxonomies every site has.
pub const TAXONOMIES: [TaxonomyDef; 2] = [("tags", tags_of), ("categories", categories_of)];

fn tags_of(page: &PageNode) -> &[String] {
    &page.tags
}

fn categories_of(page: &PageNode) -> &[String] {
    &page.categories
}

/// A term with its member pages in site order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub slug: String,
    pub title: String,
    pub pages: Vec<PageId>,
}

/// Group the site's regular pages by term slug.
///
/// Terms are trimmed and slugified; empty slugs are skipped. Member order
/// follows the arena order of regular pages.
pub fn collect_terms(site: &Site, terms_of: fn(&PageNode) -> &[String]) -> BTreeMap<String, Term> {
    let mut terms: BTreeMap<String, Term> = BTreeMap::new();

    for (id, page) in site.regular_pages() {
        for raw in terms_of(page) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let slug = slugify(raw);
            if slug.is_empty() {
                debug!(term = raw, "skipping term with empty slug");
                continue;
            }
            let term = terms.entry(slug.clone()).or_insert_with(|| Term {
                slug,
                title: raw.to_string(),
                pages: Vec::new(),
            });
            if !term.pages.contains(&id) {
                term.pages.push(id);
            }
        }
    }

    terms
}

/// Add term pages and taxonomy roots for every taxonomy with terms.
///
/// Returns the ids of the taxonomy roots.
pub fn index_taxonomies(site: &mut Site) -> Vec<PageId> {
    let home = site.home();
    let mut roots = Vec::new();

    for (name, terms_of) in TAXONOMIES {
        let terms = collect_terms(site, terms_of);
        if terms.is_empty() {
            continue;
        }

        let mut root = PageNode::new(PageKind::Taxonomy, humanize(name), permalink_for(&[name]));
        root.section = name.to_string();
        root.content_type = name.to_string();
        root.slug = name.to_string();
        root.params
            .insert("taxonomy".to_string(), Value::String(name.to_string()));
        root.parent = home;
        let root_id = site.add_page(root);

        // BTreeMap iteration gives ordinal slug order.
        let mut term_ids = Vec::with_capacity(terms.len());
        for term in terms.into_values() {
            let mut node = PageNode::new(
                PageKind::Term,
                term.title,
                permalink_for(&[name, term.slug.as_str()]),
            );
            node.section = name.to_string();
            node.content_type = name.to_string();
            node.params
                .insert("term".to_string(), Value::String(term.slug.clone()));
            node.params
                .insert("taxonomy".to_string(), Value::String(name.to_string()));
            node.slug = term.slug;
            node.children = term.pages;
            node.parent = Some(root_id);
            term_ids.push(site.add_page(node));
        }

        info!(taxonomy = name, terms = term_ids.len(), "taxonomy indexed");
        site.page_mut(root_id).children = term_ids;
        roots.push(root_id);
    }

    roots
}
