//! Page rendering and output writing.
//!
//! Rendering runs in two passes. The first turns every markdown body into
//! HTML and attaches it to its page; the second builds a template context
//! per page, interpolates the selected page and base templates and writes
//! the result to the page's output path.

use std::{fs, path::Path};

use arbor_core::{ContentRenderer, RenderContext, TocEntry, humanize, slugify};
use chrono::{Datelike, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    docs::{self, NavItem, PageLinks},
    error::{GeneratorError, IoResultExt, Result},
    menu::MenuNode,
    robots::RobotsGenerator,
    rss::RssGenerator,
    search::SearchIndex,
    site::{PageId, PageKind, PageNode, Site},
    sitemap::SitemapGenerator,
    template::{Lookup, Template, TemplateContext, TemplateSet},
};

/// Render every page body that has one.
///
/// Docs pages rewrite their links through their mount's resolver.
pub fn render_bodies(site: &mut Site, renderer: &dyn ContentRenderer) -> Result<usize> {
    let mut rendered = Vec::new();

    for (id, page) in site.pages() {
        let Some(body) = page.raw_body.as_deref() else {
            continue;
        };

        let links = page
            .mount
            .and_then(|mount| site.link_resolvers.get(mount))
            .map(|resolver| PageLinks::new(resolver, &page.source_dir));

        let mut ctx = RenderContext::new(&page.permalink);
        if let Some(links) = links.as_ref() {
            ctx = ctx.with_links(links);
        }

        rendered.push((id, renderer.render(body, &ctx)?));
    }

    let count = rendered.len();
    for (id, content) in rendered {
        site.page_mut(id).rendered = Some(content);
    }
    info!(count, "page bodies rendered");
    Ok(count)
}

/// Builds template contexts and writes HTML pages.
#[derive(Debug)]
pub struct SiteRenderer<'a> {
    site: &'a Site,
    templates: TemplateSet,
    dest: &'a Path,
}

impl<'a> SiteRenderer<'a> {
    #[must_use]
    pub fn new(site: &'a Site, templates: TemplateSet, dest: &'a Path) -> Self {
        Self {
            site,
            templates,
            dest,
        }
    }

    /// Render and write every page in arena order.
    pub fn write_pages(&mut self) -> Result<usize> {
        let site = self.site;
        let mut written = 0;
        for (id, page) in site.pages() {
            // Colliding pages: only the last one registered for a path is written.
            if site.find_by_output(&page.output_path) != Some(id) {
                debug!(permalink = %page.permalink, "output superseded, skipping");
                continue;
            }
            let html = self.render_page(id)?;
            let path = self.dest.join(&page.output_path);
            write_file(&path, &html)?;
            written += 1;
            debug!(permalink = %page.permalink, path = %path.display(), "wrote page");
        }
        info!(pages = written, "pages written");
        Ok(written)
    }

    /// Render one page through its page template and base template.
    pub fn render_page(&mut self, id: PageId) -> Result<String> {
        let site = self.site;
        let page = site.page(id);
        let lookup = Lookup {
            kind: page.kind,
            content_type: &page.content_type,
            section: &page.section,
            layout: page.layout.as_deref(),
        };

        let mut ctx = self.page_context(id);
        let inner = self.templates.page_template(&lookup)?;
        let inner_html = render_template(&inner, &ctx)?;

        ctx.insert("content", inner_html);
        let base = self
            .templates
            .base_template(&page.content_type, &page.section)?;
        render_template(&base, &ctx)
    }

    /// Template variables for a page.
    pub fn page_context(&self, id: PageId) -> TemplateContext {
        let site = self.site;
        let config = &site.config;
        let page = site.page(id);
        let rendered = page.rendered.as_ref();

        let description = if page.description.is_empty() {
            config.site.description.clone().unwrap_or_default()
        } else {
            page.description.clone()
        };

        let mut ctx = TemplateContext::new()
            .with_var("title", escape_html(&page.title))
            .with_var("content", rendered.map(|r| r.html.clone()).unwrap_or_default())
            .with_var(
                "summary",
                rendered.map(|r| r.summary.clone()).unwrap_or_default(),
            )
            .with_var("toc", rendered.map(|r| toc_html(&r.toc)).unwrap_or_default())
            .with_var("permalink", &page.permalink)
            .with_var("canonical_url", config.url_for(&page.permalink))
            .with_var("section", &page.section)
            .with_var("type", &page.content_type)
            .with_var("kind", page.kind.as_str())
            .with_var("description", escape_html(&description))
            .with_var("items", items_html(site, id))
            .with_var("site_title", escape_html(&config.site.title))
            .with_var("lang", &page.language)
            .with_var("year", Utc::now().year().to_string());

        if let Some(date) = page.date {
            ctx.insert("date", date.format("%Y-%m-%d").to_string());
            ctx.insert(
                "date_html",
                format!(
                    r#"<time datetime="{}">{}</time>"#,
                    date.format("%Y-%m-%d"),
                    date.format("%B %d, %Y")
                ),
            );
        }
        if let Some(lastmod) = page.lastmod {
            ctx.insert("lastmod", lastmod.format("%Y-%m-%d").to_string());
        }

        if !page.tags.is_empty() {
            ctx.insert("tags_html", tags_html(&page.tags));
        }

        if page.kind == PageKind::Term {
            let taxonomy = match page.params.get("taxonomy") {
                Some(Value::String(taxonomy)) => taxonomy.as_str(),
                _ => page.section.as_str(),
            };
            ctx.insert("taxonomy_title", escape_html(&humanize(taxonomy)));
        }

        for (key, value) in &page.params {
            let scalar = match value {
                Value::String(s) => escape_html(s),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            ctx.insert(format!("param_{key}"), scalar);
        }

        for (name, menu) in &site.menus {
            let tree = menu.tree();
            if !tree.is_empty() {
                ctx.insert(format!("menu_{name}"), menu_html(&tree, id, &page.permalink));
            }
        }

        if !site.nav.is_empty() {
            let mut nav = site.nav.clone();
            NavItem::mark_current(&mut nav, &page.permalink);
            ctx.insert("nav", nav_html(&nav));
        }

        if config.docs.is_some() && page.kind != PageKind::Home {
            ctx.insert("breadcrumbs", breadcrumbs_html(site, id));
        }

        ctx
    }
}

fn render_template(template: &Template, ctx: &TemplateContext) -> Result<String> {
    template
        .render(ctx)
        .map_err(|source| GeneratorError::Template {
            path: template.name().to_string(),
            source,
        })
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    fs::write(path, contents).at(path)
}

/// Write a file unless it already exists; returns whether it was written.
pub fn write_if_absent(path: &Path, contents: &str) -> Result<bool> {
    if path.exists() {
        debug!(path = %path.display(), "keeping existing file");
        return Ok(false);
    }
    write_file(path, contents)?;
    Ok(true)
}

/// Write sitemap.xml, index.xml, robots.txt and the docs search index.
///
/// Files that already exist in the destination are left alone.
pub fn write_site_files(site: &Site, dest: &Path) -> Result<()> {
    let config = &site.config;

    write_if_absent(&dest.join("sitemap.xml"), &SitemapGenerator::new(site).generate())?;

    if config.rss.enabled {
        write_if_absent(&dest.join("index.xml"), &RssGenerator::new(site).generate())?;
    }

    if let Some(robots) = RobotsGenerator::new(config).generate() {
        write_if_absent(&dest.join("robots.txt"), &robots)?;
    }

    if let Some(docs) = &config.docs
        && docs.search.enabled
    {
        SearchIndex::from_site(site).write_to_file(&dest.join(&docs.search.filename))?;
    }

    Ok(())
}

/// Minimal HTML escaping for text placed in markup.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// HTML for one entry of a listing.
pub fn list_item_html(page: &PageNode) -> String {
    let date_html = page
        .date
        .map(|d| {
            format!(
                r#"<time datetime="{}">{}</time>"#,
                d.format("%Y-%m-%d"),
                d.format("%Y-%m-%d")
            )
        })
        .unwrap_or_default();

    let description_html = if page.description.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="post-description">{}</p>"#,
            escape_html(&page.description)
        )
    };

    format!(
        r#"<li class="post-item">
    <div class="post-item-header">
        <a href="{}" class="post-title">{}</a>
        {}
    </div>
    {}
</li>"#,
        page.permalink,
        escape_html(&page.title),
        date_html,
        description_html
    )
}

fn term_item_html(term: &PageNode) -> String {
    format!(
        r#"<li class="term-item"><a href="{}">{}</a> <span class="count">{}</span></li>"#,
        term.permalink,
        escape_html(&term.title),
        term.children.len()
    )
}

fn items_html(site: &Site, id: PageId) -> String {
    let page = site.page(id);
    if !page.kind.is_list() {
        return String::new();
    }
    site.children(id)
        .map(|child| {
            if page.kind == PageKind::Taxonomy {
                term_item_html(child)
            } else {
                list_item_html(child)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn tags_html(tags: &[String]) -> String {
    let links = tags
        .iter()
        .filter_map(|tag| {
            let slug = slugify(tag);
            (!slug.is_empty()).then(|| {
                format!(
                    r#"<a href="/tags/{slug}" rel="tag">{}</a>"#,
                    escape_html(tag.trim())
                )
            })
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(r#"<div class="tags">{links}</div>"#)
}

fn toc_html(toc: &[TocEntry]) -> String {
    if toc.is_empty() {
        return String::new();
    }
    let items = toc
        .iter()
        .map(|entry| {
            format!(
                r##"<li class="toc-h{}"><a href="#{}">{}</a></li>"##,
                entry.level,
                entry.id,
                escape_html(&entry.text)
            )
        })
        .collect::<Vec<_>>()
        .join("");
    format!(r#"<ul class="toc">{items}</ul>"#)
}

fn menu_html(nodes: &[MenuNode<'_>], current: PageId, permalink: &str) -> String {
    let items = nodes
        .iter()
        .map(|node| {
            let entry = node.entry;
            let active = entry.page == Some(current) || (!entry.url.is_empty() && entry.url == permalink);
            let class = if active { r#" class="active""# } else { "" };
            let title = if entry.title.is_empty() {
                String::new()
            } else {
                format!(r#" title="{}""#, escape_html(&entry.title))
            };
            let children = if node.children.is_empty() {
                String::new()
            } else {
                menu_html(&node.children, current, permalink)
            };
            format!(
                r#"<li{class}>{}<a href="{}"{title}>{}</a>{}{children}</li>"#,
                entry.pre,
                entry.url,
                escape_html(&entry.name),
                entry.post
            )
        })
        .collect::<Vec<_>>()
        .join("");
    format!(r#"<ul class="menu">{items}</ul>"#)
}

fn nav_items_html(items: &[NavItem]) -> String {
    let items = items
        .iter()
        .map(|item| {
            let mut classes = Vec::new();
            if item.is_section {
                classes.push("section");
            }
            if item.is_current {
                classes.push("current");
            }
            let class = if classes.is_empty() {
                String::new()
            } else {
                format!(r#" class="{}""#, classes.join(" "))
            };
            let label = if item.url.is_empty() {
                format!("<span>{}</span>", escape_html(&item.title))
            } else {
                format!(r#"<a href="{}">{}</a>"#, item.url, escape_html(&item.title))
            };
            let children = if item.children.is_empty() {
                String::new()
            } else {
                nav_items_html(&item.children)
            };
            format!("<li{class}>{label}{children}</li>")
        })
        .collect::<Vec<_>>()
        .join("");
    format!("<ul>{items}</ul>")
}

fn nav_html(items: &[NavItem]) -> String {
    format!(r#"<nav class="docs-nav">{}</nav>"#, nav_items_html(items))
}

fn breadcrumbs_html(site: &Site, id: PageId) -> String {
    let trail = docs::breadcrumbs(site, id);
    let last = trail.len().saturating_sub(1);
    let parts = trail
        .iter()
        .enumerate()
        .map(|(i, (title, url))| {
            if i == last {
                format!(r#"<span aria-current="page">{}</span>"#, escape_html(title))
            } else {
                format!(r#"<a href="{url}">{}</a>"#, escape_html(title))
            }
        })
        .collect::<Vec<_>>()
        .join(" / ");
    format!(r#"<nav class="breadcrumbs">{parts}</nav>"#)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use arbor_core::{Config, RenderedContent};
    use arbor_parser::MarkdownRenderer;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        menu::{MenuEntry, menus_from_config},
        template::TemplateSelector,
    };

    fn config() -> Config {
        Config::from_toml_str(
            r#"
[site]
title = "Blog"
base_url = "https://example.com"

[[menus.main]]
name = "Posts"
url = "/posts"
weight = 1
"#,
        )
        .expect("config")
    }

    fn site() -> (Site, PageId, PageId, PageId) {
        let config = config();
        let menus = menus_from_config(&config);
        let mut site = Site::new(config);
        site.menus = menus;

        let home = site.add_page(PageNode::new(PageKind::Home, "Home", "/"));
        let mut section = PageNode::new(PageKind::Section, "Posts", "/posts");
        section.section = "posts".to_string();
        section.content_type = "posts".to_string();
        let section = site.add_page(section);

        let mut post = PageNode::new(PageKind::Page, "Hello <World>", "/posts/hello");
        post.section = "posts".to_string();
        post.content_type = "posts".to_string();
        post.tags = vec!["Go".to_string()];
        post.raw_body = Some("# Intro\n\nHello **there**.".to_string());
        let post = site.add_page(post);

        site.page_mut(home).children = vec![section];
        site.page_mut(section).children = vec![post];
        site.page_mut(section).parent = Some(home);
        site.page_mut(post).parent = Some(section);
        site.fill_ancestors();
        (site, home, section, post)
    }

    fn templates(dir: &Path) -> TemplateSet {
        TemplateSet::new(TemplateSelector::new(dir.join("layouts"), None))
    }

    #[test]
    fn test_render_bodies() {
        let (mut site, home, _, post) = site();
        let count = render_bodies(&mut site, &MarkdownRenderer::new()).unwrap();

        assert_eq!(count, 1);
        assert!(site.page(home).rendered.is_none());
        let rendered = site.page(post).rendered.as_ref().unwrap();
        assert!(rendered.html.contains("<strong>there</strong>"));
    }

    #[test]
    fn test_render_page_with_defaults() {
        let (mut site, _, section, post) = site();
        render_bodies(&mut site, &MarkdownRenderer::new()).unwrap();
        let dir = TempDir::new().unwrap();
        let mut renderer = SiteRenderer::new(&site, templates(dir.path()), dir.path());

        let html = renderer.render_page(post).unwrap();
        assert!(html.contains("<title>Hello &lt;World&gt; | Blog</title>"));
        assert!(html.contains("<strong>there</strong>"));
        assert!(html.contains(r#"<a href="/tags/go" rel="tag">Go</a>"#));
        assert!(!html.contains(r#"<li class="active"><a href="/posts">Posts</a></li>"#));
        assert!(html.contains(r#"<a href="/posts">Posts</a>"#));

        let list = renderer.render_page(section).unwrap();
        assert!(list.contains(r#"<a href="/posts/hello" class="post-title">"#));
        assert!(list.contains(r#"<li class="active"><a href="/posts">Posts</a></li>"#));
    }

    #[test]
    fn test_site_layout_overrides_default() {
        let (site, _, _, post) = site();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("layouts/posts")).unwrap();
        fs::write(
            dir.path().join("layouts/posts/single.html"),
            "<article>{{ title }} in {{ section }}</article>",
        )
        .unwrap();
        fs::write(dir.path().join("layouts/baseof.html"), "<body>{{ content }}</body>").unwrap();

        let mut renderer = SiteRenderer::new(&site, templates(dir.path()), dir.path());
        let html = renderer.render_page(post).unwrap();
        assert_eq!(html, "<body><article>Hello &lt;World&gt; in posts</article></body>");
    }

    #[test]
    fn test_missing_variable_names_template() {
        let (site, _, _, post) = site();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("layouts/_default")).unwrap();
        fs::write(dir.path().join("layouts/_default/single.html"), "{{ nope }}").unwrap();

        let mut renderer = SiteRenderer::new(&site, templates(dir.path()), dir.path());
        let err = renderer.render_page(post).unwrap_err();
        assert!(matches!(err, GeneratorError::Template { ref path, .. } if path.ends_with("single.html")));
    }

    #[test]
    fn test_write_pages_and_site_files() {
        let (mut site, _, _, _) = site();
        render_bodies(&mut site, &MarkdownRenderer::new()).unwrap();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("public");

        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("robots.txt"), "custom").unwrap();

        let written = SiteRenderer::new(&site, templates(dir.path()), &out)
            .write_pages()
            .unwrap();
        write_site_files(&site, &out).unwrap();

        assert_eq!(written, 3);
        assert!(out.join("index.html").exists());
        assert!(out.join("posts/index.html").exists());
        assert!(out.join("posts/hello/index.html").exists());
        assert!(out.join("sitemap.xml").exists());
        assert!(out.join("index.xml").exists());
        assert_eq!(fs::read_to_string(out.join("robots.txt")).unwrap(), "custom");
        assert!(!out.join("search-index.json").exists());
    }

    #[test]
    fn test_colliding_output_written_once_by_last_page() {
        let (mut site, _, _, _) = site();
        site.add_page(PageNode::new(PageKind::Page, "Replacement", "/posts/hello"));
        let dir = TempDir::new().unwrap();

        let written = SiteRenderer::new(&site, templates(dir.path()), dir.path())
            .write_pages()
            .unwrap();

        assert_eq!(written, 3);
        let html = fs::read_to_string(dir.path().join("posts/hello/index.html")).unwrap();
        assert!(html.contains("<h1>Replacement</h1>"));
    }

    #[test]
    fn test_params_and_menu_context() {
        let (mut site, _, _, post) = site();
        site.page_mut(post)
            .params
            .insert("author".to_string(), Value::String("Ann".to_string()));
        site.page_mut(post)
            .params
            .insert("list".to_string(), serde_json::json!([1, 2]));
        let entry = MenuEntry {
            name: "Hello".to_string(),
            identifier: "hello".to_string(),
            url: "/posts/hello".to_string(),
            page: Some(post),
            ..Default::default()
        };
        site.menus
            .entry("footer".to_string())
            .or_insert_with(|| crate::menu::Menu::new("footer"))
            .entries
            .push(entry);

        let dir = TempDir::new().unwrap();
        let renderer = SiteRenderer::new(&site, templates(dir.path()), dir.path());
        let ctx = renderer.page_context(post);

        assert_eq!(ctx.get("param_author"), Some("Ann"));
        assert!(ctx.get("param_list").is_none());
        assert_eq!(ctx.get("kind"), Some("page"));
        assert!(ctx.get("menu_footer").unwrap().contains(r#"<li class="active">"#));
        assert!(ctx.get("breadcrumbs").is_none());
    }

    #[test]
    fn test_toc_and_list_item_html() {
        let toc = vec![TocEntry {
            level: 2,
            text: "Setup".to_string(),
            id: "setup".to_string(),
        }];
        assert_eq!(
            toc_html(&toc),
            r##"<ul class="toc"><li class="toc-h2"><a href="#setup">Setup</a></li></ul>"##
        );
        assert!(toc_html(&[]).is_empty());

        let mut page = PageNode::new(PageKind::Page, "Post", "/posts/post");
        page.description = "About things".to_string();
        page.rendered = Some(RenderedContent::default());
        let html = list_item_html(&page);
        assert!(html.contains(r#"<a href="/posts/post" class="post-title">Post</a>"#));
        assert!(html.contains("About things"));
        assert_eq!(page.output_path, PathBuf::from("posts/post/index.html"));
    }

    #[test]
    fn test_write_if_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b.txt");
        assert!(write_if_absent(&path, "one").unwrap());
        assert!(!write_if_absent(&path, "two").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
    }
}
