//! RSS feed generation.
//!
//! Generates an RSS 2.0 feed of the newest regular pages.

use chrono::Utc;
use rss::{Category, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::debug;

use crate::site::{PageNode, Site};

/// RSS feed generator.
#[derive(Debug)]
pub struct RssGenerator<'a> {
    site: &'a Site,
}

impl<'a> RssGenerator<'a> {
    #[must_use]
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Regular pages newest first, undated pages last, capped at `rss.limit`.
    pub fn feed_pages(&self) -> Vec<&'a PageNode> {
        let mut pages: Vec<&PageNode> = self.site.regular_pages().map(|(_, p)| p).collect();
        pages.sort_by(|a, b| b.date.cmp(&a.date));
        pages.truncate(self.site.config.rss.limit);
        pages
    }

    /// Generate the feed XML.
    pub fn generate(&self) -> String {
        let config = &self.site.config;
        let pages = self.feed_pages();
        debug!(count = pages.len(), limit = config.rss.limit, "generating RSS feed");

        let items: Vec<Item> = pages.iter().map(|page| self.page_to_item(page)).collect();

        let channel = ChannelBuilder::default()
            .title(&config.site.title)
            .link(config.url_for("/"))
            .description(
                config
                    .site
                    .description
                    .as_deref()
                    .unwrap_or(&config.site.title),
            )
            .language(Some(config.site.language_code.clone()))
            .last_build_date(Some(Utc::now().to_rfc2822()))
            .items(items)
            .build();

        channel.to_string()
    }

    fn page_to_item(&self, page: &PageNode) -> Item {
        let url = self.site.config.url_for(&page.permalink);
        let guid = GuidBuilder::default().value(&url).permalink(true).build();

        let mut builder = ItemBuilder::default();
        builder.title(Some(page.title.clone()));
        builder.link(Some(url));
        builder.guid(Some(guid));

        if let Some(date) = page.date {
            builder.pub_date(Some(date.to_rfc2822()));
        }

        let summary = page
            .rendered
            .as_ref()
            .map(|r| r.summary.as_str())
            .filter(|s| !s.is_empty());
        if !page.description.is_empty() {
            builder.description(Some(page.description.clone()));
        } else if let Some(summary) = summary {
            builder.description(Some(summary.to_string()));
        }

        if let Some(author) = &self.site.config.site.author {
            builder.author(Some(author.clone()));
        }

        let categories: Vec<Category> = page
            .tags
            .iter()
            .chain(&page.categories)
            .map(|name| Category {
                name: name.clone(),
                domain: None,
            })
            .collect();
        if !categories.is_empty() {
            builder.categories(categories);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use arbor_core::Config;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::site::PageKind;

    fn test_site(limit: usize) -> Site {
        let config = Config::from_toml_str(&format!(
            r#"
[site]
title = "Test Blog"
base_url = "https://example.com"
description = "A test blog"
author = "Test Author"

[rss]
limit = {limit}
"#
        ))
        .expect("config");
        let mut site = Site::new(config);
        site.add_page(PageNode::new(PageKind::Home, "Home", "/"));

        let mut older = PageNode::new(PageKind::Page, "First Post", "/posts/first-post");
        older.date = Some(Utc::now() - Duration::days(2));
        older.tags = vec!["rust".to_string()];
        site.add_page(older);

        let mut newer = PageNode::new(PageKind::Page, "Second Post", "/posts/second-post");
        newer.date = Some(Utc::now());
        newer.description = "Newest".to_string();
        site.add_page(newer);
        site
    }

    #[test]
    fn test_generate_rss() {
        let site = test_site(20);
        let xml = RssGenerator::new(&site).generate();

        assert!(xml.contains("<title>Test Blog</title>"));
        assert!(xml.contains("https://example.com/posts/first-post"));
        assert!(xml.contains("Second Post"));
        assert!(xml.contains("<category>rust</category>"));
        assert!(!xml.contains("<title>Home</title>"));
    }

    #[test]
    fn test_rss_limit_keeps_newest() {
        let site = test_site(1);
        let generator = RssGenerator::new(&site);
        let pages = generator.feed_pages();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Second Post");
        assert!(!generator.generate().contains("First Post"));
    }

    #[test]
    fn test_page_to_item() {
        let site = test_site(20);
        let generator = RssGenerator::new(&site);
        let page = site.page(site.find_by_permalink("/posts/second-post").expect("page"));

        let item = generator.page_to_item(page);
        assert_eq!(item.title(), Some("Second Post"));
        assert_eq!(item.description(), Some("Newest"));
        assert!(item.pub_date().is_some());
    }
}
