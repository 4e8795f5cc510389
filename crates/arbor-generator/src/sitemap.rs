//! Sitemap generation.
//!
//! Generates `sitemap.xml` for search engine crawlers.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::site::{PageKind, PageNode, Site};

/// Change frequency for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFreq {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// A sitemap URL entry.
#[derive(Debug, Clone)]
pub struct SitemapUrl {
    /// URL location.
    pub loc: String,

    /// Last modification date.
    pub lastmod: Option<DateTime<Utc>>,

    pub changefreq: ChangeFreq,

    /// Priority (0.0 to 1.0).
    pub priority: f32,
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator<'a> {
    site: &'a Site,
}

impl<'a> SitemapGenerator<'a> {
    #[must_use]
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Generate sitemap XML for every page in the site.
    pub fn generate(&self) -> String {
        debug!(count = self.site.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for (_, page) in self.site.pages() {
            xml.push_str(&url_to_xml(&self.page_to_url(page)));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn page_to_url(&self, page: &PageNode) -> SitemapUrl {
        let loc = self.site.config.url_for(&page.permalink);
        let lastmod = page.lastmod.or(page.date);

        let (changefreq, priority) = match page.kind {
            PageKind::Home => (ChangeFreq::Daily, 1.0),
            PageKind::Section => (ChangeFreq::Weekly, 0.7),
            PageKind::Term | PageKind::Taxonomy => (ChangeFreq::Weekly, 0.4),
            PageKind::Page if page.date.is_some() => (ChangeFreq::Monthly, 0.8),
            PageKind::Page => (ChangeFreq::Yearly, 0.5),
        };

        SitemapUrl {
            loc,
            lastmod,
            changefreq,
            priority,
        }
    }
}

fn url_to_xml(url: &SitemapUrl) -> String {
    let mut xml = String::from("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));

    if let Some(lastmod) = &url.lastmod {
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            lastmod.format("%Y-%m-%d")
        ));
    }

    xml.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        url.changefreq.as_str()
    ));
    xml.push_str(&format!("    <priority>{:.1}</priority>\n", url.priority));
    xml.push_str("  </url>\n");
    xml
}

/// Escape special XML characters.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
