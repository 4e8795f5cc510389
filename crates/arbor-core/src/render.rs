//! Interface to the markdown renderer.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

/// Output of rendering one page body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedContent {
    /// Full HTML.
    pub html: String,

    /// Summary HTML (up to `<!--more-->`, else the first paragraph).
    pub summary: String,

    /// Headings in document order.
    pub toc: Vec<TocEntry>,

    /// Text with markup removed.
    pub plain_text: String,
}

/// Rewrites link destinations found in a page body.
pub trait LinkRewriter {
    /// Return the replacement target, or `None` to keep the original.
    fn rewrite(&self, target: &str) -> Option<String>;
}

/// Page-level information available while rendering a body.
pub struct RenderContext<'a> {
    /// Permalink of the page being rendered, used in diagnostics.
    pub permalink: &'a str,

    /// Optional link rewriting for the body.
    pub links: Option<&'a dyn LinkRewriter>,
}

impl<'a> RenderContext<'a> {
    /// Context without link rewriting.
    pub fn new(permalink: &'a str) -> Self {
        Self {
            permalink,
            links: None,
        }
    }

    /// Attach a link rewriter.
    #[must_use]
    pub fn with_links(mut self, links: &'a dyn LinkRewriter) -> Self {
        self.links = Some(links);
        self
    }
}

/// Converts a markdown body into HTML and derived text.
pub trait ContentRenderer {
    /// Render a page body.
    fn render(&self, body: &str, ctx: &RenderContext<'_>) -> Result<RenderedContent>;
}
