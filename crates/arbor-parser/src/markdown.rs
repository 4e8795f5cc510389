//! Markdown renderer using pulldown-cmark.

use std::collections::HashMap;

use arbor_core::{
    ContentRenderer, RenderContext, RenderedContent, Result, TocEntry, slugify,
};
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use tracing::debug;

/// Marker separating the summary from the rest of a body.
pub const SUMMARY_DIVIDER: &str = "<!--more-->";

/// Markdown renderer producing HTML, summary, TOC and plain text.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Render a body without any page context.
    pub fn render_body(&self, body: &str) -> RenderedContent {
        self.render_with(body, &RenderContext::new("/"))
    }

    fn render_with(&self, body: &str, ctx: &RenderContext<'_>) -> RenderedContent {
        let (events, toc, plain_text) = self.collect_events(body, ctx);

        let mut rendered = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut rendered, events.into_iter());

        let summary = match body.find(SUMMARY_DIVIDER) {
            Some(pos) => {
                let (events, _, _) = self.collect_events(&body[..pos], ctx);
                let mut summary = String::new();
                html::push_html(&mut summary, events.into_iter());
                summary
            }
            None => first_paragraph(&rendered),
        };

        RenderedContent {
            html: rendered,
            summary,
            toc,
            plain_text,
        }
    }

    /// Parse a body into events with heading ids assigned and links
    /// rewritten, collecting the TOC and plain text on the way.
    fn collect_events<'a>(
        &self,
        body: &'a str,
        ctx: &RenderContext<'_>,
    ) -> (Vec<Event<'a>>, Vec<TocEntry>, String) {
        let mut events: Vec<Event<'a>> = Parser::new_ext(body, self.options).collect();
        let mut toc = Vec::new();
        let mut plain = String::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();

        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    let level = heading_level(*level);
                    let explicit = id.as_ref().map(|id| id.to_string());
                    let text = heading_text(&events[i + 1..]);
                    let id = explicit.unwrap_or_else(|| unique_id(&text, &mut used_ids));

                    if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                        *slot = Some(CowStr::from(id.clone()));
                    }
                    toc.push(TocEntry { level, text, id });
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    let rewritten = ctx.links.and_then(|links| links.rewrite(dest_url));
                    if let Some(target) = rewritten {
                        debug!(page = ctx.permalink, from = %dest_url, to = %target, "rewrote link");
                        if let Event::Start(Tag::Link { dest_url: slot, .. }) = &mut events[i] {
                            *slot = CowStr::from(target);
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if !plain.is_empty() && !plain.ends_with(' ') {
                        plain.push(' ');
                    }
                    plain.push_str(text.trim());
                }
                _ => {}
            }
            i += 1;
        }

        (events, toc, plain.trim().to_string())
    }
}

impl ContentRenderer for MarkdownRenderer {
    fn render(&self, body: &str, ctx: &RenderContext<'_>) -> Result<RenderedContent> {
        Ok(self.render_with(body, ctx))
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Text of a heading, read from the events following its start tag.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn unique_id(text: &str, used: &mut HashMap<String, usize>) -> String {
    let base = match slugify(text) {
        slug if slug.is_empty() => "section".to_string(),
        slug => slug,
    };
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}-{}", *count - 1)
    }
}

fn first_paragraph(html: &str) -> String {
    match (html.find("<p>"), html.find("</p>")) {
        (Some(start), Some(end)) if start < end => html[start..end + "</p>".len()].to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use arbor_core::LinkRewriter;

    use super::*;

    #[test]
    fn test_render_simple_markdown() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render_body("# Hello World\n\nThis is a test.");

        assert!(rendered.html.contains(r#"<h1 id="hello-world">"#));
        assert!(rendered.html.contains("<p>This is a test.</p>"));
        assert_eq!(rendered.summary, "<p>This is a test.</p>");
        assert_eq!(rendered.plain_text, "Hello World This is a test.");
    }

    #[test]
    fn test_toc_extraction() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render_body("# Heading 1\n## Heading 2\n### Heading 3\n## Heading 2");

        let toc = rendered.toc;
        assert_eq!(toc.len(), 4);
        assert_eq!(toc[0].level, 1);
        assert_eq!(toc[0].text, "Heading 1");
        assert_eq!(toc[1].level, 2);
        assert_eq!(toc[2].level, 3);
        assert_eq!(toc[1].id, "heading-2");
        assert_eq!(toc[3].id, "heading-2-1");
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render_body("## Install {#setup}");
        assert_eq!(rendered.toc[0].id, "setup");
        assert!(rendered.html.contains(r#"id="setup""#));
    }

    #[test]
    fn test_summary_divider() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render_body("First.\n\nSecond.\n\n<!--more-->\n\nThird.");
        assert!(rendered.summary.contains("First."));
        assert!(rendered.summary.contains("Second."));
        assert!(!rendered.summary.contains("Third."));
        assert!(rendered.html.contains("Third."));
    }

    #[test]
    fn test_table_rendering() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render_body(
            r#"| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |"#,
        );

        assert!(rendered.html.contains("<table>"));
        assert!(rendered.html.contains("<thead>"));
        assert!(rendered.html.contains("<td>"));
    }

    #[test]
    fn test_task_list() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render_body("- [x] Done\n- [ ] Not done");

        assert!(rendered.html.contains("checkbox"));
        assert!(rendered.html.contains("checked"));
    }

    struct StripMarkdownExt;

    impl LinkRewriter for StripMarkdownExt {
        fn rewrite(&self, target: &str) -> Option<String> {
            target
                .ends_with(".md")
                .then(|| format!("/{}", target.trim_end_matches(".md")))
        }
    }

    #[test]
    fn test_link_rewriting() {
        let renderer = MarkdownRenderer::new();
        let ctx = RenderContext::new("/docs/intro").with_links(&StripMarkdownExt);
        let rendered = renderer
            .render("See [setup](setup.md) and [site](https://example.com).", &ctx)
            .expect("render");

        assert!(rendered.html.contains(r#"href="/setup""#));
        assert!(rendered.html.contains(r#"href="https://example.com""#));
    }
}
