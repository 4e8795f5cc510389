//! Arbor Parser Library
//!
//! Markdown rendering for page bodies: HTML, summary, table of contents and
//! plain text, with optional link rewriting.

pub mod markdown;

pub use markdown::{MarkdownRenderer, SUMMARY_DIVIDER};
