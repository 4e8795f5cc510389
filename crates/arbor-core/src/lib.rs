//! Arbor Core Library
//!
//! Core types, configuration, front matter and error handling for the Arbor
//! static site generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;
pub mod render;

pub use config::{Config, DocsConfig, MountConfig, Params};
pub use content::{ContentRecord, ListSourceContent, PageFile, humanize, slugify};
pub use error::{CoreError, Result};
pub use frontmatter::{FrontMatter, MenuReference, parse_front_matter};
pub use render::{ContentRenderer, LinkRewriter, RenderContext, RenderedContent, TocEntry};
