//! Arbor Generator Library
//!
//! Turns a content tree into a routed site graph and renders it.
//!
//! # Modules
//!
//! - [`scanner`] - Content discovery and URL routing
//! - [`site`] - Page arena and site aggregate
//! - [`hierarchy`] - Home, section and nested list pages
//! - [`taxonomy`] - Tag and category term pages
//! - [`menu`] - Menu merge and tree derivation
//! - [`template`] - Template selection and interpolation
//! - [`docs`] - Documentation mounts, navigation and link resolution
//! - [`render`] - Page rendering and output writing
//! - [`rss`], [`sitemap`], [`robots`], [`search`] - Site-wide files
//! - [`assets`] - Static files and bundle resources
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod docs;
pub mod error;
pub mod hierarchy;
pub mod menu;
pub mod render;
pub mod robots;
pub mod rss;
pub mod scanner;
pub mod search;
pub mod site;
pub mod sitemap;
pub mod taxonomy;
pub mod template;

pub use assets::AssetProcessor;
pub use build::{BuildRequest, BuildStats, Builder, build_content_site};
pub use docs::{LinkResolver, NavItem, build_docs_site};
pub use error::{GeneratorError, Result};
pub use menu::{Menu, MenuEntry, Menus};
pub use rss::RssGenerator;
pub use scanner::{ContentScanner, ScanResult};
pub use site::{PageId, PageKind, PageNode, Site};
pub use sitemap::SitemapGenerator;
pub use template::{Template, TemplateContext, TemplateSelector};
