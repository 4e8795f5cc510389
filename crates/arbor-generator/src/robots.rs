//! Robots.txt generation.

use std::fmt::Write;

use arbor_core::Config;

/// Robots.txt generator.
#[derive(Debug)]
pub struct RobotsGenerator<'a> {
    config: &'a Config,
}

impl<'a> RobotsGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Generate robots.txt, or `None` when disabled.
    pub fn generate(&self) -> Option<String> {
        if !self.config.robots.enabled {
            return None;
        }

        let mut out = String::from("User-agent: *\n");
        for path in &self.config.robots.disallow {
            let _ = writeln!(out, "Disallow: {path}");
        }
        for path in &self.config.robots.allow {
            let _ = writeln!(out, "Allow: {path}");
        }
        let _ = writeln!(out, "Sitemap: {}", self.config.url_for("sitemap.xml"));
        Some(out)
    }
}
