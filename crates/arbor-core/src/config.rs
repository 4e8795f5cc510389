//! Site configuration management.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Free-form parameters attached to the site, a page or a menu entry.
pub type Params = BTreeMap<String, serde_json::Value>;

/// Main configuration structure for Arbor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// RSS feed settings.
    #[serde(default)]
    pub rss: RssConfig,

    /// robots.txt settings.
    #[serde(default)]
    pub robots: RobotsConfig,

    /// Menus declared in configuration, keyed by menu name.
    #[serde(default)]
    pub menus: BTreeMap<String, Vec<MenuEntryConfig>>,

    /// Site parameters exposed to templates.
    #[serde(default)]
    pub params: Params,

    /// Docs mode settings. When present the site is built from mounts.
    #[serde(default)]
    pub docs: Option<DocsConfig>,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Default language code.
    #[serde(default = "default_language", alias = "default_language")]
    pub language_code: String,

    /// List of supported languages.
    #[serde(default)]
    pub languages: Vec<String>,

    /// Content directory, relative to the site directory.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Theme name, resolved under the themes directory.
    #[serde(default)]
    pub theme: Option<String>,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Whether to generate drafts.
    #[serde(default)]
    pub drafts: bool,

    /// Empty the output directory before writing. Off by default.
    #[serde(default)]
    pub clean_destination: bool,

    /// Site layout overlay directory.
    #[serde(default = "default_layout_dir")]
    pub layout_dir: PathBuf,

    /// Directory holding themes.
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,

    /// Static files copied verbatim to the output root.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

/// RSS feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssConfig {
    /// Whether the `index.xml` feed is written.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of items in feed.
    #[serde(default = "default_rss_limit")]
    pub limit: usize,
}

/// robots.txt configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotsConfig {
    /// Whether robots.txt is written.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Paths to disallow.
    #[serde(default)]
    pub disallow: Vec<String>,

    /// Paths to allow explicitly.
    #[serde(default)]
    pub allow: Vec<String>,
}

/// A menu entry declared in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuEntryConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Explicit link target.
    #[serde(default)]
    pub url: String,

    /// Reference to a page, resolved after assembly.
    #[serde(default, alias = "pageRef")]
    pub page_ref: Option<String>,

    /// Link title attribute.
    #[serde(default)]
    pub title: String,

    /// Sort weight among siblings.
    #[serde(default)]
    pub weight: i32,

    /// Identifier of the parent entry.
    #[serde(default)]
    pub parent: Option<String>,

    /// Unique identifier within the menu. Defaults to the name.
    #[serde(default)]
    pub identifier: Option<String>,

    /// HTML emitted before the link.
    #[serde(default)]
    pub pre: String,

    /// HTML emitted after the link.
    #[serde(default)]
    pub post: String,

    /// Extra parameters.
    #[serde(default)]
    pub params: Params,
}

/// Docs mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Title of the generated home page.
    #[serde(default = "default_docs_site_name")]
    pub site_name: String,

    /// Mount whose root index supplies the home page content.
    #[serde(default)]
    pub home_mount: Option<String>,

    /// Log every dropped navigation link as a warning.
    #[serde(default)]
    pub strict_links: bool,

    /// Search index settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Documentation source trees.
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

/// One documentation source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Mount name.
    pub name: String,

    /// Source directory, relative to the site directory.
    pub source_dir: PathBuf,

    /// URL prefix the mount is published under.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Repository web URL used for links that leave the mount.
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Repository branch for blob links.
    #[serde(default)]
    pub repo_branch: Option<String>,

    /// Path of the mount's source directory inside the repository.
    #[serde(default)]
    pub repo_path: Option<String>,

    /// Navigation document, relative to the mount source directory.
    #[serde(default)]
    pub nav_path: Option<PathBuf>,
}

/// Search index configuration for docs mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether the search index is written.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Output file name, relative to the output root.
    #[serde(default = "default_search_filename")]
    pub filename: String,
}

// Default value functions
fn default_language() -> String {
    "en".to_string()
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_layout_dir() -> PathBuf {
    PathBuf::from("layouts")
}

fn default_themes_dir() -> PathBuf {
    PathBuf::from("themes")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_true() -> bool {
    true
}

fn default_rss_limit() -> usize {
    20
}

fn default_docs_site_name() -> String {
    "Documentation".to_string()
}

fn default_url_prefix() -> String {
    "/".to_string()
}

fn default_search_filename() -> String {
    "search-index.json".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            drafts: false,
            clean_destination: false,
            layout_dir: default_layout_dir(),
            themes_dir: default_themes_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: default_rss_limit(),
        }
    }
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disallow: Vec::new(),
            allow: Vec::new(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filename: default_search_filename(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `ARBOR__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ARBOR").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url())
    }

    /// Configured languages, falling back to the default language.
    pub fn all_languages(&self) -> Vec<String> {
        if self.site.languages.is_empty() {
            vec![self.site.language_code.clone()]
        } else {
            self.site.languages.clone()
        }
    }

    /// Layout overlay directory of the configured theme, if any.
    pub fn theme_layout_dir(&self, site_dir: &Path) -> Option<PathBuf> {
        self.site.theme.as_ref().map(|theme| {
            site_dir
                .join(&self.build.themes_dir)
                .join(theme)
                .join("layouts")
        })
    }
}

impl DocsConfig {
    /// Validate mounts against the site directory.
    ///
    /// Any failure here is fatal and must abort the build before output.
    pub fn validate(&self, site_dir: &Path) -> Result<()> {
        if self.mounts.is_empty() {
            return Err(CoreError::config("docs.mounts cannot be empty"));
        }

        let mut names = HashSet::new();
        for mount in &self.mounts {
            if mount.name.trim().is_empty() {
                return Err(CoreError::config("docs mount name cannot be empty"));
            }
            if !names.insert(mount.name.as_str()) {
                return Err(CoreError::config(format!(
                    "duplicate docs mount name: {}",
                    mount.name
                )));
            }

            let source = site_dir.join(&mount.source_dir);
            if !source.is_dir() {
                return Err(CoreError::config(format!(
                    "docs mount '{}' source directory not found: {}",
                    mount.name,
                    source.display()
                )));
            }
        }

        if let Some(home) = &self.home_mount
            && !names.contains(home.as_str())
        {
            return Err(CoreError::config(format!(
                "docs.home_mount '{home}' does not name a mount"
            )));
        }

        Ok(())
    }
}

impl MountConfig {
    /// Non-empty segments of the URL prefix.
    pub fn prefix_segments(&self) -> Vec<String> {
        self.url_prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Branch used for repository blob links.
    pub fn repo_branch(&self) -> &str {
        self.repo_branch.as_deref().unwrap_or("main")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
title = "Test Site"
base_url = "https://example.com"
language_code = "en"
languages = ["en", "de"]
theme = "paper"

[build]
output_dir = "dist"
drafts = true
clean_destination = true

[rss]
limit = 15

[params]
author_handle = "@arbor"

[[menus.main]]
name = "Posts"
page_ref = "/posts"
weight = 10

[[menus.main]]
name = "GitHub"
url = "https://github.com"
weight = 20
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.title, "Test Site");
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.all_languages(), vec!["en", "de"]);
        assert_eq!(config.build.output_dir, PathBuf::from("dist"));
        assert!(config.build.drafts);
        assert!(config.build.clean_destination);
        assert_eq!(config.rss.limit, 15);
        assert_eq!(config.menus["main"].len(), 2);
        assert_eq!(config.menus["main"][0].page_ref.as_deref(), Some("/posts"));
        assert_eq!(
            config.params.get("author_handle"),
            Some(&serde_json::Value::String("@arbor".to_string()))
        );
        assert_eq!(
            config.theme_layout_dir(Path::new("/site")),
            Some(PathBuf::from("/site/themes/paper/layouts"))
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_toml_str(
            r#"
[site]
title = "Minimal Site"
base_url = "https://example.com"
"#,
        )
        .expect("parse config");

        assert_eq!(config.site.language_code, "en");
        assert_eq!(config.all_languages(), vec!["en"]);
        assert_eq!(config.site.content_dir, PathBuf::from("content"));
        assert_eq!(config.build.output_dir, PathBuf::from("public"));
        assert!(!config.build.clean_destination);
        assert!(!BuildConfig::default().clean_destination);
        assert!(config.rss.enabled);
        assert!(config.robots.enabled);
        assert!(config.menus.is_empty());
        assert!(config.docs.is_none());
    }

    #[test]
    fn test_url_for() {
        let config = Config::from_toml_str(
            r#"
[site]
title = "Test"
base_url = "https://example.com/"
"#,
        )
        .expect("parse config");

        assert_eq!(
            config.url_for("/posts/hello"),
            "https://example.com/posts/hello"
        );
        assert_eq!(config.url_for("posts/hello"), "https://example.com/posts/hello");
    }

    #[test]
    fn test_config_validation_empty_title() {
        let result = Config::from_toml_str(
            r#"
[site]
title = ""
base_url = "https://example.com"
"#,
        );
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("title cannot be empty")
        );
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    fn docs_config(mounts: &str) -> DocsConfig {
        let config = Config::from_toml_str(&format!(
            r#"
[site]
title = "Docs"
base_url = "https://docs.example.com"

[docs]
site_name = "Handbook"
{mounts}
"#
        ))
        .expect("parse config");
        config.docs.expect("docs section")
    }

    #[test]
    fn test_docs_config_parses_mounts() {
        let docs = docs_config(
            r#"
home_mount = "guide"

[[docs.mounts]]
name = "guide"
source_dir = "guide"
url_prefix = "/docs/"
repo_url = "https://github.com/acme/guide"
repo_path = "docs"
"#,
        );

        assert_eq!(docs.site_name, "Handbook");
        let mount = &docs.mounts[0];
        assert_eq!(mount.prefix_segments(), vec!["docs"]);
        assert_eq!(mount.repo_branch(), "main");
        assert_eq!(mount.repo_path.as_deref(), Some("docs"));
        assert!(docs.search.enabled);
        assert_eq!(docs.search.filename, "search-index.json");
    }

    #[test]
    fn test_docs_validation_empty_mounts() {
        let docs = docs_config("");
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = docs.validate(dir.path()).unwrap_err();
        assert!(err.to_string().contains("mounts cannot be empty"));
    }

    #[test]
    fn test_docs_validation_missing_source() {
        let docs = docs_config(
            r#"
[[docs.mounts]]
name = "api"
source_dir = "missing"
"#,
        );
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = docs.validate(dir.path()).unwrap_err();
        assert!(err.to_string().contains("source directory not found"));
    }

    #[test]
    fn test_docs_validation_unknown_home_mount() {
        let docs = docs_config(
            r#"
home_mount = "nope"

[[docs.mounts]]
name = "api"
source_dir = "api"
"#,
        );
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(dir.path().join("api")).expect("mkdir");
        let err = docs.validate(dir.path()).unwrap_err();
        assert!(err.to_string().contains("home_mount"));
    }
}
