//! Content types and structures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{config::Params, frontmatter::MenuReference};

/// File extensions treated as content.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Check whether a path has a content extension (case-insensitive).
pub fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CONTENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// A content file located during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    /// Absolute source path.
    pub path: PathBuf,

    /// Slash-normalized directory relative to the content root, without
    /// leading or trailing slashes. Empty at the root.
    pub dir: String,

    /// File name without its extension.
    pub base_name: String,
}

impl PageFile {
    /// Build a page file from an absolute path and the content root.
    ///
    /// Returns `None` when the path is not inside `root` or has no file stem.
    pub fn new(path: &Path, root: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let base_name = path.file_stem()?.to_str()?.to_string();
        let dir = relative
            .parent()
            .map(|p| normalize_dir_key(&p.to_string_lossy()))
            .unwrap_or_default();

        Some(Self {
            path: path.to_path_buf(),
            dir,
            base_name,
        })
    }

    /// Directory segments, empty at the root.
    pub fn dir_segments(&self) -> Vec<&str> {
        self.dir.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Source path relative to the content root, slash-separated.
    pub fn relative_path(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.dir.is_empty() {
            name
        } else {
            format!("{}/{name}", self.dir)
        }
    }

    /// Whether this is a branch index (`_index.<ext>`).
    pub fn is_branch_index(&self) -> bool {
        self.base_name.eq_ignore_ascii_case("_index")
    }

    /// Whether this is a leaf bundle index (`index.<ext>` below the root).
    pub fn is_leaf_bundle_index(&self) -> bool {
        !self.dir.is_empty() && self.base_name.eq_ignore_ascii_case("index")
    }
}

/// Normalize a relative directory into a lookup key.
pub fn normalize_dir_key(dir: &str) -> String {
    dir.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// A routed content file: one per ordinary page.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    /// Source file.
    pub file: PageFile,

    /// First directory segment, empty at the root.
    pub section: String,

    /// Effective content type.
    pub content_type: String,

    /// URL slug.
    pub slug: String,

    /// Page title.
    pub title: String,

    /// Effective publication date.
    pub date: DateTime<Utc>,

    /// Filesystem modification time.
    pub lastmod: DateTime<Utc>,

    /// Whether this is a draft.
    pub draft: bool,

    /// Description for summaries.
    pub description: String,

    /// Tags as written in front matter.
    pub tags: Vec<String>,

    /// Categories as written in front matter.
    pub categories: Vec<String>,

    /// Custom parameters.
    pub params: Params,

    /// Markdown body without front matter.
    pub raw_body: String,

    /// Site-relative URL, always starting with `/`.
    pub permalink: String,

    /// Output file relative to the destination root.
    pub output_path: PathBuf,

    /// Layout override.
    pub layout: Option<String>,

    /// Sort weight.
    pub weight: i32,

    /// Menu registrations.
    pub menus: Vec<MenuReference>,
}

/// Content of a branch index file, keyed by its directory.
#[derive(Debug, Clone, Default)]
pub struct ListSourceContent {
    /// Explicit title.
    pub title: Option<String>,

    /// Markdown body without front matter.
    pub raw_body: String,

    /// Description.
    pub description: String,

    /// Explicit content type.
    pub content_type: Option<String>,

    /// Layout override.
    pub layout: Option<String>,

    /// Custom parameters.
    pub params: Params,

    /// Directory key the index belongs to.
    pub dir: String,

    /// Source file.
    pub file: Option<PageFile>,

    /// Menu registrations.
    pub menus: Vec<MenuReference>,
}

impl ListSourceContent {
    /// Whether the index carries a body worth rendering.
    pub fn has_body(&self) -> bool {
        !self.raw_body.trim().is_empty()
    }
}

/// Convert text into a URL slug.
///
/// Lower-cases, keeps ASCII letters and digits, collapses runs of spaces,
/// `-`, `_`, `.` and `/` into one `-`, and strips leading and trailing `-`.
/// Other characters are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || matches!(c, '-' | '_' | '.' | '/') {
            pending_dash = true;
        }
    }

    slug
}

/// Turn a slug into a display title: `getting-started` → `Getting Started`.
pub fn humanize(slug: &str) -> String {
    slug.split(['-', '_', '.'])
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid_slug(slug: &str) -> bool {
        slug.is_empty()
            || (!slug.starts_with('-')
                && !slug.ends_with('-')
                && !slug.contains("--")
                && slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("2024-hello"), "2024-hello");
        assert_eq!(slugify("  --Go__Lang..v2//  "), "go-lang-v2");
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Ünïcode"), "ncode");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_idempotent_and_well_formed() {
        let inputs = [
            "Hello World",
            "a - ! - b",
            "__init__.py",
            "Rust 2024 Edition",
            "C++ & Go",
            "../../etc/passwd",
            "日本語",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
            assert!(is_valid_slug(&once), "malformed slug {once:?} for {input:?}");
        }
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("getting-started"), "Getting Started");
        assert_eq!(humanize("api_v2.reference"), "Api V2 Reference");
        assert_eq!(humanize("--a--b"), "A B");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_page_file_classification() {
        let root = Path::new("/site/content");

        let branch = PageFile::new(Path::new("/site/content/posts/_INDEX.md"), root).expect("file");
        assert_eq!(branch.dir, "posts");
        assert!(branch.is_branch_index());
        assert!(!branch.is_leaf_bundle_index());

        let bundle =
            PageFile::new(Path::new("/site/content/posts/trip/index.md"), root).expect("file");
        assert_eq!(bundle.dir, "posts/trip");
        assert_eq!(bundle.dir_segments(), vec!["posts", "trip"]);
        assert!(bundle.is_leaf_bundle_index());
        assert_eq!(bundle.relative_path(), "posts/trip/index.md");

        let root_index = PageFile::new(Path::new("/site/content/index.md"), root).expect("file");
        assert_eq!(root_index.dir, "");
        assert!(!root_index.is_leaf_bundle_index());

        assert!(PageFile::new(Path::new("/elsewhere/a.md"), root).is_none());
    }

    #[test]
    fn test_is_content_file() {
        assert!(is_content_file(Path::new("a.md")));
        assert!(is_content_file(Path::new("a.MARKDOWN")));
        assert!(!is_content_file(Path::new("a.png")));
        assert!(!is_content_file(Path::new("Makefile")));
    }

    #[test]
    fn test_normalize_dir_key() {
        assert_eq!(normalize_dir_key("/posts//2024/"), "posts/2024");
        assert_eq!(normalize_dir_key("posts\\2024"), "posts/2024");
        assert_eq!(normalize_dir_key("./"), "");
    }
}
