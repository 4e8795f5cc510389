//! Link resolution against a mount's route map.

use std::collections::HashMap;

use arbor_core::{LinkRewriter, MountConfig, content::is_content_file};
use tracing::{debug, warn};

/// Repository coordinates for links to files outside the rendered docs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RepoTarget {
    url: String,
    branch: String,
    path: String,
}

/// Resolves link targets found in one mount's documents.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    mount: String,
    routes: HashMap<String, String>,
    repo: Option<RepoTarget>,
    strict: bool,
}

impl LinkResolver {
    pub fn new(mount: &MountConfig, strict: bool) -> Self {
        let repo = mount
            .repo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| RepoTarget {
                url: url.trim_end_matches('/').to_string(),
                branch: mount.repo_branch().to_string(),
                path: mount
                    .repo_path
                    .as_deref()
                    .unwrap_or_default()
                    .trim_matches('/')
                    .to_string(),
            });

        Self {
            mount: mount.name.clone(),
            routes: HashMap::new(),
            repo,
            strict,
        }
    }

    /// Register the permalink of a source file (path relative to the mount).
    pub fn insert_route(&mut self, source_path: &str, permalink: &str) {
        self.routes
            .insert(source_path.to_lowercase(), permalink.to_string());
    }

    /// Permalink of a source file, case-insensitive.
    pub fn route(&self, source_path: &str) -> Option<&str> {
        self.routes
            .get(&source_path.to_lowercase())
            .map(String::as_str)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Resolve a link written in a document located in `source_dir`
    /// (relative to the mount root).
    ///
    /// Returns `None` when the link should be dropped.
    pub fn resolve(&self, target: &str, source_dir: &str) -> Option<String> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        if is_external(target) || target.starts_with('#') {
            return Some(target.to_string());
        }

        let (path, suffix) = split_suffix(target);
        if path.is_empty() {
            return Some(target.to_string());
        }

        let Some(normalized) = normalize_path(source_dir, path) else {
            self.dropped(target, "escapes the mount root");
            return None;
        };

        if !is_content_file(std::path::Path::new(&normalized)) {
            return Some(target.to_string());
        }

        if let Some(permalink) = self.route(&normalized) {
            return Some(format!("{permalink}{suffix}"));
        }

        if let Some(repo) = &self.repo {
            let repo_path = if repo.path.is_empty() {
                normalized
            } else {
                format!("{}/{normalized}", repo.path)
            };
            return Some(format!(
                "{}/blob/{}/{repo_path}{suffix}",
                repo.url, repo.branch
            ));
        }

        self.dropped(target, "no page for markdown target");
        None
    }

    fn dropped(&self, target: &str, reason: &str) {
        if self.strict {
            warn!(mount = %self.mount, link = target, reason, "dropping link");
        } else {
            debug!(mount = %self.mount, link = target, reason, "dropping link");
        }
    }
}

/// Whether a link leaves the site.
pub fn is_external(target: &str) -> bool {
    ["http://", "https://", "mailto:", "tel:", "//"]
        .iter()
        .any(|scheme| target.starts_with(scheme))
}

/// Split a target into its path and `?query`/`#anchor` suffix.
pub fn split_suffix(target: &str) -> (&str, &str) {
    match target.find(['?', '#']) {
        Some(pos) => target.split_at(pos),
        None => (target, ""),
    }
}

/// Resolve `path` against `source_dir`, both relative to the mount root.
///
/// A leading `/` starts at the mount root. Returns `None` when `..`
/// climbs above the root.
pub fn normalize_path(source_dir: &str, path: &str) -> Option<String> {
    let mut segments: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        source_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(component),
        }
    }

    Some(segments.join("/"))
}

/// Rewrites body links of one page.
pub struct PageLinks<'a> {
    resolver: &'a LinkResolver,
    source_dir: &'a str,
}

impl<'a> PageLinks<'a> {
    pub fn new(resolver: &'a LinkResolver, source_dir: &'a str) -> Self {
        Self {
            resolver,
            source_dir,
        }
    }
}

impl LinkRewriter for PageLinks<'_> {
    fn rewrite(&self, target: &str) -> Option<String> {
        self.resolver
            .resolve(target, self.source_dir)
            .filter(|resolved| resolved != target)
    }
}
