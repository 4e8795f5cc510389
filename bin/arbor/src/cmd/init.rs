//! Init command - create a new site skeleton

use std::{fs, path::Path};

use color_eyre::eyre::{Result, WrapErr};

use super::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"[site]
title = "My Arbor Site"
base_url = "https://example.com"
language_code = "en"

[build]
output_dir = "public"

[[menus.main]]
name = "Posts"
page_ref = "/posts"
weight = 10
"#;

const HOME_TEMPLATE: &str = "---\ntitle: My Arbor Site\n---\n\nWelcome to your new site.\n";

const POSTS_TEMPLATE: &str = "---\ntitle: Posts\n---\n";

const FIRST_POST_TEMPLATE: &str = r#"---
title: "Hello World"
date: 2024-01-01
tags: [welcome]
---

This is your first post. Edit `content/posts/hello-world.md` to change it.
"#;

/// Files written by `init`, relative to the site directory.
pub const SKELETON: &[(&str, &str)] = &[
    (CONFIG_FILE, CONFIG_TEMPLATE),
    ("content/_index.md", HOME_TEMPLATE),
    ("content/posts/_index.md", POSTS_TEMPLATE),
    ("content/posts/hello-world.md", FIRST_POST_TEMPLATE),
];

/// Empty directories created by `init`.
const DIRECTORIES: &[&str] = &["layouts", "static", "themes"];

/// Run the init command.
///
/// Existing files are left alone unless `force` is set.
pub fn run(site_dir: &Path, force: bool) -> Result<()> {
    tracing::info!(site = %site_dir.display(), force, "initializing site");

    for dir in DIRECTORIES {
        let path = site_dir.join(dir);
        fs::create_dir_all(&path)
            .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    }

    for (relative, contents) in SKELETON {
        let path = site_dir.join(relative);
        if path.exists() && !force {
            println!("  Skipped (exists): {}", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        println!("  Created: {}", path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Edit {} to set the site title and base URL", CONFIG_FILE);
    println!("  2. Add content with `arbor new posts/my-first-post`");
    println!("  3. Run `arbor serve` to preview the site");

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::cmd::load_config;

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), false).unwrap();

        for (relative, _) in SKELETON {
            assert!(dir.path().join(relative).is_file(), "{relative}");
        }
        assert!(dir.path().join("layouts").is_dir());

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.site.title, "My Arbor Site");
        assert_eq!(config.menus["main"].len(), 1);
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(dir.path().join("content/_index.md"), "mine").unwrap();

        run(dir.path(), false).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("content/_index.md")).unwrap(),
            "mine"
        );

        run(dir.path(), true).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("content/_index.md")).unwrap(),
            HOME_TEMPLATE
        );
    }
}
