//! New command - create new content from an archetype

use std::{
    fs,
    path::{Path, PathBuf},
};

use arbor_core::humanize;
use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr, bail};

use super::{CONFIG_FILE, load_config};

/// Run the new command.
///
/// Creates a content file with boilerplate front matter and returns its path.
pub fn run(site_dir: &Path, path: &Path, kind: &str) -> Result<PathBuf> {
    tracing::info!(path = %path.display(), kind, "creating new content");

    let content_dir = if site_dir.join(CONFIG_FILE).exists() {
        site_dir.join(load_config(site_dir)?.site.content_dir)
    } else {
        site_dir.join("content")
    };

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(humanize)
        .unwrap_or_else(|| "Untitled".to_string());

    let (file_path, front_matter) = match kind {
        "section" => (
            content_dir.join(path).join("_index.md"),
            section_front_matter(&title),
        ),
        "page" => (markdown_path(&content_dir, path), page_front_matter(&title)),
        "post" => (markdown_path(&content_dir, path), post_front_matter(&title)),
        other => bail!("Unknown content kind: {other} (expected post, page or section)"),
    };

    if file_path.exists() {
        bail!("{} already exists", file_path.display());
    }
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).wrap_err("Failed to create directories")?;
    }
    fs::write(&file_path, front_matter).wrap_err("Failed to write file")?;

    tracing::info!(file = %file_path.display(), "created new content file");
    println!("Created: {}", file_path.display());
    Ok(file_path)
}

fn markdown_path(content_dir: &Path, path: &Path) -> PathBuf {
    let full_path = content_dir.join(path);
    if full_path.extension().is_some() {
        full_path
    } else {
        full_path.with_extension("md")
    }
}

fn post_front_matter(title: &str) -> String {
    let date = Utc::now().format("%Y-%m-%d");
    format!(
        r#"---
title: "{title}"
date: {date}
draft: true
tags: []
---

Write your content here.
"#
    )
}

fn page_front_matter(title: &str) -> String {
    format!("---\ntitle: \"{title}\"\n---\n\nWrite your content here.\n")
}

fn section_front_matter(title: &str) -> String {
    format!("---\ntitle: \"{title}\"\n---\n")
}
