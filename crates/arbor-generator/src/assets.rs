//! Static files and bundle resources.
//!
//! Copies the site's static directory verbatim and places page bundle
//! resources next to their page output.

use std::{fs, path::Path};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    error::{IoResultExt, Result},
    scanner::is_hidden,
    site::BundleResource,
};

/// Copies static files and resources into the output directory.
#[derive(Debug)]
pub struct AssetProcessor<'a> {
    dest_dir: &'a Path,
}

impl<'a> AssetProcessor<'a> {
    #[must_use]
    pub fn new(dest_dir: &'a Path) -> Self {
        Self { dest_dir }
    }

    /// Copy every non-hidden file below `source_dir` to the output root.
    ///
    /// Returns the number of files copied; a missing directory copies nothing.
    pub fn copy_static(&self, source_dir: &Path) -> Result<usize> {
        if !source_dir.is_dir() {
            debug!(dir = %source_dir.display(), "no static directory");
            return Ok(0);
        }

        let mut count = 0;
        for entry in WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(source_dir) else {
                continue;
            };
            Self::copy_file(entry.path(), &self.dest_dir.join(relative))?;
            count += 1;
        }

        info!(count, source = %source_dir.display(), "static files copied");
        Ok(count)
    }

    /// Copy bundle resources to their output locations.
    pub fn copy_resources(&self, resources: &[BundleResource]) -> Result<usize> {
        for resource in resources {
            let dest = self.dest_dir.join(&resource.output_path);
            Self::copy_file(&resource.source, &dest)?;
            debug!(src = %resource.source.display(), dest = %dest.display(), "copied resource");
        }
        Ok(resources.len())
    }

    /// Copy a single file, creating parent directories.
    pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::copy(source, dest).at(source)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_copy_static() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::create_dir_all(source.path().join("css")).unwrap();
        fs::write(source.path().join("css/style.css"), "body { color: red; }").unwrap();
        fs::write(source.path().join("favicon.ico"), "ico").unwrap();
        fs::write(source.path().join(".DS_Store"), "junk").unwrap();

        let copied = AssetProcessor::new(dest.path())
            .copy_static(source.path())
            .unwrap();

        assert_eq!(copied, 2);
        assert!(dest.path().join("css/style.css").exists());
        assert!(dest.path().join("favicon.ico").exists());
        assert!(!dest.path().join(".DS_Store").exists());
    }

    #[test]
    fn test_missing_static_dir() {
        let dest = TempDir::new().unwrap();
        let copied = AssetProcessor::new(dest.path())
            .copy_static(&dest.path().join("nope"))
            .unwrap();
        assert_eq!(copied, 0);
    }

    #[test]
    fn test_copy_resources() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let image = source.path().join("cover.png");
        fs::write(&image, "png").unwrap();

        let resources = vec![BundleResource {
            source: image,
            output_path: PathBuf::from("posts/trip/cover.png"),
        }];
        let copied = AssetProcessor::new(dest.path())
            .copy_resources(&resources)
            .unwrap();

        assert_eq!(copied, 1);
        assert_eq!(
            fs::read_to_string(dest.path().join("posts/trip/cover.png")).unwrap(),
            "png"
        );
    }
}
