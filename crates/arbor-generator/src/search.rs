//! JSON search index for docs sites.
//!
//! The whole index is loaded by the browser, so it carries only the fields a
//! client-side search needs.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{IoResultExt, Result},
    site::Site,
};

/// Size above which the index is reported as large (500KB).
pub const MAX_INDEX_SIZE: usize = 500 * 1024;

/// Index format version.
pub const INDEX_VERSION: u32 = 1;

/// One searchable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub url: String,
    pub title: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Plain text of the rendered body.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub version: u32,
    pub documents: Vec<SearchDocument>,
}

impl SearchIndex {
    /// Index every page with rendered content.
    pub fn from_site(site: &Site) -> Self {
        let documents = site
            .pages()
            .filter_map(|(_, page)| {
                let rendered = page.rendered.as_ref()?;
                Some(SearchDocument {
                    url: page.permalink.clone(),
                    title: page.title.clone(),
                    section: page.section.clone(),
                    description: if page.description.is_empty() {
                        rendered.summary.clone()
                    } else {
                        page.description.clone()
                    },
                    text: rendered.plain_text.clone(),
                })
            })
            .collect();

        Self {
            version: INDEX_VERSION,
            documents,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the index to a file.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if json.len() > MAX_INDEX_SIZE {
            warn!(
                size = json.len(),
                max = MAX_INDEX_SIZE,
                "search index exceeds recommended size"
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::write(path, json).at(path)?;
        info!(documents = self.documents.len(), path = %path.display(), "search index written");
        Ok(())
    }
}
