//! Error types for site generation.

use std::path::PathBuf;

use arbor_core::CoreError;
use thiserror::Error;

use crate::template::TemplateError;

/// Result type alias using [`GeneratorError`].
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors raised while building or rendering a site.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// IO error on a specific path.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Configuration, front matter or markdown error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Template rendering error.
    #[error("template error in {path}: {source}")]
    Template {
        path: String,
        #[source]
        source: TemplateError,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeneratorError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Attach a path to IO results.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &std::path::Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| GeneratorError::io(path, e))
    }
}
