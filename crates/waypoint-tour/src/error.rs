//! Errors at the loading boundary.
//!
//! The running engine never fails: missing targets turn into retries,
//! skips, or completion. Only reading tours and configuration from disk or
//! text can produce a [`TourError`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TourError>;

#[derive(Debug, Error)]
pub enum TourError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {}", errors.join("; "))]
    InvalidConfig { errors: Vec<String> },
}

impl TourError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| TourError::io(path, e))
}
