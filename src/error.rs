//! Error types for bss-django operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while converting markup or relocating an export.
#[derive(Error, Debug)]
pub enum Error {
    #[error("file '{}' is invalid or doesn't exist", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("asset path '{path}' needs at least 3 segments (root/category/app)")]
    MalformedAssetPath { path: String },

    #[error("file '{}' is already converted", path.display())]
    AlreadyConverted { path: PathBuf },

    #[error("invalid selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn source_not_found(path: &Path) -> Self {
        Self::SourceNotFound {
            path: path.to_path_buf(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
