//! In-place conversion of every page under an export root.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use super::{ConvertOptions, Converter, TransformStats};
use crate::error::{Error, Result};

/// A page that converted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct FileOutcome {
    pub path: PathBuf,
    pub stats: TransformStats,
}

/// A page that did not.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct BatchReport {
    pub converted: Vec<FileOutcome>,
    /// Pages that already carried the import line.
    pub already_converted: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}

/// Every `*.html` file under `root`, sorted, hidden entries skipped.
pub fn discover_markup_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::source_not_found(root));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_markup(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Convert every page under `root` in place.
///
/// Pages are independent and converted in parallel. A failing page is
/// recorded in the report and never stops the others.
pub fn convert_tree(root: &Path, options: &ConvertOptions) -> Result<BatchReport> {
    let files = discover_markup_files(root)?;
    let converter = Converter::new(options.clone());

    let results: Vec<(PathBuf, Result<TransformStats>)> = files
        .into_par_iter()
        .map(|path| {
            let result = converter.convert_file(&path, &path);
            (path, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(stats) => report.converted.push(FileOutcome { path, stats }),
            Err(Error::AlreadyConverted { .. }) => report.already_converted.push(path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "conversion failed");
                report.failed.push(FileFailure {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        root = %root.display(),
        converted = report.converted.len(),
        skipped = report.already_converted.len(),
        failed = report.failed.len(),
        "batch conversion finished"
    );
    Ok(report)
}
