//! Folder reconciliation.
//!
//! Splits the folders of an export directory into those named after a known
//! application and the shared remainder. Matching is by basename only; when
//! two candidates share a basename the later one replaces the earlier one and
//! a warning is logged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};

/// A folder (or file) considered for relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct FolderCandidate {
    pub path: PathBuf,
    /// Basename of `path`, the matching key.
    pub name: String,
    pub is_dir: bool,
}

impl FolderCandidate {
    /// Candidate for a directory, named after the last component of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            is_dir: true,
        }
    }

    pub fn with_is_dir(mut self, is_dir: bool) -> Self {
        self.is_dir = is_dir;
        self
    }
}

/// Folders split by owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Classification {
    /// Candidates named after a known application, in `known_apps` order.
    pub applications: Vec<FolderCandidate>,
    /// Everything else, in first-seen basename order.
    pub common: Vec<FolderCandidate>,
}

/// Partition `candidates` into application folders and shared folders.
///
/// Every candidate lands in exactly one list, except one that lost a basename
/// collision: the last candidate with a given basename survives at the
/// position of the first.
pub fn classify(known_apps: &[String], candidates: Vec<FolderCandidate>) -> Classification {
    let mut slots: Vec<Option<FolderCandidate>> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(candidates.len());

    for candidate in candidates {
        match index.get(&candidate.name) {
            Some(&slot) => {
                if let Some(previous) = &slots[slot] {
                    warn!(
                        name = %candidate.name,
                        kept = %candidate.path.display(),
                        dropped = %previous.path.display(),
                        "duplicate folder basename, keeping the last one"
                    );
                }
                slots[slot] = Some(candidate);
            }
            None => {
                index.insert(candidate.name.clone(), slots.len());
                slots.push(Some(candidate));
            }
        }
    }

    let mut applications = Vec::new();
    for app in known_apps {
        if let Some(&slot) = index.get(app)
            && let Some(candidate) = slots[slot].take()
        {
            applications.push(candidate);
        }
    }

    Classification {
        applications,
        common: slots.into_iter().flatten().collect(),
    }
}

/// Immediate subdirectories of `dir`, sorted by name.
///
/// A missing directory has no folders.
pub fn list_folders(dir: &Path) -> Result<Vec<FolderCandidate>> {
    let mut folders = list_entries(dir)?;
    folders.retain(|c| c.is_dir);
    Ok(folders)
}

/// Immediate entries of `dir`, sorted by name, hidden ones skipped.
pub(crate) fn list_entries(dir: &Path) -> Result<Vec<FolderCandidate>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry
            .file_type()
            .map_err(|e| Error::io(entry.path(), e))?
            .is_dir();
        entries.push(FolderCandidate {
            path: entry.path(),
            name,
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
