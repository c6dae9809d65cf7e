//! Project inspection and export relocation.
//!
//! The target project is a directory holding one subdirectory per
//! application. Assets move from the export's `assets/{category}/{app}`
//! folders to `{app}/static/{app}/{category}`, pages move from `{app}` to
//! `{app}/templates/{app}`. Folders not named after an application go to the
//! project-wide `static/` and `templates/` directories.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::convert::{BatchReport, ConvertOptions, convert_tree};
use crate::error::{Error, Result};
use crate::reconcile::{self, Classification, FolderCandidate};

/// Project-wide static directory, never an application.
pub const STATIC_DIR: &str = "static";

/// Project-wide template directory, never an application.
pub const TEMPLATES_DIR: &str = "templates";

/// Asset categories relocated by default.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["css", "img", "js", "fonts"];

/// An application of the target project.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Application {
    pub name: String,
    pub path: PathBuf,
}

/// Settings for one migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub export_root: PathBuf,
    pub project_root: PathBuf,
    /// Directory under `export_root` holding the assets.
    pub assets_dir: String,
    pub categories: Vec<String>,
    pub convert: ConvertOptions,
}

impl MigrationConfig {
    pub fn new(export_root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            export_root: export_root.into(),
            project_root: project_root.into(),
            assets_dir: "assets".to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            convert: ConvertOptions::default(),
        }
    }

    pub fn with_assets_dir(mut self, assets_dir: impl Into<String>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_convert_options(mut self, convert: ConvertOptions) -> Self {
        self.convert = convert;
        self
    }

    fn assets_root(&self) -> PathBuf {
        self.export_root.join(&self.assets_dir)
    }
}

/// Applications of the project at `project_root`, sorted by name.
pub fn discover_applications(project_root: &Path) -> Result<Vec<Application>> {
    if !project_root.is_dir() {
        return Err(Error::source_not_found(project_root));
    }

    let applications: Vec<Application> = reconcile::list_folders(project_root)?
        .into_iter()
        .filter(|c| c.name != STATIC_DIR && c.name != TEMPLATES_DIR)
        .map(|c| Application {
            name: c.name,
            path: c.path,
        })
        .collect();

    debug!(count = applications.len(), "applications discovered");
    Ok(applications)
}

/// What a relocation moves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum RelocationKind {
    Markup,
    Asset(String),
}

/// Who ends up owning a relocated folder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum Owner {
    Application(String),
    Common,
}

/// One copy from the export into the project.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Relocation {
    pub kind: RelocationKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub owner: Owner,
}

/// Work out where every export folder goes.
pub fn plan(config: &MigrationConfig, applications: &[Application]) -> Result<Vec<Relocation>> {
    let known: Vec<String> = applications.iter().map(|a| a.name.clone()).collect();
    let project = &config.project_root;
    let mut relocations = Vec::new();

    for category in &config.categories {
        let kind = RelocationKind::Asset(category.clone());
        let entries = reconcile::list_entries(&config.assets_root().join(category))?;
        let (folders, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|c| c.is_dir);

        let Classification {
            applications,
            common,
        } = reconcile::classify(&known, folders);

        for folder in applications {
            let destination = project
                .join(&folder.name)
                .join(STATIC_DIR)
                .join(&folder.name)
                .join(category);
            relocations.push(relocate(&kind, folder, destination, true));
        }

        let shared = project.join(STATIC_DIR).join(category);
        for entry in common.into_iter().chain(files) {
            let destination = shared.join(&entry.name);
            relocations.push(relocate(&kind, entry, destination, false));
        }
    }

    let entries = reconcile::list_entries(&config.export_root)?;
    let (folders, files): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .filter(|c| c.name != config.assets_dir)
        .partition(|c| c.is_dir);
    let pages = files
        .into_iter()
        .filter(|c| Path::new(&c.name).extension().is_some_and(|e| e == "html"));

    let Classification {
        applications,
        common,
    } = reconcile::classify(&known, folders);

    for folder in applications {
        let destination = project
            .join(&folder.name)
            .join(TEMPLATES_DIR)
            .join(&folder.name);
        relocations.push(relocate(&RelocationKind::Markup, folder, destination, true));
    }
    for entry in common.into_iter().chain(pages) {
        let destination = project.join(TEMPLATES_DIR).join(&entry.name);
        relocations.push(relocate(&RelocationKind::Markup, entry, destination, false));
    }

    debug!(count = relocations.len(), "relocations planned");
    Ok(relocations)
}

fn relocate(
    kind: &RelocationKind,
    candidate: FolderCandidate,
    destination: PathBuf,
    owned: bool,
) -> Relocation {
    let owner = if owned {
        Owner::Application(candidate.name)
    } else {
        Owner::Common
    };
    Relocation {
        kind: kind.clone(),
        source: candidate.path,
        destination,
        owner,
    }
}

/// Copy every relocation source to its destination.
///
/// Directories are copied recursively and merged into existing ones. Returns
/// the number of files copied.
pub fn apply(relocations: &[Relocation]) -> Result<usize> {
    apply_excluding(relocations, &HashSet::new())
}

/// Like [`apply`], leaving out the files in `excluded`.
pub fn apply_excluding(relocations: &[Relocation], excluded: &HashSet<PathBuf>) -> Result<usize> {
    let mut copied = 0;
    for relocation in relocations {
        copied += copy_tree(&relocation.source, &relocation.destination, excluded)?;
        debug!(
            source = %relocation.source.display(),
            destination = %relocation.destination.display(),
            "relocated"
        );
    }
    Ok(copied)
}

fn copy_tree(source: &Path, destination: &Path, excluded: &HashSet<PathBuf>) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            Error::io(path, e.into())
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(Path::new(""));
        let target = if relative.as_os_str().is_empty() {
            destination.to_path_buf()
        } else {
            destination.join(relative)
        };

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
            continue;
        }
        if excluded.contains(entry.path()) {
            debug!(path = %entry.path().display(), "not copied");
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::copy(entry.path(), &target).map_err(|e| Error::io(entry.path(), e))?;
        copied += 1;
    }
    Ok(copied)
}

/// Outcome of [`migrate`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct MigrationReport {
    pub conversion: BatchReport,
    pub relocations: Vec<Relocation>,
    pub files_copied: usize,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.conversion.is_success()
    }
}

/// Convert the export in place, then copy it into the project.
///
/// The project is inspected before anything is converted. Pages that failed
/// to convert are not copied.
pub fn migrate(config: &MigrationConfig) -> Result<MigrationReport> {
    let applications = discover_applications(&config.project_root)?;
    let conversion = convert_tree(&config.export_root, &config.convert)?;
    let relocations = plan(config, &applications)?;

    let failed: HashSet<PathBuf> = conversion.failed.iter().map(|f| f.path.clone()).collect();
    let files_copied = apply_excluding(&relocations, &failed)?;

    info!(
        converted = conversion.converted.len(),
        failed = conversion.failed.len(),
        relocations = relocations.len(),
        files_copied,
        "migration finished"
    );

    Ok(MigrationReport {
        conversion,
        relocations,
        files_copied,
    })
}
