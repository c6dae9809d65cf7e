//! # bss-django
//!
//! Migrate a Bootstrap Studio export into a Django project.
//!
//! ## Features
//!
//! - Turn builder directive attributes (`dj-for`, `dj-if`, `dj-block`,
//!   `dj-load`, `dj-ref`, `dj-for-data`) into Django template tags
//! - Point `script`/`img`/`link` assets and CSS `url(...)` values at
//!   `{% static %}` paths in the per-application layout
//! - Split export folders between project applications and shared folders
//! - Copy the converted export into the project tree
//!
//! ## Quick Start
//!
//! ```
//! use bss_django::Converter;
//!
//! let page = r#"<div dj-if="user.is_authenticated"><img src="assets/img/home/avatar.png"></div>"#;
//! let converted = Converter::default().convert_str(page).unwrap();
//!
//! assert!(converted.html.contains("{% if user.is_authenticated %}"));
//! assert!(converted.html.contains(r#"{% static "home/img/avatar.png" %}"#));
//! ```
//!
//! ## Migrating an export
//!
//! ```no_run
//! use bss_django::{MigrationConfig, migrate};
//!
//! let config = MigrationConfig::new("export", "mysite");
//! let report = migrate(&config).unwrap();
//! println!("{} pages converted", report.conversion.converted.len());
//! ```

pub mod convert;
pub mod dom;
pub mod error;
pub mod io;
pub mod project;
pub mod reconcile;
pub(crate) mod util;

pub use convert::{
    BatchReport, ConvertOptions, Converted, Converter, MalformedPathPolicy, TransformStats,
    convert_tree,
};
pub use dom::Document;
pub use error::{Error, Result};
pub use project::{
    Application, MigrationConfig, MigrationReport, Relocation, discover_applications, migrate, plan,
};
pub use reconcile::{Classification, FolderCandidate, classify};
