//! Load/save boundary for converted pages.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Read a source page.
///
/// Fails with [`Error::SourceNotFound`] unless `path` is an existing regular
/// file.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(Error::source_not_found(path));
    }
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Write content atomically to a file.
///
/// The content goes to a temp file next to `path` which is then renamed over
/// it, so readers never observe a partial page.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        });

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(path, e)
    })
}
