pub mod chart;
pub mod json;

use fare_core::report::error::ReportError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// # Summary
/// Writes `bytes` to `path` through a temporary sibling file and a rename.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let dir = ensure_parent_dir(path)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".report.")
        .tempfile_in(&dir)
        .map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path)
        .map_err(|e| ReportError::Io(e.error.to_string()))?;
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<PathBuf, ReportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_err)?;
    Ok(dir)
}

pub(crate) fn io_err(e: std::io::Error) -> ReportError {
    ReportError::Io(e.to_string())
}
