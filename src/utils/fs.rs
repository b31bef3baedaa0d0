//! File system helpers used when reading documents and writing generated output
//!
//! Failures are mapped to [`XlError::FileSystemError`] carrying the operation and
//! the path, so callers never have to attach that context themselves.
//!
//! # Examples
//!
//! ```rust,no_run
//! use xl_render::utils::fs::{ensure_dir, atomic_write};
//! use std::path::Path;
//!
//! # fn example() -> xl_render::core::Result<()> {
//! ensure_dir(Path::new("output/xebialabs"))?;
//! atomic_write(Path::new("output/values.xlvals"), b"a = b\n")?;
//! # Ok(())
//! # }
//! ```

use crate::core::{Result, XlError};
use std::fs;
use std::io::Write;
use std::path::Path;

fn fs_error(operation: &str, path: &Path, error: &std::io::Error) -> XlError {
    XlError::FileSystemError {
        operation: operation.to_string(),
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or if creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| fs_error("creating directory", path, &e))?;
    } else if !path.is_dir() {
        return Err(XlError::FileSystemError {
            operation: "creating directory".to_string(),
            path: path.display().to_string(),
            reason: "path exists but is not a directory".to_string(),
        });
    }
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The content goes to a sibling temporary file first, is synced to disk and then
/// renamed over the target, so readers never observe a partial file. Parent
/// directories are created as needed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| fs_error("creating temp file in", parent, &e))?;
    temp.write_all(content).map_err(|e| fs_error("writing", path, &e))?;
    temp.as_file().sync_all().map_err(|e| fs_error("syncing", path, &e))?;
    temp.persist(path).map_err(|e| fs_error("renaming temp file to", path, &e.error))?;

    Ok(())
}

/// Writes a string to a file atomically.
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Reads a UTF-8 text file.
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| fs_error("reading", path, &e))
}

/// Reads a file as raw bytes.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| fs_error("reading", path, &e))
}
