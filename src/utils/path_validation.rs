//! Path policy checks for user-supplied relative paths.
//!
//! `!file` tags, `imports` entries and blueprint file definitions all carry paths
//! that must stay inside the directory of the file declaring them. The checks here
//! are purely lexical: they never touch the filesystem, so a forbidden path is
//! rejected whether or not its target exists.

use crate::core::{Result, XlError};
use std::path::{Component, Path};

/// Validates that a declared path is relative and free of `..` segments.
///
/// `location` names where the path was declared and ends up in the error
/// message (e.g. `"!file tag"` gives
/// `absolute path is not allowed in !file tag: /etc/passwd`).
///
/// # Errors
/// - [`XlError::AbsolutePath`] when the path is absolute or starts with `/`
/// - [`XlError::ParentTraversal`] when any segment is `..`
pub fn validate_relative_path(path: &str, location: &str) -> Result<()> {
    let candidate = Path::new(path);

    if candidate.is_absolute() || path.starts_with('/') || path.starts_with('\\') {
        return Err(XlError::AbsolutePath {
            location: location.to_string(),
            path: path.to_string(),
        });
    }

    validate_no_traversal(path, location)
}

/// Validates that a path doesn't contain parent directory references.
///
/// Both `/` and `\` are treated as separators so that `a\..\b` is caught on
/// every platform.
///
/// # Errors
/// Returns [`XlError::ParentTraversal`] if any segment is `..`
pub fn validate_no_traversal(path: &str, location: &str) -> Result<()> {
    let has_parent = Path::new(path).components().any(|c| matches!(c, Component::ParentDir))
        || path.split(['/', '\\']).any(|segment| segment == "..");

    if has_parent {
        return Err(XlError::ParentTraversal {
            location: location.to_string(),
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Converts a path to the `/`-separated form used for bundle entries and
/// repository listings.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
