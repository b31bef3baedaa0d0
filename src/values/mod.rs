//! Value context for `!value` and `!format` tags
//!
//! Values are merged from three sources, later sources overriding earlier ones:
//!
//! 1. `.xlvals` property files, home directory files (`~/.xebialabs/*.xlvals`)
//!    first, then the files next to the document being processed
//! 2. environment variables carrying the value prefix (default `XL_VALUE_`),
//!    with the prefix stripped
//! 3. explicit overrides (`--values key=value`)
//!
//! Every resulting name must be an identifier (`[A-Za-z_][A-Za-z0-9_]*`).

pub mod properties;

pub use properties::{format_properties, parse_properties, read_properties, write_properties};

use crate::core::{Result, XlError};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flat, key-sorted value context
pub type ValueMap = BTreeMap<String, String>;

/// Environment variable prefix for values
pub const DEFAULT_ENV_PREFIX: &str = "XL_VALUE_";

/// Extension of value property files
pub const XLVALS_EXTENSION: &str = "xlvals";

const VALUE_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Merges value files, prefixed environment variables and overrides.
///
/// # Errors
///
/// - [`XlError::FileSystemError`] if a value file cannot be read or parsed
/// - [`XlError::InvalidValueName`] if a merged name is not an identifier
pub fn build_values<I>(files: &[PathBuf], env: I, overrides: &ValueMap, prefix: &str) -> Result<ValueMap>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut values = ValueMap::new();

    for file in files {
        debug!("reading values from {}", file.display());
        values.extend(read_properties(file)?);
    }

    for (key, value) in env {
        if let Some(name) = key.strip_prefix(prefix) {
            values.insert(name.to_string(), value);
        }
    }

    values.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

    let valid_name = Regex::new(VALUE_NAME_PATTERN).map_err(|e| XlError::Other {
        message: e.to_string(),
    })?;
    if let Some(invalid) = values.keys().find(|name| !valid_name.is_match(name)) {
        return Err(XlError::InvalidValueName {
            name: invalid.clone(),
        });
    }

    Ok(values)
}

/// Lists the `.xlvals` files of a directory, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_xlvals_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| XlError::FileSystemError {
        operation: "listing".to_string(),
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == XLVALS_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Value files applying to a document in `document_dir`: home files, then local files.
pub fn value_files_for(home_dir: Option<&Path>, document_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = match home_dir {
        Some(home) => list_xlvals_files(home)?,
        None => Vec::new(),
    };
    files.extend(list_xlvals_files(document_dir)?);
    Ok(files)
}

/// Parses a `key=value` override as given on the command line.
pub fn parse_override(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(XlError::Other {
            message: format!("invalid value override '{raw}', expected key=value"),
        }),
    }
}
