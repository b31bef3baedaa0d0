//! Where blueprint files come from

use crate::core::{Result, XlError};
use crate::utils::{read_bytes, to_slash_path, validate_relative_path};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Read access to one blueprint's files
pub trait BlueprintRepository {
    /// Where the blueprint lives, for messages.
    fn location(&self) -> String;

    /// Every file of the blueprint as a `/`-separated relative path, sorted.
    fn list_entries(&self) -> Result<Vec<String>>;

    /// Contents of the file at `path` (as returned by [`list_entries`](Self::list_entries)).
    fn get_file_contents(&self, path: &str) -> Result<Vec<u8>>;
}

/// A blueprint stored in a local directory
#[derive(Debug, Clone)]
pub struct LocalBlueprintRepository {
    root: PathBuf,
}

impl LocalBlueprintRepository {
    /// Opens the blueprint rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(XlError::BlueprintNotFound {
                location: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    /// Root directory of the blueprint
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl BlueprintRepository for LocalBlueprintRepository {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn list_entries(&self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| XlError::FileSystemError {
                operation: "listing".to_string(),
                path: self.root.display().to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                entries.push(to_slash_path(relative));
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn get_file_contents(&self, path: &str) -> Result<Vec<u8>> {
        validate_relative_path(path, "blueprint files")?;
        read_bytes(&self.root.join(path))
    }
}
