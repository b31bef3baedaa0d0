//! ZIP bundle of the artifacts referenced by `!file` tags

use crate::core::{Result, XlError};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Name of the entry holding the rendered document
pub const INDEX_ENTRY: &str = "index.yaml";

/// A temporary ZIP archive being filled with artifacts
///
/// The archive lives in the system temp directory. Dropping an unfinished
/// bundle deletes the file; [`finish`](Self::finish) hands the path to the
/// caller, which deletes it by dropping the returned [`TempPath`].
pub struct ArtifactBundle {
    writer: ZipWriter<File>,
    path: TempPath,
    entries: BTreeSet<String>,
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .finish()
    }
}

impl ArtifactBundle {
    /// Creates an empty bundle in the temp directory
    pub fn create() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("yaml").suffix(".zip").tempfile()?;
        let (file, path) = temp.into_parts();
        debug!("...... first !file tag found, creating temporary ZIP file `{}`", path.display());

        Ok(Self {
            writer: ZipWriter::new(file),
            path,
            entries: BTreeSet::new(),
        })
    }

    /// Location of the archive on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an entry with this name was already added
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// Copies `source` into the archive under `name`.
    ///
    /// Returns `false` without touching the archive if `name` was added before.
    /// [`INDEX_ENTRY`] is reserved for [`finish`](Self::finish).
    pub fn add_file(&mut self, name: &str, source: &Path) -> Result<bool> {
        if name == INDEX_ENTRY {
            return Err(XlError::ReservedArtifactName {
                path: name.to_string(),
            });
        }
        if self.contains(name) {
            debug!("...... file `{}` has already been added to the ZIP file. Skipping it", name);
            return Ok(false);
        }

        debug!("...... adding file `{}` to ZIP file", name);
        let mut input = File::open(source).map_err(|e| XlError::FileSystemError {
            operation: "opening".to_string(),
            path: source.display().to_string(),
            reason: e.to_string(),
        })?;

        self.writer.start_file(name, SimpleFileOptions::default())?;
        std::io::copy(&mut input, &mut self.writer)?;
        self.entries.insert(name.to_string());
        Ok(true)
    }

    /// Writes the rendered document as `index.yaml` and closes the archive.
    pub fn finish(mut self, index_yaml: &str) -> Result<TempPath> {
        self.writer.start_file(INDEX_ENTRY, SimpleFileOptions::default())?;
        self.writer.write_all(index_yaml.as_bytes())?;
        self.writer.finish()?;
        Ok(self.path)
    }
}
