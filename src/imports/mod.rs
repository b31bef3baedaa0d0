//! Import graph resolution
//!
//! A document can pull other files in through its metadata:
//!
//! ```yaml
//! apiVersion: xl/v1
//! kind: Import
//! metadata:
//!   imports:
//!   - infrastructure.yaml
//!   - environments/dev.yaml
//! ```
//!
//! [`resolve_all`] reads the given files, follows their imports depth-first and
//! returns every file once, each import listed before the file importing it.
//! Paths are relative to the importing file's directory and may not be absolute
//! or contain `..`. Files importing each other in a loop are rejected with
//! [`XlError::ImportCycle`]; a file imported from several places (a diamond)
//! is read once.

use crate::constants::{IMPORT_KIND, IMPORTS_KEY, YAML_FORMAT_VERSION};
use crate::core::{Result, XlError};
use crate::document::{Document, DocumentReader};
use crate::utils::{read_text_file, validate_relative_path};
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One source file with its parsed documents
#[derive(Debug)]
pub struct FileWithDocuments {
    /// Absolute path of the file
    pub file_name: PathBuf,
    /// File that imported this one, `None` for files given explicitly
    pub parent: Option<PathBuf>,
    /// Absolute paths of the files this one imports
    pub imports: Vec<PathBuf>,
    /// Parsed documents, `imports` metadata removed
    pub documents: Vec<Document>,
}

impl FileWithDocuments {
    /// Directory containing the file, used for relative lookups
    pub fn base_dir(&self) -> &Path {
        self.file_name.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Reads `file_names` and everything they import, imports first.
///
/// # Errors
///
/// - [`XlError::FileSystemError`] if a file cannot be read
/// - [`XlError::DocumentError`] if a document fails to decode or an `Import`
///   document declares an unsupported version
/// - [`XlError::InvalidImports`] for malformed `imports` metadata
/// - [`XlError::ImportCycle`] if files import each other in a loop
pub fn resolve_all(file_names: &[PathBuf]) -> Result<Vec<FileWithDocuments>> {
    let mut resolver = ImportResolver::default();
    let files = resolver.parse_files(file_names, None)?;
    validate_import_documents(&files)?;
    Ok(files)
}

#[derive(Default)]
struct ImportResolver {
    seen: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
}

impl ImportResolver {
    fn parse_files(&mut self, file_names: &[PathBuf], parent: Option<&Path>) -> Result<Vec<FileWithDocuments>> {
        let mut result = Vec::new();

        for file_name in file_names {
            let absolute = absolute_path(file_name)?;

            if let Some(position) = self.stack.iter().position(|p| p == &absolute) {
                let chain = self.stack[position..]
                    .iter()
                    .chain(std::iter::once(&absolute))
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(XlError::ImportCycle {
                    chain,
                });
            }

            if !self.seen.insert(absolute.clone()) {
                debug!("{} was already read, skipping", absolute.display());
                continue;
            }

            let file = read_documents_from_file(&absolute, parent)?;

            self.stack.push(absolute.clone());
            let imported = self.parse_files(&file.imports, Some(&absolute))?;
            self.stack.pop();

            result.extend(imported);
            result.push(file);
        }

        Ok(result)
    }
}

fn absolute_path(file_name: &Path) -> Result<PathBuf> {
    file_name.canonicalize().map_err(|e| XlError::FileSystemError {
        operation: "opening XL YAML file".to_string(),
        path: file_name.display().to_string(),
        reason: e.to_string(),
    })
}

/// Parses one file and collects the imports declared by its documents.
pub fn read_documents_from_file(file_name: &Path, parent: Option<&Path>) -> Result<FileWithDocuments> {
    let content = read_text_file(file_name)?;
    let display_name = file_name.display().to_string();
    let base_dir = file_name.parent().unwrap_or_else(|| Path::new("."));

    let mut imports = Vec::new();
    let mut documents = Vec::new();

    for next in DocumentReader::new(&content) {
        let mut document = next.map_err(|failure| failure.into_error(&display_name))?;
        let declared = extract_imports(base_dir, &mut document, &display_name)
            .map_err(|e| e.in_document(display_name.clone(), document.line))?;
        imports.extend(declared);
        documents.push(document);
    }

    Ok(FileWithDocuments {
        file_name: file_name.to_path_buf(),
        parent: parent.map(Path::to_path_buf),
        imports,
        documents,
    })
}

/// Removes the `imports` metadata entry and returns the resolved paths.
fn extract_imports(base_dir: &Path, document: &mut Document, file: &str) -> Result<Vec<PathBuf>> {
    let invalid = |reason: &str| XlError::InvalidImports {
        file: file.to_string(),
        reason: reason.to_string(),
    };

    let Some(declared) = document.metadata.shift_remove(IMPORTS_KEY) else {
        return Ok(Vec::new());
    };

    let entries = match declared {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(entries) => entries,
        _ => return Err(invalid("the 'imports' field has wrong format. Must be a list of strings")),
    };

    let mut imports = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = match entry {
            Value::String(path) => path,
            _ => return Err(invalid("the 'imports' field has wrong format. Must be a list of strings")),
        };
        if path.trim().is_empty() {
            return Err(invalid("the 'imports' field contains empty elements"));
        }
        validate_relative_path(&path, IMPORTS_KEY)?;
        imports.push(base_dir.join(path.split('/').collect::<PathBuf>()));
    }

    Ok(imports)
}

fn validate_import_documents(files: &[FileWithDocuments]) -> Result<()> {
    for file in files {
        for document in &file.documents {
            if document.kind == IMPORT_KIND && document.api_version != YAML_FORMAT_VERSION {
                return Err(XlError::UnsupportedImportVersion {
                    api_version: document.api_version.clone(),
                }
                .in_document(file.file_name.display().to_string(), document.line));
            }
        }
    }
    Ok(())
}
