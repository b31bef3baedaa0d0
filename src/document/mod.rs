//! YAML documents and custom tag resolution
//!
//! A devops-as-code file is a stream of `---` separated YAML documents. Each one
//! has the same envelope:
//!
//! ```yaml
//! apiVersion: xl-deploy/v1
//! kind: Applications
//! metadata:
//!   Applications-home: Applications/Team
//! spec:
//! - name: app
//!   password: !value app_password
//!   url: !format 'http://%host%:%port%/'
//!   artifact: !file build/app.war
//! ```
//!
//! The module is split into:
//!
//! - [`reader`] - decodes a stream into [`Document`]s with 1-based positions
//! - [`visitor`] - walks a value tree and dispatches [`CustomTag`]s
//! - [`resolver`] - the tag handlers (`!value`, `!format`, `!fn`, `!file`)
//! - [`bundle`] - the ZIP archive collecting `!file` artifacts

pub mod bundle;
pub mod reader;
pub mod resolver;
pub mod visitor;

pub use bundle::ArtifactBundle;
pub use reader::{DocumentReader, ReadFailure, parse_yaml_document};
pub use resolver::{ResolutionContext, resolve_document};
pub use visitor::{CustomTag, TagAction, TagVisitor, walk_value};

use crate::core::{Result, XlError};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tempfile::TempPath;

/// One decoded YAML document
///
/// `spec` entries are rewritten in place by [`resolve_document`]. When `!file`
/// tags were found, `apply_zip` holds the artifact bundle; the file is removed
/// when the document (or the taken path) is dropped.
#[derive(Debug, Default)]
pub struct Document {
    /// Format version, selects the target system
    pub api_version: String,
    /// Document kind (e.g. `Applications`, `Import`, `Blueprint`)
    pub kind: String,
    /// Ordered metadata map, empty when absent
    pub metadata: Mapping,
    /// Ordered spec entries, empty when absent
    pub spec: Vec<Mapping>,
    /// 1-based line where the document starts
    pub line: usize,
    /// 1-based column reported by the decoder
    pub column: usize,
    /// Artifact bundle built while resolving `!file` tags
    pub apply_zip: Option<TempPath>,
}

#[derive(Serialize)]
struct RenderedDocument<'a> {
    #[serde(rename = "apiVersion")]
    api_version: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "is_empty_mapping")]
    metadata: &'a Mapping,
    #[serde(skip_serializing_if = "is_empty_spec")]
    spec: &'a [Mapping],
}

fn is_empty_mapping(mapping: &&Mapping) -> bool {
    mapping.is_empty()
}

fn is_empty_spec(spec: &&[Mapping]) -> bool {
    spec.is_empty()
}

impl Document {
    /// Serializes the document back to YAML, custom tags included.
    pub fn render_yaml(&self) -> Result<String> {
        let rendered = RenderedDocument {
            api_version: &self.api_version,
            kind: &self.kind,
            metadata: &self.metadata,
            spec: &self.spec,
        };
        Ok(serde_yaml::to_string(&rendered)?)
    }

    /// Returns a string metadata entry.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Inserts a metadata entry unless the key is already present.
    pub fn add_metadata_if_missing(&mut self, key: &str, value: &str) {
        if value.is_empty() || self.metadata.contains_key(key) {
            return;
        }
        self.metadata.insert(Value::String(key.to_string()), Value::String(value.to_string()));
    }

    /// Path of the artifact bundle, if one was built.
    pub fn apply_zip_path(&self) -> Option<&Path> {
        self.apply_zip.as_deref()
    }

    /// Deletes the artifact bundle, if any.
    pub fn cleanup(&mut self) -> Result<()> {
        if let Some(path) = self.apply_zip.take() {
            tracing::debug!("...... deleting temporary file `{}`", path.display());
            path.close().map_err(XlError::IoError)?;
        }
        Ok(())
    }
}
