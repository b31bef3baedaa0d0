//! Custom tag handlers for document specs
//!
//! | tag       | effect                                                          |
//! |-----------|-----------------------------------------------------------------|
//! | `!value`  | replaced by the named entry of the value context                |
//! | `!format` | `%key%` placeholders substituted from the value context         |
//! | `!fn`     | replaced by the first result of the function registry           |
//! | `!file`   | left in place; the file is copied into the [`ArtifactBundle`]   |
//!
//! When at least one `!file` tag was seen, the rendered document is stored in the
//! bundle as `index.yaml` and the bundle is attached to the document.

use super::bundle::ArtifactBundle;
use super::visitor::{CustomTag, TagAction, TagVisitor, walk_value};
use super::Document;
use crate::core::{Result, XlError};
use crate::functions::FunctionRegistry;
use crate::substitute::substitute;
use crate::utils::{closest_match, validate_relative_path};
use crate::values::ValueMap;
use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

pub const TAG_VALUE: &str = "!value";
pub const TAG_FORMAT: &str = "!format";
pub const TAG_FN: &str = "!fn";
pub const TAG_FILE: &str = "!file";

const FILE_TAG_LOCATION: &str = "!file tag";

/// Inputs available to tag handlers
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Value context for `!value` and `!format`
    pub values: &'a ValueMap,
    /// Directory `!file` paths are relative to; `!file` fails without it
    pub artifacts_dir: Option<&'a Path>,
    /// Registry used by `!fn`
    pub functions: &'a FunctionRegistry,
}

struct TagResolver<'a> {
    context: ResolutionContext<'a>,
    bundle: Option<ArtifactBundle>,
}

impl TagResolver<'_> {
    fn resolve_value(&self, key: &str) -> Result<String> {
        self.context.values.get(key).cloned().ok_or_else(|| XlError::UnknownValue {
            key: key.to_string(),
            did_you_mean: closest_match(key, self.context.values.keys().map(String::as_str)),
        })
    }

    fn add_file(&mut self, declared: &str) -> Result<()> {
        let artifacts_dir = self.context.artifacts_dir.ok_or(XlError::ArtifactsDirNotSet)?;
        validate_relative_path(declared, FILE_TAG_LOCATION)?;

        let name = clean_entry_name(declared);
        let source = artifacts_dir.join(&name);
        if source.is_dir() {
            return Err(XlError::ArtifactIsDirectory {
                path: declared.to_string(),
            });
        }

        if self.bundle.is_none() {
            self.bundle = Some(ArtifactBundle::create()?);
        }
        if let Some(bundle) = self.bundle.as_mut() {
            bundle.add_file(&name, &source)?;
        }
        Ok(())
    }
}

impl TagVisitor for TagResolver<'_> {
    fn visit_tag(&mut self, tag: &CustomTag) -> Result<TagAction> {
        debug!("...... resolving {} {}", tag.tag, tag.value);
        match tag.tag.as_str() {
            TAG_VALUE => Ok(TagAction::Replace(Value::String(self.resolve_value(&tag.value)?))),
            TAG_FORMAT => {
                Ok(TagAction::Replace(Value::String(substitute(&tag.value, self.context.values)?)))
            }
            TAG_FN => Ok(TagAction::Replace(Value::String(
                self.context.functions.evaluate_first(&tag.value)?,
            ))),
            TAG_FILE => {
                self.add_file(&tag.value)?;
                Ok(TagAction::Keep)
            }
            _ => Err(XlError::UnknownTag {
                tag: tag.tag.clone(),
                value: tag.value.clone(),
            }),
        }
    }
}

/// Resolves every custom tag in the spec of `doc`.
///
/// On failure any partially written bundle is deleted before the error is
/// returned and `doc.apply_zip` stays empty.
pub fn resolve_document(doc: &mut Document, context: ResolutionContext<'_>) -> Result<()> {
    let mut resolver = TagResolver {
        context,
        bundle: None,
    };

    for entry in &mut doc.spec {
        for (_, value) in entry.iter_mut() {
            walk_value(value, &mut resolver)?;
        }
    }

    if let Some(bundle) = resolver.bundle.take() {
        let index_yaml = doc.render_yaml()?;
        doc.apply_zip = Some(bundle.finish(&index_yaml)?);
    }

    Ok(())
}

/// Normalizes a declared path into a `/`-separated entry name.
fn clean_entry_name(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
