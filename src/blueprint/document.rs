//! The `blueprint.yaml` metadata document
//!
//! ```yaml
//! apiVersion: xl/v1
//! kind: Blueprint
//! metadata:
//!   projectName: Microservices
//! spec:
//!   parameters:
//!   - name: AppName
//!     type: Input
//!   files:
//!   - path: xebialabs.yaml.tmpl
//!   - path: docker/Dockerfile
//!     dependsOnTrue: UseDocker
//! ```
//!
//! `spec` may also be the bare parameter list; every other file of the
//! blueprint is then a template file.

use super::variable::{VarField, Variable, parse_variables};
use crate::constants::{BLUEPRINT_KIND, YAML_FORMAT_VERSION};
use crate::core::{Result, XlError};
use crate::document::CustomTag;
use crate::document::reader::describe;
use crate::document::resolver::TAG_FN;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// File names accepted for the metadata document, in lookup order
pub const BLUEPRINT_FILE_NAMES: [&str; 2] = ["blueprint.yaml", "blueprint.yml"];

/// One file to generate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path inside the blueprint, also the output path
    pub path: String,
    /// Generate only when this condition is true
    pub depends_on_true: VarField,
    /// Generate only when this condition is false
    pub depends_on_false: VarField,
}

impl TemplateFile {
    /// A file without conditions
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Keys match without regard to case, like variable fields.
    fn from_mapping(map: &Mapping) -> Result<Self> {
        let mut file = Self::default();
        for (key, value) in map {
            let key = key.as_str().unwrap_or_default();
            let field = match value {
                Value::String(s) => VarField::literal(s.as_str()),
                Value::Tagged(tagged) => match CustomTag::from_tagged(tagged) {
                    Some(tag) if tag.tag == TAG_FN => VarField::function(tag.value),
                    Some(tag) => {
                        return Err(XlError::UnknownTag {
                            tag: tag.tag,
                            value: tag.value,
                        });
                    }
                    None => return Err(invalid(format!("unknown variable value type in files [{key}]"))),
                },
                other => {
                    return Err(invalid(format!(
                        "unknown variable value type in files [{key}]: {}",
                        describe(other)
                    )));
                }
            };

            match key.to_ascii_lowercase().as_str() {
                "path" => file.path = field.val,
                "dependsontrue" => file.depends_on_true = field,
                "dependsonfalse" => file.depends_on_false = field,
                _ => return Err(invalid(format!("unknown field [{key}] in files"))),
            }
        }
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(invalid("path is missing for file specification in files".to_string()));
        }
        if std::path::Path::new(path).is_absolute()
            || path.starts_with('/')
            || path.starts_with("..")
            || path.starts_with("./")
            || path.starts_with(".\\")
        {
            return Err(invalid("path for file specification cannot start with /, .. or ./".to_string()));
        }
        Ok(())
    }
}

/// A parsed and validated blueprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintDocument {
    /// Free-form metadata, empty when absent
    pub metadata: Mapping,
    /// Parameters in declaration order
    pub variables: Vec<Variable>,
    /// Declared files, `None` when the blueprint does not list them
    pub files: Option<Vec<TemplateFile>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlueprint {
    #[serde(rename = "apiVersion", default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    metadata: Option<Mapping>,
    #[serde(default)]
    spec: Value,
}

/// Parses and validates a blueprint metadata document.
///
/// # Errors
///
/// - [`XlError::YamlError`] if the YAML is malformed or has unknown keys
/// - [`XlError::InvalidBlueprint`] for a wrong `apiVersion`/`kind` or bad `files`
/// - variable errors from [`parse_variables`]
pub fn parse_blueprint(content: &str) -> Result<BlueprintDocument> {
    let raw: RawBlueprint = serde_yaml::from_str(content)?;

    if raw.api_version != YAML_FORMAT_VERSION {
        return Err(invalid(format!("api version needs to be {YAML_FORMAT_VERSION}")));
    }
    if raw.kind != BLUEPRINT_KIND {
        return Err(invalid(format!("yaml document kind needs to be {BLUEPRINT_KIND}")));
    }

    let (parameters, files) = match raw.spec {
        Value::Null => (Vec::new(), None),
        Value::Sequence(items) => (maps(items, "parameters")?, None),
        Value::Mapping(mut spec) => {
            let parameters = match spec.shift_remove("parameters") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Sequence(items)) => maps(items, "parameters")?,
                Some(other) => return Err(invalid(format!("parameters must be a list, found {}", describe(&other)))),
            };
            let files = match spec.shift_remove("files") {
                None | Some(Value::Null) => None,
                Some(Value::Sequence(items)) => Some(
                    maps(items, "files")?
                        .iter()
                        .map(TemplateFile::from_mapping)
                        .collect::<Result<Vec<_>>>()?,
                ),
                Some(other) => return Err(invalid(format!("files must be a list, found {}", describe(&other)))),
            };
            if let Some((key, _)) = spec.iter().next() {
                let key = key.as_str().unwrap_or("?");
                return Err(invalid(format!("unknown field [{key}] in blueprint spec")));
            }
            (parameters, files)
        }
        other => {
            return Err(invalid(format!(
                "spec must be a list of parameters or a map of parameters and files, found {}",
                describe(&other)
            )));
        }
    };

    let variables = parse_variables(&parameters)?;
    if let Some(files) = &files {
        for file in files {
            file.validate()?;
        }
    }

    Ok(BlueprintDocument {
        metadata: raw.metadata.unwrap_or_default(),
        variables,
        files,
    })
}

fn maps(items: Vec<Value>, section: &str) -> Result<Vec<Mapping>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Mapping(map) => Ok(map),
            other => Err(invalid(format!("entries of {section} must be maps, found {}", describe(&other)))),
        })
        .collect()
}

fn invalid(reason: String) -> XlError {
    XlError::InvalidBlueprint { reason }
}
