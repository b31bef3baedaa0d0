//! Tree walking with custom tag dispatch
//!
//! [`walk_value`] visits sequences element-wise and mappings value-wise (keys are
//! never rewritten). Every tagged scalar is handed to a [`TagVisitor`] as a
//! [`CustomTag`], and the visitor decides whether the tag stays in the tree or is
//! replaced by a plain value.

use crate::core::{Result, XlError};
use serde_yaml::Value;
use serde_yaml::value::TaggedValue;

/// A tagged scalar such as `!value password` or `!file app.war`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTag {
    /// Tag name including the leading `!`
    pub tag: String,
    /// Scalar content of the tagged node
    pub value: String,
}

impl CustomTag {
    /// Builds a tag from a name (with or without the leading `!`) and a value
    pub fn new(tag: &str, value: impl Into<String>) -> Self {
        Self {
            tag: format!("!{}", tag.trim_start_matches('!')),
            value: value.into(),
        }
    }

    /// Extracts a custom tag from a tagged YAML node.
    ///
    /// Returns `None` when the tagged content is not a scalar.
    pub fn from_tagged(tagged: &TaggedValue) -> Option<Self> {
        scalar_to_string(&tagged.value).map(|value| Self::new(&tagged.tag.to_string(), value))
    }
}

/// What to do with a visited tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagAction {
    /// Leave the tagged node untouched
    Keep,
    /// Replace the tagged node with a plain value
    Replace(Value),
}

/// Handler invoked for every custom tag found by [`walk_value`]
pub trait TagVisitor {
    /// Handles one tag
    fn visit_tag(&mut self, tag: &CustomTag) -> Result<TagAction>;
}

/// Recursively visits `value`, rewriting tags as the visitor requests.
///
/// # Errors
///
/// Propagates the first visitor error. A tag attached to a mapping or sequence is
/// reported as [`XlError::UnknownTag`].
pub fn walk_value<V: TagVisitor + ?Sized>(value: &mut Value, visitor: &mut V) -> Result<()> {
    match value {
        Value::Sequence(items) => {
            for item in items.iter_mut() {
                walk_value(item, visitor)?;
            }
        }
        Value::Mapping(mapping) => {
            for (_, item) in mapping.iter_mut() {
                walk_value(item, visitor)?;
            }
        }
        Value::Tagged(tagged) => {
            let tag = CustomTag::from_tagged(tagged).ok_or_else(|| XlError::UnknownTag {
                tag: CustomTag::new(&tagged.tag.to_string(), "").tag,
                value: super::reader::describe(&tagged.value).to_string(),
            })?;
            if let TagAction::Replace(replacement) = visitor.visit_tag(&tag)? {
                *value = replacement;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
    Ok(())
}

/// Renders a scalar node as text; `None` for collections.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}
