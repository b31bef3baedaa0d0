//! Multi-document YAML stream reader
//!
//! Documents are decoded one at a time so a failure can be reported with the
//! line of the document it happened in. Decoding is strict: unknown top-level
//! keys and duplicate keys are errors.

use super::Document;
use crate::core::{Result, XlError};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::trace;

const MISSING_SEPARATOR_HINT: &str =
    "Possible missing triple dash (---) to separate multiple YAML documents";

/// Decoder messages that usually mean two documents were written without `---`
const DUPLICATE_KEY_PATTERN: &str = r"duplicate (field|entry with key) \S+";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(rename = "apiVersion", default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    metadata: Option<Mapping>,
    #[serde(default)]
    spec: Value,
}

/// A document that failed to decode
///
/// `document` is the best-effort partial result (envelope fields may be empty)
/// carrying the position of the failing document for diagnostics.
#[derive(Debug)]
pub struct ReadFailure {
    /// Best-effort document with the line and column of the failure
    pub document: Document,
    /// What went wrong
    pub error: XlError,
}

impl ReadFailure {
    /// Wraps the error with the file name and document line
    #[must_use]
    pub fn into_error(self, file: &str) -> XlError {
        self.error.in_document(file, self.document.line)
    }
}

/// Iterator over the documents of a YAML stream
pub struct DocumentReader<'a> {
    documents: serde_yaml::Deserializer<'a>,
    start_lines: Vec<usize>,
    index: usize,
    failed: bool,
}

impl<'a> DocumentReader<'a> {
    /// Creates a reader over `content`
    pub fn new(content: &'a str) -> Self {
        Self {
            documents: serde_yaml::Deserializer::from_str(content),
            start_lines: document_start_lines(content),
            index: 0,
            failed: false,
        }
    }

    /// Reads every remaining document, stopping at the first failure.
    pub fn read_all(self) -> std::result::Result<Vec<Document>, ReadFailure> {
        self.collect()
    }

    fn start_line(&self, index: usize) -> usize {
        self.start_lines.get(index).copied().unwrap_or(1)
    }
}

impl Iterator for DocumentReader<'_> {
    type Item = std::result::Result<Document, ReadFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let deserializer = self.documents.next()?;
            let index = self.index;
            self.index += 1;
            let line = self.start_line(index);

            let value = match Value::deserialize(deserializer) {
                Ok(value) => value,
                Err(error) => {
                    self.failed = true;
                    let (error_line, column) = error
                        .location()
                        .map_or((None, None), |l| (Some(l.line()), Some(l.column())));
                    return Some(Err(ReadFailure {
                        document: Document {
                            line,
                            column: column.unwrap_or(1),
                            ..Document::default()
                        },
                        error: decode_error(error.to_string(), error_line, column),
                    }));
                }
            };

            // an empty document between two separators carries nothing
            if value.is_null() {
                trace!("skipping empty YAML document at line {}", line);
                continue;
            }

            return Some(match into_document(value, line) {
                Ok(document) => Ok(document),
                Err(error) => {
                    self.failed = true;
                    Err(ReadFailure {
                        document: Document {
                            line,
                            column: 1,
                            ..Document::default()
                        },
                        error,
                    })
                }
            });
        }
    }
}

/// Parses a single-document YAML string.
///
/// Only the first document of the stream is returned; an empty stream
/// yields an empty [`Document`].
pub fn parse_yaml_document(content: &str) -> Result<Document> {
    match DocumentReader::new(content).next() {
        Some(Ok(document)) => Ok(document),
        Some(Err(failure)) => Err(failure.error),
        None => Ok(Document {
            line: 1,
            column: 1,
            ..Document::default()
        }),
    }
}

fn into_document(value: Value, line: usize) -> Result<Document> {
    let raw: RawDocument =
        serde_yaml::from_value(value).map_err(|e| decode_error(e.to_string(), None, None))?;

    Ok(Document {
        api_version: raw.api_version,
        kind: raw.kind,
        metadata: raw.metadata.unwrap_or_default(),
        spec: normalize_spec(raw.spec)?,
        line,
        column: 1,
        apply_zip: None,
    })
}

/// Accepts a missing spec, a single mapping or a sequence of mappings.
pub(crate) fn normalize_spec(spec: Value) -> Result<Vec<Mapping>> {
    match spec {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(mapping) => Ok(vec![mapping]),
        Value::Sequence(entries) => entries
            .into_iter()
            .map(|entry| match entry {
                Value::Mapping(mapping) => Ok(mapping),
                other => Err(decode_error(
                    format!("spec entries must be mappings, found {}", describe(&other)),
                    None,
                    None,
                )),
            })
            .collect(),
        other => Err(decode_error(
            format!("spec must be a mapping or a sequence of mappings, found {}", describe(&other)),
            None,
            None,
        )),
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn decode_error(message: String, line: Option<usize>, column: Option<usize>) -> XlError {
    let reason = match Regex::new(DUPLICATE_KEY_PATTERN) {
        Ok(pattern) if pattern.is_match(&message) => format!("{MISSING_SEPARATOR_HINT}: {message}"),
        _ => message,
    };
    XlError::YamlDecode {
        line,
        column,
        reason,
    }
}

/// Computes the user-facing start line of every document in the stream.
///
/// Content before the first separator starts at line 1. A document introduced
/// by a `---` line starts on the line after it, except a separator on the very
/// first line, which reports line 1.
fn document_start_lines(content: &str) -> Vec<usize> {
    let mut lines = Vec::new();
    let mut seen_content = false;

    for (index, text) in content.lines().enumerate() {
        if is_separator(text) {
            lines.push(if index == 0 { 1 } else { index + 2 });
            seen_content = true;
            continue;
        }

        let trimmed = text.trim();
        if !seen_content && !trimmed.is_empty() && !trimmed.starts_with('#') && !trimmed.starts_with('%') {
            lines.push(1);
            seen_content = true;
        }
    }

    lines
}

fn is_separator(line: &str) -> bool {
    match line.strip_prefix("---") {
        Some(rest) => rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_multiple_documents_with_lines() {
        let yaml = "apiVersion: xl-deploy/v1\nkind: Applications\nspec:\n- name: a\n---\napiVersion: xl-release/v1\nkind: Templates\n";
        let documents = DocumentReader::new(yaml).read_all().unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].kind, "Applications");
        assert_eq!(documents[0].line, 1);
        assert_eq!(documents[1].api_version, "xl-release/v1");
        assert_eq!(documents[1].line, 6);
    }

    #[test]
    fn test_leading_separator_reports_first_line() {
        let yaml = "---\napiVersion: xl/v1\nkind: Import\n---\napiVersion: xl/v1\nkind: Import\n";
        let documents = DocumentReader::new(yaml).read_all().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].line, 1);
        assert_eq!(documents[1].line, 5);
    }

    #[test]
    fn test_blank_metadata_and_spec_are_normalized() {
        let doc = parse_yaml_document("apiVersion: xl-deploy/v1\nkind: Applications\nmetadata:\n").unwrap();
        assert!(doc.metadata.is_empty());
        assert!(doc.spec.is_empty());
    }

    #[test]
    fn test_single_mapping_spec_becomes_list() {
        let doc = parse_yaml_document("apiVersion: xl-deploy/v1\nkind: Applications\nspec:\n  name: app\n").unwrap();
        assert_eq!(doc.spec.len(), 1);
        assert_eq!(doc.spec[0].get("name").and_then(Value::as_str), Some("app"));
    }

    #[test]
    fn test_unknown_top_level_field_is_rejected() {
        let err = parse_yaml_document("apiVersion: xl-deploy/v1\nkind: Applications\nspecs: []\n").unwrap_err();
        assert!(err.to_string().contains("unknown field `specs`"), "{err}");
    }

    #[test]
    fn test_missing_separator_hint() {
        let yaml = "apiVersion: xl-deploy/v1\nkind: Applications\napiVersion: xl-release/v1\nkind: Templates\n";
        let failure = DocumentReader::new(yaml).next().unwrap().unwrap_err();
        assert!(failure.error.to_string().starts_with(MISSING_SEPARATOR_HINT), "{}", failure.error);
    }

    #[test]
    fn test_failure_keeps_document_line() {
        let yaml = "apiVersion: xl-deploy/v1\nkind: Applications\n---\napiVersion: xl-release/v1\nkind: [unclosed\n";
        let mut reader = DocumentReader::new(yaml);
        assert!(reader.next().unwrap().is_ok());
        let failure = reader.next().unwrap().unwrap_err();
        assert_eq!(failure.document.line, 4);

        let error = failure.into_error("broken.yaml");
        assert!(error.to_string().contains("at line 4 of XL YAML file broken.yaml"));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_scalar_spec_is_rejected() {
        let err = parse_yaml_document("apiVersion: xl-deploy/v1\nkind: Applications\nspec: nope\n").unwrap_err();
        assert!(err.to_string().contains("spec must be a mapping"));
    }
}
