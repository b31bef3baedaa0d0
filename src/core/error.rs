//! Error handling for xl-render
//!
//! This module provides the error taxonomy of the engine and user-friendly error
//! reporting for the CLI. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can match on the failure class
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Malformed input**: [`XlError::MalformedFormatString`], [`XlError::UnknownTag`],
//!   [`XlError::YamlDecode`], [`XlError::UnknownVariableType`], [`XlError::InvalidVariable`], ...
//! - **Unresolved references**: [`XlError::UnknownValue`], [`XlError::UnknownFunctionDomain`],
//!   [`XlError::UnknownVariable`], [`XlError::UnknownApiVersion`]
//! - **Path policy violations**: [`XlError::AbsolutePath`], [`XlError::ParentTraversal`],
//!   [`XlError::ArtifactsDirNotSet`], [`XlError::ArtifactIsDirectory`], [`XlError::ReservedArtifactName`]
//! - **Wrapped library errors**: [`XlError::IoError`], [`XlError::YamlError`],
//!   [`XlError::ZipError`], [`XlError::TomlError`]
//!
//! Best-effort degradations (a failing `!fn` while computing a default value) are
//! never surfaced as errors; they are logged with `tracing::warn!`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use xl_render::core::{XlError, user_friendly_error};
//!
//! let error = XlError::UnknownApiVersion { api_version: "xl/v9".to_string() };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for engine operations
///
/// The messages of `unknown value`, `invalid format string`, `unknown apiVersion`
/// and the `!file` path policy variants are part of the CLI output contract.
#[derive(Error, Debug)]
pub enum XlError {
    /// A `%`-delimited format string ended while a placeholder was still open
    #[error("invalid format string: `{input}`")]
    MalformedFormatString {
        /// The complete input that failed to parse
        input: String,
    },

    /// A `!value` key or `%key%` placeholder is not present in the value context
    #[error("unknown value: `{key}`")]
    UnknownValue {
        /// The key that was looked up
        key: String,
        /// Closest known key, if one is similar enough
        did_you_mean: Option<String>,
    },

    /// A custom YAML tag without a registered handler
    #[error("unknown tag {tag} {value}")]
    UnknownTag {
        /// The tag name including its leading `!`
        tag: String,
        /// The scalar the tag was attached to
        value: String,
    },

    /// A `!fn` expression that does not follow `domain.module(args)[.attr|[index]]`
    #[error("invalid syntax in function reference: {expression}")]
    InvalidFunctionSyntax {
        /// The raw expression
        expression: String,
    },

    /// A `!fn` expression naming a domain no [`FunctionDomain`] is registered for
    ///
    /// [`FunctionDomain`]: crate::functions::FunctionDomain
    #[error("unknown function type: {domain}")]
    UnknownFunctionDomain {
        /// The domain part of the expression
        domain: String,
    },

    /// A registered function domain failed while evaluating a call
    #[error("function [{expression}] failed: {reason}")]
    FunctionFailed {
        /// The raw expression
        expression: String,
        /// Description of the failure reported by the domain
        reason: String,
    },

    /// A function call produced no values where one was required
    #[error("function [{expression}] results is empty")]
    EmptyFunctionResult {
        /// The raw expression
        expression: String,
    },

    /// `!file` tags were found but no artifacts directory was supplied
    #[error("cannot process !file tags if artifactsDir has not been set")]
    ArtifactsDirNotSet,

    /// An absolute path was used where only relative paths are accepted
    #[error("absolute path is not allowed in {location}: {path}")]
    AbsolutePath {
        /// Where the path was declared (e.g. `!file tag`, `imports`)
        location: String,
        /// The offending path
        path: String,
    },

    /// A path containing a `..` segment was used
    #[error("relative path with .. is not allowed in {location}: {path}")]
    ParentTraversal {
        /// Where the path was declared (e.g. `!file tag`, `imports`)
        location: String,
        /// The offending path
        path: String,
    },

    /// A `!file` tag pointed at a directory
    #[error("directory is not allowed in !file tag: {path}")]
    ArtifactIsDirectory {
        /// The declared path
        path: String,
    },

    /// A `!file` tag used the entry name reserved for the rendered document
    #[error("{path} is reserved for the rendered document and cannot be used in !file tag")]
    ReservedArtifactName {
        /// The cleaned entry name
        path: String,
    },

    /// A file system operation failed on a known path
    #[error("File system error: {operation} {path}: {reason}")]
    FileSystemError {
        /// The operation that failed (e.g. "reading", "writing")
        operation: String,
        /// The path involved
        path: String,
        /// The underlying cause
        reason: String,
    },

    /// The YAML decoder rejected a document
    #[error("{reason}")]
    YamlDecode {
        /// 1-based line of the failure, if the decoder reported one
        line: Option<usize>,
        /// 1-based column of the failure, if the decoder reported one
        column: Option<usize>,
        /// The decoder message, possibly prefixed with a hint
        reason: String,
    },

    /// A document failed while being read or processed, with file and line context
    #[error("Error while processing YAML document at line {line} of XL YAML file {file}:\n  {source}")]
    DocumentError {
        /// File the document came from
        file: String,
        /// 1-based line of the document
        line: usize,
        /// What went wrong
        source: Box<XlError>,
    },

    /// The `imports` metadata of a document is malformed
    #[error("invalid 'imports' in {file}: {reason}")]
    InvalidImports {
        /// The importing file
        file: String,
        /// What is wrong with the declaration
        reason: String,
    },

    /// Files import each other in a loop
    #[error("import cycle detected: {chain}")]
    ImportCycle {
        /// The chain of files, joined with ` -> `
        chain: String,
    },

    /// An `Import` document declared an unsupported format version
    #[error("unknown apiVersion for Import spec kind: {api_version}")]
    UnsupportedImportVersion {
        /// The declared apiVersion
        api_version: String,
    },

    /// No configured target accepts the document's apiVersion
    #[error("unknown apiVersion: {api_version}")]
    UnknownApiVersion {
        /// The declared apiVersion
        api_version: String,
    },

    /// The document has no apiVersion
    #[error("apiVersion missing")]
    MissingApiVersion,

    /// The document references artifacts but the target cannot receive bundles
    #[error("file tags found but {target} does not support file references")]
    FileTagsNotSupported {
        /// Display name of the target
        target: String,
    },

    /// The transport failed to deliver a document
    #[error("failed to send document to {path}: {reason}")]
    SendFailed {
        /// Target endpoint path
        path: String,
        /// Transport error chain
        reason: String,
    },

    /// A value name does not satisfy the identifier rules
    #[error(
        "the name of the value {name} is invalid. It must start with an alphabetical character or an underscore and be followed by zero or more alphanumerical characters or underscores"
    )]
    InvalidValueName {
        /// The rejected name
        name: String,
    },

    /// A blueprint variable declares a field the model does not know
    #[error("unknown variable field [{field}] in parameter [{name}]")]
    UnknownVariableField {
        /// Name of the variable, if already known
        name: String,
        /// The unrecognised key
        field: String,
    },

    /// A blueprint variable field holds a value of an unsupported shape
    #[error("unknown variable type [{found}] for field [{field}]")]
    UnknownVariableType {
        /// The field being decoded
        field: String,
        /// Short description of the value that was found
        found: String,
    },

    /// A blueprint variable failed validation
    #[error("{reason}")]
    InvalidVariable {
        /// Name of the variable
        name: String,
        /// Validation message
        reason: String,
    },

    /// A dependsOn reference names a variable that does not exist
    #[error("no variable found in list by name [{name}]")]
    UnknownVariable {
        /// The referenced name
        name: String,
        /// Closest declared variable, if one is similar enough
        did_you_mean: Option<String>,
    },

    /// A value could not be interpreted as a boolean condition
    #[error("cannot use [{value}] as a boolean condition")]
    InvalidCondition {
        /// The raw value
        value: String,
    },

    /// The blueprint metadata document is invalid
    #[error("{reason}")]
    InvalidBlueprint {
        /// Validation message
        reason: String,
    },

    /// No `blueprint.yaml` / `blueprint.yml` was found
    #[error("blueprint metadata file not found in {location}")]
    BlueprintNotFound {
        /// Where the repository looked
        location: String,
    },

    /// An answer was rejected by the prompt validator
    #[error("invalid answer for [{name}]: {reason}")]
    PromptValidation {
        /// Name of the variable being answered
        name: String,
        /// Why the answer was rejected
        reason: String,
    },

    /// The user declined the final confirmation
    #[error("blueprint generation cancelled")]
    BlueprintCancelled,

    /// A blueprint template failed to render
    #[error("failed to render template {file}: {reason}")]
    TemplateRender {
        /// Template file name
        file: String,
        /// Tera error chain
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Engine result type
pub type Result<T> = std::result::Result<T, XlError>;

impl XlError {
    /// Wrap this error with the file and line of the document being processed
    #[must_use]
    pub fn in_document(self, file: impl Into<String>, line: usize) -> Self {
        Self::DocumentError {
            file: file.into(),
            line,
            source: Box::new(self),
        }
    }
}

/// Error wrapper adding suggestions and details for display in the terminal
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: XlError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: XlError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognises [`XlError`] (tailored suggestions), [`std::io::Error`] and falls back
/// to the full `anyhow` chain for anything else.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<XlError>() {
        Ok(xl_error) => return create_error_context(xl_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(XlError::FileSystemError {
                    operation: "accessing".to_string(),
                    path: "unknown".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the files being processed");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(XlError::FileSystemError {
                    operation: "accessing".to_string(),
                    path: "unknown".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Anything else is reported with its cause chain
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(XlError::Other {
        message,
    })
}

/// Map each [`XlError`] variant to an [`ErrorContext`] with tailored suggestions
fn create_error_context(error: XlError) -> ErrorContext {
    match error {
        XlError::UnknownValue {
            ref did_you_mean,
            ..
        } => {
            let suggestion = match did_you_mean {
                Some(candidate) => format!("Did you mean '{candidate}'?"),
                None => "Define the value in a .xlvals file, an XL_VALUE_* environment variable or with --values".to_string(),
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        XlError::UnknownVariable {
            ref did_you_mean,
            ..
        } => {
            let candidate = did_you_mean.clone();
            let context = ErrorContext::new(error).with_details(
                "dependsOnTrue / dependsOnFalse must name a variable declared earlier in the blueprint, or be a !fn expression",
            );
            match candidate {
                Some(candidate) => context.with_suggestion(format!("Did you mean '{candidate}'?")),
                None => context,
            }
        }

        XlError::MalformedFormatString { .. } => ErrorContext::new(error)
            .with_suggestion("Close every placeholder with a second '%' and write a literal percent sign as '%%'"),

        XlError::UnknownTag { .. } => ErrorContext::new(error)
            .with_details("Supported tags are !value, !format, !fn and !file"),

        XlError::ReservedArtifactName { .. } => ErrorContext::new(error)
            .with_suggestion("Rename the artifact or move it into a subdirectory"),

        XlError::AbsolutePath { .. } | XlError::ParentTraversal { .. } => ErrorContext::new(error)
            .with_suggestion("Reference files relative to the directory of the YAML file, without '..' segments"),

        XlError::UnknownApiVersion { .. } | XlError::MissingApiVersion => ErrorContext::new(error)
            .with_suggestion("Use 'xl-deploy/v1' or 'xl-release/v1' and make sure the target is configured"),

        XlError::ImportCycle { .. } => ErrorContext::new(error)
            .with_suggestion("Remove one of the 'imports' entries that closes the loop"),

        XlError::DocumentError { ref source, .. } => {
            let details = match source.as_ref() {
                XlError::YamlDecode { line: Some(line), column: Some(column), .. } => {
                    Some(format!("The YAML decoder stopped at line {line}, column {column}"))
                }
                _ => None,
            };
            match details {
                Some(details) => ErrorContext::new(error).with_details(details),
                None => ErrorContext::new(error),
            }
        }

        XlError::InvalidValueName { .. } => ErrorContext::new(error)
            .with_suggestion("Rename the value, e.g. replace '-' and '.' with '_'"),

        XlError::BlueprintNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Blueprints need a blueprint.yaml or blueprint.yml file at their root"),

        _ => ErrorContext::new(error),
    }
}
