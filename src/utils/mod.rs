//! Filesystem and path utilities
//!
//! - [`fs`] - Directory creation, atomic writes and file reads with path-aware errors
//! - [`path_validation`] - Lexical checks for user-declared relative paths
//! - [`suggest`] - Closest-name suggestions for unknown keys

pub mod fs;
pub mod path_validation;
pub mod suggest;

pub use fs::{atomic_write, ensure_dir, read_bytes, read_text_file, safe_write};
pub use path_validation::{to_slash_path, validate_no_traversal, validate_relative_path};
pub use suggest::closest_match;
