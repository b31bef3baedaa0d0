//! Core types shared by every engine component
//!
//! The core module holds the error taxonomy of xl-render. Every operation that
//! can fail returns [`Result`] (an alias over [`XlError`]); the orchestration and
//! CLI layers convert into `anyhow::Error` and render failures through
//! [`user_friendly_error`], which attaches actionable suggestions.
//!
//! # Examples
//!
//! ```rust
//! use xl_render::core::{XlError, user_friendly_error};
//!
//! fn example_operation() -> anyhow::Result<String> {
//!     Err(XlError::MissingApiVersion.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("apiVersion missing"));
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, Result, XlError, user_friendly_error};
