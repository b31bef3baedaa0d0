//! xl-render - devops-as-code YAML resolution and blueprint generation
//!
//! Two engines live in this crate:
//!
//! - the **document engine** reads `---` separated YAML documents, follows their
//!   imports, resolves custom tags (`!value`, `!format`, `!fn`, `!file`) and
//!   hands each document, or the artifact bundle built for it, to a transport
//! - the **blueprint engine** resolves a blueprint's variables in order,
//!   asking a prompter where needed, and renders its template files
//!
//! # Modules
//!
//! ## Document engine
//! - [`substitute`] - `%key%` placeholder substitution
//! - [`document`] - document model, stream reader, tag resolver and artifact bundle
//! - [`functions`] - `!fn` expressions and the function registry
//! - [`imports`] - import graph resolution
//! - [`values`] - value contexts and `.xlvals` files
//! - [`targets`] - target systems, transports and apply orchestration
//!
//! ## Blueprint engine
//! - [`blueprint`] - variables, prompting, resolution and rendering
//!
//! ## Supporting modules
//! - [`cli`] - the `xlr` command line
//! - [`config`] - engine configuration (`~/.xebialabs/xlr.toml`)
//! - [`constants`] - format versions and well-known names
//! - [`core`] - error types
//! - [`utils`] - path validation and file helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use xl_render::config::EngineConfig;
//! use xl_render::functions::FunctionRegistry;
//! use xl_render::targets::{DirectoryTransport, apply_files};
//! use xl_render::values::ValueMap;
//! use std::path::PathBuf;
//!
//! # fn example() -> xl_render::core::Result<()> {
//! let config = EngineConfig::load()?;
//! let functions = FunctionRegistry::with_builtins();
//! let mut transport = DirectoryTransport::new("payloads");
//! let env: Vec<(String, String)> = std::env::vars().collect();
//!
//! let summary = apply_files(
//!     &config,
//!     &[PathBuf::from("xebialabs.yaml")],
//!     &ValueMap::new(),
//!     &env,
//!     &functions,
//!     &mut transport,
//! )?;
//! println!("{} documents applied", summary.documents);
//! # Ok(())
//! # }
//! ```

pub mod blueprint;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod document;
pub mod functions;
pub mod imports;
pub mod substitute;
pub mod targets;
pub mod utils;
pub mod values;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
