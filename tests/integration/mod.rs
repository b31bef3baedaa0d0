//! Integration test suite for xl-render
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **apply**: document processing through the public API (imports, tags, bundles)
//! - **blueprint**: variable resolution and file generation
//! - **cli**: the `xlr` binary

#[path = "../common/mod.rs"]
mod common;

mod apply;
mod blueprint;
mod cli;
