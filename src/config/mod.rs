//! Configuration management for xl-render
//!
//! The engine reads one optional TOML file, `~/.xebialabs/xlr.toml` (or the path
//! given with `--config`), into an [`EngineConfig`]. Nothing is stored in global
//! state: the CLI loads the configuration and passes it to every entry point.

pub mod engine;

pub use engine::{EngineConfig, XlDeployConfig, XlReleaseConfig, home_values_dir};
