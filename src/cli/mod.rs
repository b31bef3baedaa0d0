//! Command-line interface for `xlr`
//!
//! The CLI only parses arguments and wires the engine's ports to terminal
//! implementations:
//!
//! - `apply` - resolves YAML files and hands every document to a
//!   [`DirectoryTransport`](crate::targets::DirectoryTransport)
//! - `blueprint` - instantiates a local blueprint, asking questions on the terminal
//! - `config` - shows or creates the engine configuration
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//! - `--config` - configuration file instead of `~/.xebialabs/xlr.toml`
//!
//! # Example
//!
//! ```bash
//! xlr apply -f xebialabs.yaml --values env=dev --output-dir payloads
//! xlr blueprint -b blueprints/microservice -o generated
//! ```

mod apply;
mod blueprint;
mod config;
pub mod prompter;

use crate::config::EngineConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resolve devops-as-code YAML and generate blueprints
#[derive(Parser, Debug)]
#[command(name = "xlr", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "XLR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve YAML files and write the payloads for their target systems
    Apply(apply::ApplyCommand),

    /// Generate files from a blueprint
    Blueprint(blueprint::BlueprintCommand),

    /// Show or create the configuration file
    Config(config::ConfigCommand),
}

impl Cli {
    /// Runs the parsed command.
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        let creating = matches!(&self.command, Commands::Config(cmd) if cmd.creates_file());
        let config = match self.config.as_deref() {
            Some(path) if creating && !path.exists() => EngineConfig::default(),
            path => EngineConfig::load_with_optional(path).context("Failed to load configuration")?,
        };

        match self.command {
            Commands::Apply(cmd) => cmd.execute(&config),
            Commands::Blueprint(cmd) => cmd.execute(&config),
            Commands::Config(cmd) => cmd.execute(&config, self.config.as_deref()),
        }
    }

    /// Filter level implied by `--verbose` / `--quiet`
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_level()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
