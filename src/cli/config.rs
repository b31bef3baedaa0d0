use crate::config::EngineConfig;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Write the default configuration file
    #[arg(long)]
    init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    force: bool,
}

impl ConfigCommand {
    pub fn creates_file(&self) -> bool {
        self.init
    }

    pub fn execute(self, config: &EngineConfig, path: Option<&Path>) -> Result<()> {
        if !self.init {
            print!("{}", config.to_toml()?);
            return Ok(());
        }

        let Some(path) = path.map(Path::to_path_buf).or_else(EngineConfig::default_path) else {
            bail!("Cannot determine the home directory, pass --config");
        };
        if path.exists() && !self.force {
            bail!("{} already exists, use --force to overwrite", path.display());
        }

        EngineConfig::default().save_to(&path)?;
        println!("{} {}", "Created".green().bold(), path.display());
        Ok(())
    }
}
