use crate::config::EngineConfig;
use crate::functions::FunctionRegistry;
use crate::targets::{DirectoryTransport, apply_files};
use crate::values::{ValueMap, parse_override};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ApplyCommand {
    /// YAML file to apply, repeatable
    #[arg(short = 'f', long = "file", required = true)]
    files: Vec<PathBuf>,

    /// Value override, repeatable
    #[arg(long = "values", value_name = "KEY=VALUE")]
    values: Vec<String>,

    /// Directory receiving one payload file per document
    #[arg(short, long, default_value = "xl-apply-output")]
    output_dir: PathBuf,
}

impl ApplyCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let overrides = self
            .values
            .iter()
            .map(|raw| parse_override(raw))
            .collect::<crate::core::Result<ValueMap>>()?;
        let env: Vec<(String, String)> = std::env::vars().collect();
        let functions = FunctionRegistry::with_builtins();
        let mut transport = DirectoryTransport::new(&self.output_dir);

        let summary = apply_files(config, &self.files, &overrides, &env, &functions, &mut transport)?;

        println!(
            "{} {} documents from {} files into {}",
            "Applied".green().bold(),
            summary.documents,
            summary.files,
            transport.dir().display()
        );
        Ok(())
    }
}
