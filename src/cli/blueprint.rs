use super::prompter::TerminalPrompter;
use crate::blueprint::{LocalBlueprintRepository, Prompter, ScriptedPrompter, generate_blueprint};
use crate::config::EngineConfig;
use crate::functions::FunctionRegistry;
use crate::values::parse_override;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BlueprintCommand {
    /// Directory containing blueprint.yaml
    #[arg(short = 'b', long = "blueprint")]
    blueprint: PathBuf,

    /// Directory the files are generated into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Answer for a variable, repeatable
    #[arg(short, long = "answer", value_name = "NAME=VALUE")]
    answers: Vec<String>,

    /// Never ask; unanswered questions take their defaults
    #[arg(long)]
    use_defaults: bool,

    /// Generate without the final confirmation
    #[arg(long)]
    skip_final_prompt: bool,
}

impl BlueprintCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let mut config = config.clone();
        config.skip_final_prompt |= self.skip_final_prompt;

        let mut scripted = ScriptedPrompter::new();
        for raw in &self.answers {
            let (name, value) = parse_override(raw)?;
            scripted = scripted.answer(name, value);
        }

        let repository = LocalBlueprintRepository::new(&self.blueprint)?;
        let functions = FunctionRegistry::with_builtins();

        let mut terminal;
        let prompter: &mut dyn Prompter = if self.use_defaults {
            &mut scripted
        } else {
            terminal = TerminalPrompter::stdio(scripted);
            &mut terminal
        };

        let generated = generate_blueprint(&config, &repository, prompter, &functions, &self.output)?;

        println!(
            "{} {} files in {}",
            "Generated".green().bold(),
            generated.written.len(),
            self.output.display()
        );
        Ok(())
    }
}
