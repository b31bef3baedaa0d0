//! Blueprint instantiation
//!
//! A blueprint is a directory of template files plus a `blueprint.yaml`
//! declaring the variables they use. Generating it:
//!
//! 1. [`document`] parses and validates the metadata file
//! 2. [`prepare`] resolves every variable, asking a [`Prompter`] when needed
//! 3. the user confirms (unless `skip-final-prompt` is set)
//! 4. [`render`] writes `values.xlvals`, `secrets.xlvals`, `.gitignore` and
//!    every template file whose conditions hold
//!
//! Nothing is written before step 3 succeeds.

pub mod document;
pub mod prepare;
pub mod prompt;
pub mod render;
pub mod repository;
pub mod variable;

pub use document::{BLUEPRINT_FILE_NAMES, BlueprintDocument, TemplateFile, parse_blueprint};
pub use prepare::{PreparedData, prepare_template_data};
pub use prompt::{Answer, Prompter, Question, ScriptedPrompter, validate_answer};
pub use repository::{BlueprintRepository, LocalBlueprintRepository};
pub use variable::{VarField, Variable, VariableType};

use crate::config::EngineConfig;
use crate::core::{Result, XlError};
use crate::functions::FunctionRegistry;
use crate::utils::ensure_dir;
use prompt::{FINAL_PROMPT_MESSAGE, FINAL_PROMPT_NAME};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a blueprint run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBlueprint {
    /// Resolved variables
    pub data: PreparedData,
    /// Every file written, value files first
    pub written: Vec<PathBuf>,
}

/// Reads and parses the metadata file of `repository`.
///
/// Returns the metadata file name together with the parsed document.
pub fn load_blueprint(repository: &dyn BlueprintRepository, entries: &[String]) -> Result<(String, BlueprintDocument)> {
    let name = BLUEPRINT_FILE_NAMES
        .iter()
        .find(|name| entries.iter().any(|entry| entry == *name))
        .ok_or_else(|| XlError::BlueprintNotFound {
            location: repository.location(),
        })?;

    let bytes = repository.get_file_contents(name)?;
    let content = String::from_utf8(bytes).map_err(|_| XlError::InvalidBlueprint {
        reason: format!("{name} is not valid UTF-8"),
    })?;
    debug!("[cmd] Reading Blueprint from {}", repository.location());
    Ok(((*name).to_string(), parse_blueprint(&content)?))
}

/// Generates the blueprint in `repository` into `output_dir`.
///
/// # Errors
///
/// - blueprint and variable validation errors, before anything is asked
/// - prompt and `!fn` errors while resolving variables
/// - [`XlError::BlueprintCancelled`] when the final confirmation is declined
/// - file system and template errors while writing
pub fn generate_blueprint(
    config: &EngineConfig,
    repository: &dyn BlueprintRepository,
    prompter: &mut dyn Prompter,
    functions: &FunctionRegistry,
    output_dir: &Path,
) -> Result<GeneratedBlueprint> {
    let entries = repository.list_entries()?;
    let (metadata_file, mut blueprint) = load_blueprint(repository, &entries)?;

    let files = match blueprint.files.take() {
        Some(files) => files,
        None => entries
            .iter()
            .filter(|entry| **entry != metadata_file)
            .map(TemplateFile::new)
            .collect(),
    };

    let data = prepare_template_data(&mut blueprint.variables, prompter, functions)?;

    if !config.skip_final_prompt {
        let question = Question::Confirm {
            name: FINAL_PROMPT_NAME.to_string(),
            message: FINAL_PROMPT_MESSAGE.to_string(),
            default: true,
        };
        let confirmed = match prompter.ask(&question)? {
            Answer::Bool(value) => value,
            Answer::Text(text) => variable::parse_bool(&text)?,
        };
        if !confirmed {
            return Err(XlError::BlueprintCancelled);
        }
    }

    ensure_dir(output_dir)?;
    let mut written = render::write_value_files(&data, output_dir)?;
    written.extend(render::render_files(
        repository,
        &files,
        &blueprint.variables,
        &data,
        functions,
        &config.template_suffix,
        output_dir,
    )?);

    info!("Generated {} files in {}", written.len(), output_dir.display());
    Ok(GeneratedBlueprint { data, written })
}
