//! Variable resolution
//!
//! Variables are resolved once, in declaration order, since a variable may
//! depend on the answer given to an earlier `Confirm`. For each variable:
//!
//! 1. compute the default (literal or `!fn`, `false` for a bare `Confirm`)
//! 2. skip with the default when its `dependsOnTrue`/`dependsOnFalse` guard fails
//! 3. skip with the preset `value` when it resolves to something non-empty
//! 4. otherwise ask the [`Prompter`] and validate the answer
//!
//! Answers of secret variables go to [`PreparedData::secrets`] and templates see
//! a `!value <name>` reference instead of the secret itself.

use super::prompt::{Answer, Prompter, Question, validate_answer};
use super::variable::{Variable, VariableType, evaluate_condition, parse_bool};
use crate::core::{Result, XlError};
use crate::functions::FunctionRegistry;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of variable resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedData {
    /// Every resolved variable, as seen by templates
    pub template_data: BTreeMap<String, String>,
    /// Non-secret answers marked `saveInXlVals`
    pub values: BTreeMap<String, String>,
    /// Secret answers
    pub secrets: BTreeMap<String, String>,
}

impl PreparedData {
    fn save(&mut self, variable: &Variable, data: String) {
        let name = variable.name.val.clone();
        if variable.is_secret() {
            debug!("[dataPrep] Saving secret parameter [{name}] = ***");
            self.template_data.insert(name.clone(), format!("!value {name}"));
            self.secrets.insert(name, data);
        } else {
            debug!("[dataPrep] Saving parameter [{name}] = {data}");
            if variable.save_in_xl_vals.bool {
                self.values.insert(name.clone(), data.clone());
            }
            self.template_data.insert(name, data);
        }
    }
}

/// Resolves `variables` in order, asking `prompter` for missing answers.
///
/// Answers to `Confirm` questions are written back to the variable's `value`
/// so later conditions see them.
pub fn prepare_template_data(
    variables: &mut [Variable],
    prompter: &mut dyn Prompter,
    functions: &FunctionRegistry,
) -> Result<PreparedData> {
    let mut data = PreparedData::default();

    for index in 0..variables.len() {
        let variable = &variables[index];
        let default = variable.default_value(functions);

        if !variable.depends_on_true.is_empty()
            && !evaluate_condition(&variable.depends_on_true, variables, functions)?
        {
            debug!(
                "[dataPrep] Skipping question for parameter [{}] because DependsOnTrue [{}] value is false",
                variable.name.val, variable.depends_on_true.val
            );
            data.save(variable, default);
            continue;
        }
        if !variable.depends_on_false.is_empty()
            && evaluate_condition(&variable.depends_on_false, variables, functions)?
        {
            debug!(
                "[dataPrep] Skipping question for parameter [{}] because DependsOnFalse [{}] value is true",
                variable.name.val, variable.depends_on_false.val
            );
            data.save(variable, default);
            continue;
        }

        if !variable.value.is_empty() {
            let preset = variable.preset_value(functions);
            if !preset.is_empty() {
                debug!("[dataPrep] Skipping question for parameter [{}] because a value is present", variable.name.val);
                data.save(variable, preset);
                continue;
            }
            debug!("[dataPrep] Parsed value for parameter [{}] is empty, asking", variable.name.val);
        }

        debug!(
            "[dataPrep] Processing template variable [Name: {}, Type: {}]",
            variable.name.val, variable.kind.val
        );
        let answer = ask_variable(variable, &default, prompter, functions)?;

        if variable.variable_type() == Some(VariableType::Confirm) {
            let confirmed = parse_bool(&answer)?;
            variables[index].value.bool = confirmed;
        }
        data.save(&variables[index], answer);
    }

    Ok(data)
}

/// Builds the question for `variable`.
pub fn question_for(variable: &Variable, default: &str, functions: &FunctionRegistry) -> Result<Question> {
    let name = variable.name.val.clone();
    let text = |fallback: String| {
        if variable.description.is_empty() {
            fallback
        } else {
            variable.description.val.clone()
        }
    };

    Ok(match variable.variable_type() {
        Some(VariableType::Select) => Question::Select {
            message: text(format!("Select value for {name}?")),
            options: variable.resolved_options(functions)?,
            default: default.to_string(),
            name,
        },
        Some(VariableType::Confirm) => Question::Confirm {
            message: text(format!("{name}?")),
            default: parse_bool(default).unwrap_or(false),
            name,
        },
        _ => Question::Input {
            message: text(format!("What is the value of {name}?")),
            default: default.to_string(),
            secret: variable.is_secret(),
            name,
        },
    })
}

fn ask_variable(
    variable: &Variable,
    default: &str,
    prompter: &mut dyn Prompter,
    functions: &FunctionRegistry,
) -> Result<String> {
    let question = question_for(variable, default, functions)?;
    let rejected = |reason: String| XlError::PromptValidation {
        name: variable.name.val.clone(),
        reason,
    };

    match (&question, prompter.ask(&question)?) {
        (Question::Confirm { .. }, answer) => Ok(answer.into_text()),
        (Question::Input { secret: true, .. }, answer) => {
            let answer = answer.into_text();
            validate_answer(&answer, &variable.pattern.val, true).map_err(rejected)?;
            if answer.is_empty() {
                debug!("[input] Got empty response for secret field '{}', using the default", variable.name.val);
                return Ok(default.to_string());
            }
            Ok(answer)
        }
        (Question::Select { options, .. }, answer) => {
            let answer = answer.into_text();
            validate_answer(&answer, &variable.pattern.val, false).map_err(rejected)?;
            if !options.contains(&answer) {
                return Err(rejected(format!("[{answer}] is not one of the options {options:?}")));
            }
            Ok(answer)
        }
        (Question::Input { .. }, Answer::Bool(value)) => Ok(value.to_string()),
        (Question::Input { .. }, Answer::Text(answer)) => {
            validate_answer(&answer, &variable.pattern.val, false).map_err(rejected)?;
            Ok(answer)
        }
    }
}
