//! Questions asked while resolving blueprint variables
//!
//! The engine never reads a terminal. It builds a [`Question`], hands it to a
//! [`Prompter`] and validates the [`Answer`] with [`validate_answer`].

use super::variable::parse_bool;
use crate::core::{Result, XlError};
use regex::Regex;
use std::collections::BTreeMap;

/// Name used for the final "generate files?" question
pub const FINAL_PROMPT_NAME: &str = "final-prompt";

/// Text of the final confirmation question
pub const FINAL_PROMPT_MESSAGE: &str = "Confirm to generate blueprint files?";

/// A question for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    /// Free text; `secret` inputs should not echo
    Input {
        name: String,
        message: String,
        default: String,
        secret: bool,
    },
    /// One of `options`
    Select {
        name: String,
        message: String,
        options: Vec<String>,
        default: String,
    },
    /// Yes or no
    Confirm {
        name: String,
        message: String,
        default: bool,
    },
}

impl Question {
    /// Variable the question is about
    pub fn name(&self) -> &str {
        match self {
            Self::Input { name, .. } | Self::Select { name, .. } | Self::Confirm { name, .. } => name,
        }
    }

    /// Text shown to the user
    pub fn message(&self) -> &str {
        match self {
            Self::Input { message, .. } | Self::Select { message, .. } | Self::Confirm { message, .. } => message,
        }
    }
}

/// An answer to a [`Question`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answer to `Input` or `Select`
    Text(String),
    /// Answer to `Confirm`
    Bool(bool),
}

impl Answer {
    /// Text form of the answer, `true`/`false` for booleans
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Bool(value) => value.to_string(),
        }
    }
}

/// Source of answers
pub trait Prompter {
    /// Asks one question and waits for the answer.
    fn ask(&mut self, question: &Question) -> Result<Answer>;
}

/// Checks an answer against the variable's rules.
///
/// Empty answers are rejected unless `allow_empty`, in which case they skip
/// the pattern. A non-empty `pattern` must match the whole answer.
pub fn validate_answer(answer: &str, pattern: &str, allow_empty: bool) -> std::result::Result<(), String> {
    if answer.is_empty() {
        return if allow_empty { Ok(()) } else { Err("Value is required".to_string()) };
    }

    if !pattern.is_empty() {
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| e.to_string())?;
        if !anchored.is_match(answer) {
            return Err(format!("Value should match pattern {pattern}"));
        }
    }
    Ok(())
}

/// Prompter answering from a fixed table, keyed by variable name
///
/// Unanswered questions take their default; a `Select` without a default takes
/// its first option. Every question asked is recorded.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: BTreeMap<String, String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    /// Creates a prompter without answers
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an answer for the variable `name`
    #[must_use]
    pub fn answer(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers.insert(name.into(), value.into());
        self
    }

    /// Names of the variables with a scripted answer
    pub fn answered_names(&self) -> Vec<String> {
        self.answers.keys().cloned().collect()
    }

    /// Names of the questions asked so far, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &Question) -> Result<Answer> {
        self.asked.push(question.name().to_string());
        let scripted = self.answers.get(question.name()).cloned();

        Ok(match question {
            Question::Input { default, .. } => Answer::Text(scripted.unwrap_or_else(|| default.clone())),
            Question::Select { options, default, .. } => Answer::Text(scripted.unwrap_or_else(|| {
                if default.is_empty() {
                    options.first().cloned().unwrap_or_default()
                } else {
                    default.clone()
                }
            })),
            Question::Confirm { name, default, .. } => match scripted {
                Some(text) => Answer::Bool(parse_bool(&text).map_err(|_| XlError::PromptValidation {
                    name: name.clone(),
                    reason: format!("expected a boolean, got [{text}]"),
                })?),
                None => Answer::Bool(*default),
            },
        })
    }
}
