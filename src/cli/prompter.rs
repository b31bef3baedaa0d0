//! Line-based terminal prompter

use crate::blueprint::{Answer, Prompter, Question, ScriptedPrompter};
use crate::blueprint::variable::parse_bool;
use crate::core::{Result, XlError};
use colored::Colorize;
use std::io::{BufRead, IsTerminal, Write};

/// Reads one secret line without echoing it
type SecretReader = fn() -> std::io::Result<String>;

/// Hint shown when a secret is read from a plain stream
const VISIBLE_SECRET_HINT: &str = "(input is not hidden)";

/// Asks questions on a text stream
///
/// Questions answered in `preset` are not shown. Secret answers go through the
/// secret reader when one is set; otherwise they are read from `input` like any
/// other line and the question says the input is visible.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
    preset: ScriptedPrompter,
    preset_names: Vec<String>,
    secret_reader: Option<SecretReader>,
}

impl TerminalPrompter<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompter on stdin, writing questions to stderr
    ///
    /// Secrets are read with echo disabled when stdin is a terminal.
    pub fn stdio(preset: ScriptedPrompter) -> Self {
        let stdin = std::io::stdin();
        let hidden = stdin.is_terminal();
        let prompter = Self::new(stdin.lock(), std::io::stderr(), preset);
        if hidden {
            prompter.with_secret_reader(rpassword::read_password)
        } else {
            prompter
        }
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, preset: ScriptedPrompter) -> Self {
        let preset_names = preset.answered_names();
        Self {
            input,
            output,
            preset,
            preset_names,
            secret_reader: None,
        }
    }

    /// Reads secret answers with `reader` instead of `input`
    #[must_use]
    pub fn with_secret_reader(mut self, reader: SecretReader) -> Self {
        self.secret_reader = Some(reader);
        self
    }

    fn read_secret(&mut self, name: &str) -> Result<String> {
        match self.secret_reader {
            Some(reader) => {
                self.output.flush()?;
                Ok(reader()?.trim_end_matches(['\r', '\n']).to_string())
            }
            None => self.read_line(name),
        }
    }

    fn read_line(&mut self, name: &str) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(XlError::PromptValidation {
                name: name.to_string(),
                reason: "input closed before an answer was given".to_string(),
            });
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn ask(&mut self, question: &Question) -> Result<Answer> {
        if self.preset_names.iter().any(|n| n == question.name()) {
            return self.preset.ask(question);
        }

        let name = question.name().to_string();
        match question {
            Question::Input {
                message,
                default,
                secret,
                ..
            } => {
                if *secret {
                    if self.secret_reader.is_some() {
                        write!(self.output, "{} ", message.green())?;
                    } else {
                        write!(self.output, "{} {} ", message.green(), VISIBLE_SECRET_HINT.yellow())?;
                    }
                    return Ok(Answer::Text(self.read_secret(&name)?));
                }

                if default.is_empty() {
                    write!(self.output, "{} ", message.green())?;
                } else {
                    write!(self.output, "{} ({default}) ", message.green())?;
                }
                let line = self.read_line(&name)?;
                if line.is_empty() {
                    return Ok(Answer::Text(default.clone()));
                }
                Ok(Answer::Text(line))
            }
            Question::Select {
                message,
                options,
                default,
                ..
            } => {
                writeln!(self.output, "{}", message.green())?;
                for (i, option) in options.iter().enumerate() {
                    let marker = if option == default { "*" } else { " " };
                    writeln!(self.output, " {marker} {}) {option}", i + 1)?;
                }
                loop {
                    write!(self.output, "{} ", "Choice:".cyan())?;
                    let line = self.read_line(&name)?;
                    let line = line.trim();
                    if line.is_empty() {
                        let fallback = if default.is_empty() { options.first() } else { Some(default) };
                        return Ok(Answer::Text(fallback.cloned().unwrap_or_default()));
                    }
                    if let Some(option) = line.parse::<usize>().ok().and_then(|n| options.get(n.wrapping_sub(1))) {
                        return Ok(Answer::Text(option.clone()));
                    }
                    if options.iter().any(|o| o == line) {
                        return Ok(Answer::Text(line.to_string()));
                    }
                    writeln!(self.output, "{}", "Please pick one of the listed options".yellow())?;
                }
            }
            Question::Confirm { message, default, .. } => {
                let hint = if *default { "[Y/n]" } else { "[y/N]" };
                loop {
                    write!(self.output, "{} {hint} ", message.green())?;
                    let line = self.read_line(&name)?.trim().to_lowercase();
                    match line.as_str() {
                        "" => return Ok(Answer::Bool(*default)),
                        "y" | "yes" => return Ok(Answer::Bool(true)),
                        "n" | "no" => return Ok(Answer::Bool(false)),
                        other => {
                            if let Ok(value) = parse_bool(other) {
                                return Ok(Answer::Bool(value));
                            }
                            writeln!(self.output, "{}", "Please answer yes or no".yellow())?;
                        }
                    }
                }
            }
        }
    }
}
