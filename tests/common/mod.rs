//! Shared fixtures for the xl-render integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xl_render::blueprint::{Answer, Prompter, Question, ScriptedPrompter};
use xl_render::functions::{FnCall, FunctionDomain, FunctionRegistry};
use xl_render::targets::Transport;

/// A temporary working directory with an isolated configuration file
pub struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
    config: PathBuf,
}

impl TestProject {
    /// Creates the project with a configuration ignoring `~/.xebialabs`
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root)?;
        let config = temp_dir.path().join("xlr.toml");
        fs::write(&config, "include-home-values = false\n")?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
            config,
        })
    }

    /// Project root
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Configuration file passed to the binary
    pub fn config_path(&self) -> &Path {
        &self.config
    }

    /// Writes a file below the project root
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Reads a file below the project root
    pub fn read(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(name))?)
    }

    /// The `xlr` binary running in the project root
    pub fn xlr(&self) -> Command {
        let mut cmd = Command::cargo_bin("xlr").expect("xlr binary is built");
        cmd.current_dir(&self.root).env("XLR_CONFIG", &self.config).env_remove("RUST_LOG");
        cmd
    }
}

/// One payload captured by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct SentPayload {
    pub path: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl SentPayload {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport keeping every payload in memory
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<SentPayload>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, path: &str, content_type: &str, body: &[u8]) -> anyhow::Result<()> {
        self.sent.push(SentPayload {
            path: path.to_string(),
            content_type: content_type.to_string(),
            body: body.to_vec(),
        });
        Ok(())
    }
}

/// `test` function domain with canned results
///
/// - `test.regions()` - `["eu-west-1", "us-east-1"]`
/// - `test.flag(x)` - `[x]`
/// - `test.echo(a, b)` - `["a-b"]`
pub struct FixedFunctions;

impl FunctionDomain for FixedFunctions {
    fn call(&self, call: &FnCall) -> anyhow::Result<Vec<String>> {
        match call.module.as_str() {
            "regions" => Ok(vec!["eu-west-1".to_string(), "us-east-1".to_string()]),
            "flag" => Ok(call.params.clone()),
            "echo" => Ok(vec![call.params.join("-")]),
            other => anyhow::bail!("{other} is not a test module"),
        }
    }
}

/// Registry with the `test` domain registered
pub fn test_functions() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register("test", FixedFunctions);
    registry
}

/// Prompter recording every question before answering from a script
#[derive(Debug, Default)]
pub struct RecordingPrompter {
    pub script: ScriptedPrompter,
    pub questions: Vec<Question>,
}

impl RecordingPrompter {
    pub fn new(script: ScriptedPrompter) -> Self {
        Self {
            script,
            questions: Vec::new(),
        }
    }

    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.name() == name)
    }
}

impl Prompter for RecordingPrompter {
    fn ask(&mut self, question: &Question) -> xl_render::core::Result<Answer> {
        self.questions.push(question.clone());
        self.script.ask(question)
    }
}
