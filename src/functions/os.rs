//! Built-in `os` function domain

use super::{FnCall, FunctionDomain};
use anyhow::{Context, bail};

/// Host information reachable as `!fn os.<module>()`
///
/// | module                 | result                                               |
/// |------------------------|------------------------------------------------------|
/// | `_operatingsystem`     | operating system name (`linux`, `macos`, `windows`)   |
/// | `_defaultapiserverurl` | local Kubernetes API URL on desktop platforms, else empty |
/// | `getcertfilelocation`  | `cert.crt` in the working directory                  |
/// | `getkeyfilelocation`   | `cert.key` in the working directory                  |
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFunctions;

impl OsFunctions {
    fn default_api_server_url(os: &str) -> String {
        match os {
            "windows" | "macos" => "https://host.docker.internal:6443".to_string(),
            _ => String::new(),
        }
    }

    fn working_dir_file(name: &str) -> anyhow::Result<String> {
        let dir = std::env::current_dir().context("Failed to read the current directory")?;
        Ok(dir.join(name).display().to_string())
    }
}

impl FunctionDomain for OsFunctions {
    fn call(&self, call: &FnCall) -> anyhow::Result<Vec<String>> {
        let value = match call.module.to_lowercase().as_str() {
            "_operatingsystem" => std::env::consts::OS.to_string(),
            "_defaultapiserverurl" => Self::default_api_server_url(std::env::consts::OS),
            "getcertfilelocation" => Self::working_dir_file("cert.crt")?,
            "getkeyfilelocation" => Self::working_dir_file("cert.key")?,
            other => bail!("{other} is not a valid OS module"),
        };
        Ok(vec![value])
    }
}
