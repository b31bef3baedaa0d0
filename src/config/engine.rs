//! Engine configuration (`~/.xebialabs/xlr.toml`)
//!
//! ```toml
//! value-prefix = "XL_VALUE_"
//! template-suffix = ".tmpl"
//! include-home-values = true
//! skip-final-prompt = false
//!
//! [xl-deploy]
//! applications-home = "Applications/Team"
//! environments-home = "Environments/Team"
//! infrastructure-home = "Infrastructure/Team"
//! configuration-home = "Configuration/Team"
//!
//! [xl-release]
//! home = "Team"
//! ```
//!
//! Every key is optional. The configuration is loaded once per invocation and
//! passed explicitly to the engine entry points.

use crate::constants::{CONFIG_FILE_NAME, XEBIALABS_DIR};
use crate::core::{Result, XlError};
use crate::utils::{atomic_write, read_text_file};
use crate::values::DEFAULT_ENV_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default suffix marking blueprint files rendered as templates
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".tmpl";

/// Settings threaded through document processing and blueprint generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Prefix of environment variables contributing values
    pub value_prefix: String,

    /// Suffix of blueprint files rendered as templates
    pub template_suffix: String,

    /// Whether `~/.xebialabs/*.xlvals` files join the value context
    pub include_home_values: bool,

    /// Skip the "Confirm to generate blueprint files?" question
    pub skip_final_prompt: bool,

    /// XL Deploy target settings
    pub xl_deploy: XlDeployConfig,

    /// XL Release target settings
    pub xl_release: XlReleaseConfig,
}

/// Default metadata homes for `xl-deploy/v1` documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct XlDeployConfig {
    /// Added as `Applications-home` when missing
    pub applications_home: String,
    /// Added as `Environments-home` when missing
    pub environments_home: String,
    /// Added as `Infrastructure-home` when missing
    pub infrastructure_home: String,
    /// Added as `Configuration-home` when missing
    pub configuration_home: String,
}

/// Default metadata home for `xl-release/v1` documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct XlReleaseConfig {
    /// Added as `home` when missing
    pub home: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            value_prefix: DEFAULT_ENV_PREFIX.to_string(),
            template_suffix: DEFAULT_TEMPLATE_SUFFIX.to_string(),
            include_home_values: true,
            skip_final_prompt: false,
            xl_deploy: XlDeployConfig::default(),
            xl_release: XlReleaseConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_with_optional(None)
    }

    /// Loads from `path` if given, else from the default location.
    ///
    /// A missing file yields the default configuration; an explicitly given
    /// path that does not exist is an error.
    pub fn load_with_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Loads the configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = read_text_file(path)?;
        toml::from_str(&content).map_err(|e| XlError::ConfigError {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Writes the configuration as TOML.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        atomic_write(path, self.to_toml()?.as_bytes())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| XlError::ConfigError {
            message: format!("Failed to serialize configuration: {e}"),
        })
    }

    /// `~/.xebialabs/xlr.toml`, if the home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        home_values_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    /// Directory whose `.xlvals` files apply to every document, if enabled.
    pub fn home_values_dir(&self) -> Option<PathBuf> {
        if self.include_home_values {
            home_values_dir()
        } else {
            None
        }
    }
}

/// `~/.xebialabs`
pub fn home_values_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(XEBIALABS_DIR))
}
