//! Configuration loading for webvalidator.
//!
//! The config file lives at `~/.webvalidator/config.toml`. A missing file is
//! not an error: every field has a default.
//!
//! ```toml
//! [validator]
//! endpoint = "https://validator.w3.org/nu/?out=json"
//! timeout_seconds = 60
//! accept_invalid_certs = true
//!
//! [editor]
//! show_popup = true
//! validate_on_save = false
//! ```

mod settings;

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use settings::{
    ClientSettings, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, EditorSettings, EditorSettingsPatch,
};

const CONFIG_DIR: &str = ".webvalidator";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct WebValidatorConfig {
    pub validator: Option<ValidatorSection>,
    pub editor: Option<EditorSettingsPatch>,
}

/// `[validator]` table: how to reach the validation service.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ValidatorSection {
    /// Service URL. `${VAR}` references are expanded from the environment.
    pub endpoint: Option<String>,
    /// Whole-request timeout. `0` disables it.
    pub timeout_seconds: Option<u64>,
    /// Accept self-signed and otherwise invalid certificates. Default: true.
    pub accept_invalid_certs: Option<bool>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid validator endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl WebValidatorConfig {
    /// Load the config from its default location.
    ///
    /// Returns `Ok(None)` when no home directory is known or the file does
    /// not exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Editor settings with file overrides applied over the defaults.
    #[must_use]
    pub fn editor_settings(&self) -> EditorSettings {
        let mut settings = EditorSettings::default();
        if let Some(patch) = &self.editor {
            settings.apply(patch);
        }
        settings
    }

    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        ClientSettings::resolve(self.validator.as_ref())
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Expand `${VAR}` references. Unknown variables expand to nothing; an
/// unterminated `${` is kept verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
