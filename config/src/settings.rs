//! Resolved settings: optional config fields turned into concrete values.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::{ConfigError, ValidatorSection, expand_env_vars};

/// The public W3C Nu HTML Checker, JSON output.
pub const DEFAULT_ENDPOINT: &str = "https://validator.w3.org/nu/?out=json";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings the editor user can toggle at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    /// Show result dialogs (success message, summary prompt).
    pub show_popup: bool,
    /// Start a validation whenever a supported document is saved.
    pub validate_on_save: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            show_popup: true,
            validate_on_save: false,
        }
    }
}

impl EditorSettings {
    /// Overwrite the fields present in `patch`, keep the rest.
    pub fn apply(&mut self, patch: &EditorSettingsPatch) {
        if let Some(show_popup) = patch.show_popup {
            self.show_popup = show_popup;
        }
        if let Some(validate_on_save) = patch.validate_on_save {
            self.validate_on_save = validate_on_save;
        }
    }
}

/// Partial editor settings.
///
/// Accepts the snake_case keys of the `[editor]` config table and the
/// camelCase keys editors send in `workspace/didChangeConfiguration`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EditorSettingsPatch {
    #[serde(default, alias = "showPopup")]
    pub show_popup: Option<bool>,
    #[serde(default, alias = "validateOnSave")]
    pub validate_on_save: Option<bool>,
}

/// Everything the HTTP client needs, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: Url,
    /// `None` means no timeout beyond the transport's own.
    pub timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            accept_invalid_certs: true,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientSettings {
    pub fn resolve(section: Option<&ValidatorSection>) -> Result<Self, ConfigError> {
        let Some(section) = section else {
            return Ok(Self::default());
        };

        let endpoint = match section.endpoint.as_deref() {
            Some(raw) => parse_endpoint(&expand_env_vars(raw))?,
            None => default_endpoint(),
        };

        let timeout = match section.timeout_seconds {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        };

        Ok(Self {
            endpoint,
            timeout,
            accept_invalid_certs: section.accept_invalid_certs.unwrap_or(true),
            user_agent: section
                .user_agent
                .clone()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(default_user_agent),
        })
    }

    /// Settings pointing at another endpoint, everything else default.
    /// Mostly useful for tests and local validator instances.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            ..Self::default()
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!(
            "scheme '{scheme}' not allowed; only http and https are supported"
        ))),
    }
}

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL")
}

fn default_user_agent() -> String {
    format!("webvalidator/{}", env!("CARGO_PKG_VERSION"))
}
