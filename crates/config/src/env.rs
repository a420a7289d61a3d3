//! Environment variable parsing and env-to-settings merging.
//!
//! Env parsing is strict: a variable that is present but empty or malformed
//! fails fast. Secret values never appear in error metadata.

use crate::schema::{EngineSettings, ValidatedEngineSettings};
use confhub_shared::{ErrorCode, ErrorEnvelope, SecretString, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: remote service base URL.
pub const ENV_REMOTE_BASE_URL: &str = "CONFHUB_REMOTE_BASE_URL";
/// Env var: remote API key (secret).
pub const ENV_REMOTE_API_KEY: &str = "CONFHUB_REMOTE_API_KEY";
/// Env var: remote request timeout in milliseconds.
pub const ENV_REMOTE_TIMEOUT_MS: &str = "CONFHUB_REMOTE_TIMEOUT_MS";
/// Env var: remote master switch.
pub const ENV_REMOTE_ENABLED: &str = "CONFHUB_REMOTE_ENABLED";
/// Env var: project id for the global configuration.
pub const ENV_PROJECT_ID: &str = "CONFHUB_PROJECT_ID";
/// Env var: directory of the global configuration.
pub const ENV_DEFAULT_DIR: &str = "CONFHUB_DEFAULT_DIR";
/// Env var: backup before rewrite (true/false).
pub const ENV_BACKUPS: &str = "CONFHUB_BACKUPS";

const ALL_ENV_VARS: [&str; 7] = [
    ENV_REMOTE_BASE_URL,
    ENV_REMOTE_API_KEY,
    ENV_REMOTE_TIMEOUT_MS,
    ENV_REMOTE_ENABLED,
    ENV_PROJECT_ID,
    ENV_DEFAULT_DIR,
    ENV_BACKUPS,
];

/// Typed env-derived overrides for `EngineSettings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineEnv {
    /// Override for `remote.baseUrl`.
    pub remote_base_url: Option<Box<str>>,
    /// Override for `remote.apiKey`.
    pub remote_api_key: Option<SecretString>,
    /// Override for `remote.timeoutMs`.
    pub remote_timeout_ms: Option<u64>,
    /// Override for `remote.enabled`.
    pub remote_enabled: Option<bool>,
    /// Override for `remote.defaultProjectId`.
    pub project_id: Option<Box<str>>,
    /// Override for `storage.defaultDir`.
    pub default_dir: Option<Box<str>>,
    /// Override for `storage.backups`.
    pub backups: Option<bool>,
}

impl EngineEnv {
    /// Parse env overrides from a map of variables.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            remote_base_url: parse_optional_url_string(map, ENV_REMOTE_BASE_URL)?,
            remote_api_key: parse_optional_secret(map, ENV_REMOTE_API_KEY)?,
            remote_timeout_ms: parse_optional_u64(map, ENV_REMOTE_TIMEOUT_MS)?,
            remote_enabled: parse_optional_bool(map, ENV_REMOTE_ENABLED)?,
            project_id: parse_optional_trimmed_string(map, ENV_PROJECT_ID)?,
            default_dir: parse_optional_trimmed_string(map, ENV_DEFAULT_DIR)?,
            backups: parse_optional_bool(map, ENV_BACKUPS)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }

    /// Returns true when no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply env overrides to base settings (env wins over file/default values).
pub fn apply_env_overrides(
    base: EngineSettings,
    env: &EngineEnv,
) -> Result<ValidatedEngineSettings, ErrorEnvelope> {
    let mut settings = base;

    if let Some(base_url) = env.remote_base_url.as_ref() {
        settings.remote.base_url = Some(base_url.clone());
    }
    if let Some(api_key) = env.remote_api_key.as_ref() {
        settings.remote.api_key = Some(api_key.expose().into());
    }
    if let Some(timeout_ms) = env.remote_timeout_ms {
        settings.remote.timeout_ms = timeout_ms;
    }
    if let Some(enabled) = env.remote_enabled {
        settings.remote.enabled = enabled;
    }
    if let Some(project_id) = env.project_id.as_ref() {
        settings.remote.default_project_id = Some(project_id.clone());
    }
    if let Some(default_dir) = env.default_dir.as_ref() {
        settings.storage.default_dir = Some(default_dir.clone());
    }
    if let Some(backups) = env.backups {
        settings.storage.backups = backups;
    }

    settings.validate_and_normalize().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be an http(s) URL"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_if_secret(var, &value)),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.into()))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed)))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(value) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    let invalid = || EnvParseError::InvalidUrl {
        var,
        value: value.to_string(),
    };
    let parsed = Url::parse(&value).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(Some(value)),
        _ => Err(invalid()),
    }
}
