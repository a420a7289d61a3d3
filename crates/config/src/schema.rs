//! Engine settings schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Secrets are wrapped in `SecretString` once validated.

use confhub_domain::ProjectId;
use confhub_shared::{ErrorCode, ErrorEnvelope, SecretString};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Current supported settings schema version.
pub const CURRENT_SETTINGS_VERSION: u32 = 1;

/// Default remote fetch timeout.
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5_000;
const REMOTE_TIMEOUT_MIN_MS: u64 = 100;
const REMOTE_TIMEOUT_MAX_MS: u64 = 120_000;

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EngineSettings {
    /// Schema version.
    pub version: u32,
    /// Remote configuration service.
    pub remote: RemoteSettings,
    /// Local file layout.
    pub storage: StorageSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: CURRENT_SETTINGS_VERSION,
            remote: RemoteSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

/// Remote configuration service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RemoteSettings {
    /// Master switch; when false every remote attempt fails immediately.
    pub enabled: bool,
    /// Service base URL (`http`/`https`). Unset disables the remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Box<str>>,
    /// Value of the `X-API-Key` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Box<str>>,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Project id used for the global configuration's remote fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_project_id: Option<Box<str>>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            api_key: None,
            timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            default_project_id: None,
        }
    }
}

/// Local file layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StorageSettings {
    /// Directory of the global configuration; the working directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_dir: Option<Box<str>>,
    /// INI file name.
    pub system_file_name: Box<str>,
    /// JSON file name.
    pub user_file_name: Box<str>,
    /// Write a timestamped backup before each rewrite.
    pub backups: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            default_dir: None,
            system_file_name: "system.conf".into(),
            user_file_name: "config.json".into(),
            backups: true,
        }
    }
}

impl EngineSettings {
    /// Validate and normalize the settings.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedEngineSettings, SettingsError> {
        if self.version != CURRENT_SETTINGS_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_SETTINGS_VERSION,
            });
        }

        normalize_optional_trimmed(&mut self.remote.base_url);
        normalize_optional_trimmed(&mut self.remote.api_key);
        normalize_optional_trimmed(&mut self.remote.default_project_id);
        normalize_optional_trimmed(&mut self.storage.default_dir);
        self.storage.system_file_name = self.storage.system_file_name.trim().into();
        self.storage.user_file_name = self.storage.user_file_name.trim().into();

        let timeout_ms = self.remote.timeout_ms;
        if !(REMOTE_TIMEOUT_MIN_MS..=REMOTE_TIMEOUT_MAX_MS).contains(&timeout_ms) {
            return Err(SettingsError::TimeoutOutOfRange {
                section: "remote",
                field: "timeoutMs",
                value_ms: timeout_ms,
                min_ms: REMOTE_TIMEOUT_MIN_MS,
                max_ms: REMOTE_TIMEOUT_MAX_MS,
            });
        }
        if let Some(base_url) = self.remote.base_url.as_deref() {
            self.remote.base_url = Some(validate_http_url("remote", "baseUrl", base_url)?.into());
        }
        let default_project_id = self
            .remote
            .default_project_id
            .as_deref()
            .map(|raw| {
                ProjectId::parse(raw).map_err(|_| SettingsError::InvalidProjectId {
                    value: raw.to_owned(),
                })
            })
            .transpose()?;

        validate_file_name("systemFileName", &self.storage.system_file_name)?;
        validate_file_name("userFileName", &self.storage.user_file_name)?;
        if self.storage.system_file_name == self.storage.user_file_name {
            return Err(SettingsError::InvalidFileName {
                field: "userFileName",
                value: self.storage.user_file_name.to_string(),
                reason: "must differ from systemFileName",
            });
        }

        let api_key = self.remote.api_key.as_deref().map(SecretString::new);
        Ok(ValidatedEngineSettings {
            remote_timeout: Duration::from_millis(timeout_ms),
            api_key,
            default_project_id,
            raw: self,
        })
    }
}

/// Validated settings with typed accessors.
#[derive(Debug, Clone)]
pub struct ValidatedEngineSettings {
    raw: EngineSettings,
    remote_timeout: Duration,
    api_key: Option<SecretString>,
    default_project_id: Option<ProjectId>,
}

impl ValidatedEngineSettings {
    /// Borrow the raw settings.
    #[must_use]
    pub const fn as_ref(&self) -> &EngineSettings {
        &self.raw
    }

    /// Consume the wrapper and return the raw settings.
    #[must_use]
    pub fn into_inner(self) -> EngineSettings {
        self.raw
    }

    /// Remote base URL when the remote is enabled and configured.
    #[must_use]
    pub fn remote_base_url(&self) -> Option<&str> {
        if self.raw.remote.enabled {
            self.raw.remote.base_url.as_deref()
        } else {
            None
        }
    }

    /// Remote API key.
    #[must_use]
    pub const fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    /// Remote request timeout.
    #[must_use]
    pub const fn remote_timeout(&self) -> Duration {
        self.remote_timeout
    }

    /// Project id for the global configuration.
    #[must_use]
    pub const fn default_project_id(&self) -> Option<&ProjectId> {
        self.default_project_id.as_ref()
    }

    /// Directory of the global configuration.
    #[must_use]
    pub fn default_dir(&self) -> PathBuf {
        self.raw
            .storage
            .default_dir
            .as_deref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }
}

impl AsRef<EngineSettings> for ValidatedEngineSettings {
    fn as_ref(&self) -> &EngineSettings {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedEngineSettings {
    type Target = EngineSettings;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse settings from a JSON string, applying validation and normalization.
pub fn parse_engine_settings_json(input: &str) -> Result<ValidatedEngineSettings, ErrorEnvelope> {
    let settings: EngineSettings = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid settings JSON: {error}"),
        )
    })?;

    settings.validate_and_normalize().map_err(Into::into)
}

/// Parse settings from a TOML string, applying validation and normalization.
pub fn parse_engine_settings_toml(input: &str) -> Result<ValidatedEngineSettings, ErrorEnvelope> {
    let settings: EngineSettings = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid settings TOML: {error}"),
        )
    })?;

    settings.validate_and_normalize().map_err(Into::into)
}

/// JSON Schema for `EngineSettings`.
#[must_use]
pub fn engine_settings_schema() -> schemars::Schema {
    schemars::schema_for!(EngineSettings)
}

/// Typed validation errors for the settings schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The settings version is not supported by this binary.
    UnsupportedVersion {
        /// Version found.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section.
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section.
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// Sanitized URL value.
        url: String,
    },
    /// A file name is empty or contains a path separator.
    InvalidFileName {
        /// Field name.
        field: &'static str,
        /// Value provided.
        value: String,
        /// Human readable reason.
        reason: &'static str,
    },
    /// `remote.defaultProjectId` is not a valid project id.
    InvalidProjectId {
        /// Value provided.
        value: String,
    },
}

impl SettingsError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::InvalidFileName { .. } => ErrorCode::new("config", "invalid_file_name"),
            Self::InvalidProjectId { .. } => ErrorCode::new("config", "invalid_project_id"),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported settings version: {found} (supported: {supported})"
            ),
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be between {min_ms} and {max_ms} ms (got {value_ms})"
            ),
            Self::InvalidUrl {
                section,
                field,
                url,
            } => write!(formatter, "{section}.{field} must be an http(s) URL: {url}"),
            Self::InvalidFileName {
                field,
                value,
                reason,
            } => write!(formatter, "storage.{field} {reason}: {value:?}"),
            Self::InvalidProjectId { value } => {
                write!(formatter, "remote.defaultProjectId is invalid: {value:?}")
            },
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<SettingsError> for ErrorEnvelope {
    fn from(error: SettingsError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            SettingsError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            SettingsError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            SettingsError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", url),
            SettingsError::InvalidFileName { field, value, .. } => envelope
                .with_metadata("section", "storage")
                .with_metadata("field", field)
                .with_metadata("value", value),
            SettingsError::InvalidProjectId { value } => envelope
                .with_metadata("section", "remote")
                .with_metadata("field", "defaultProjectId")
                .with_metadata("value", value),
        }
    }
}

/// Strips credentials from a URL before it lands in an error message.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

fn validate_http_url(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<String, SettingsError> {
    let invalid = || SettingsError::InvalidUrl {
        section,
        field,
        url: sanitize_url_for_error(value),
    };
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid());
    }
    Ok(parsed.as_str().trim_end_matches('/').to_owned())
}

fn validate_file_name(field: &'static str, value: &str) -> Result<(), SettingsError> {
    let reason = if value.is_empty() {
        "must be non-empty"
    } else if value.contains(['/', '\\']) {
        "must not contain path separators"
    } else if value == "." || value == ".." {
        "must name a file"
    } else {
        return Ok(());
    };
    Err(SettingsError::InvalidFileName {
        field,
        value: value.to_owned(),
        reason,
    })
}

fn normalize_optional_trimmed(value: &mut Option<Box<str>>) {
    if let Some(inner) = value.as_deref() {
        let trimmed = inner.trim();
        *value = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.into())
        };
    }
}
