//! Configuration error taxonomy.

use crate::ini::IniParseError;
use crate::key_path::UnsupportedKeyPath;
use confhub_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use thiserror::Error;

/// Errors surfaced by configuration loading, resolution, and mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Key, section, or path absent on a targeted write or delete.
    #[error("configuration key not found: {key_path}")]
    NotFound {
        /// Path as supplied by the caller.
        key_path: String,
    },
    /// Structurally invalid key path on write.
    #[error(transparent)]
    UnsupportedPath(#[from] UnsupportedKeyPath),
    /// Neither local files nor the remote service produced a snapshot.
    #[error("configuration unavailable for {location}: {cause}{}", remote_note(.remote.as_deref()))]
    ConfigUnavailable {
        /// Project directory or `<global>`.
        location: String,
        /// The local failure that triggered the fallback.
        cause: Box<ErrorEnvelope>,
        /// The `remote:unavailable` failure of the last remote attempt, when
        /// one was made.
        remote: Option<Box<ErrorEnvelope>>,
    },
    /// Transport, status, or envelope failure talking to the remote service.
    #[error("remote configuration unavailable for project {project_id}: {cause}")]
    RemoteUnavailable {
        /// Project id sent to the remote service.
        project_id: String,
        /// Underlying failure.
        cause: Box<ErrorEnvelope>,
    },
    /// Malformed `system.conf` or `config.json`.
    #[error("failed to parse {file}: {reason}")]
    Parse {
        /// File that failed to parse.
        file: String,
        /// Parser message.
        reason: String,
        /// 1-based line, when known.
        line: Option<usize>,
    },
    /// Rewriting a persisted file failed; the cached snapshot is unchanged.
    #[error("failed to persist {file}: {cause}")]
    Persist {
        /// File being written.
        file: String,
        /// Underlying I/O failure.
        cause: Box<ErrorEnvelope>,
    },
    /// The request was cancelled.
    #[error("operation cancelled: {operation}")]
    Cancelled {
        /// Operation in flight.
        operation: String,
    },
}

impl ConfigError {
    /// Build a `NotFound` error.
    pub fn not_found(key_path: impl Into<String>) -> Self {
        Self::NotFound {
            key_path: key_path.into(),
        }
    }

    /// Build a `Parse` error from an INI failure.
    pub fn ini(file: impl Into<String>, error: &IniParseError) -> Self {
        Self::Parse {
            file: file.into(),
            reason: error.to_string(),
            line: Some(error.line()),
        }
    }

    /// Build a `Parse` error from a JSON failure.
    pub fn json(file: impl Into<String>, error: &serde_json::Error) -> Self {
        Self::Parse {
            file: file.into(),
            reason: error.to_string(),
            line: Some(error.line()),
        }
    }

    /// Stable error code for this failure.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::new("config", "not_found"),
            Self::UnsupportedPath(_) => ErrorCode::new("config", "unsupported_path"),
            Self::ConfigUnavailable { .. } => ErrorCode::new("config", "unavailable"),
            Self::RemoteUnavailable { .. } => ErrorCode::new("remote", "unavailable"),
            Self::Parse { .. } => ErrorCode::new("config", "parse_failed"),
            Self::Persist { .. } => ErrorCode::new("config", "persist_failed"),
            Self::Cancelled { .. } => ErrorCode::cancelled(),
        }
    }

    /// Wrap a remote fetch failure for `project_id`.
    pub fn remote_unavailable(project_id: impl Into<String>, cause: ErrorEnvelope) -> Self {
        Self::RemoteUnavailable {
            project_id: project_id.into(),
            cause: Box::new(cause),
        }
    }

    /// Remote failure carried by `ConfigUnavailable`, if any.
    #[must_use]
    pub fn remote_failure(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::ConfigUnavailable { remote, .. } => remote.as_deref(),
            _ => None,
        }
    }

    /// Returns true for `NotFound`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<ConfigError> for ErrorEnvelope {
    fn from(error: ConfigError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        match error {
            ConfigError::NotFound { key_path } => {
                Self::expected(code, message).with_metadata("key_path", key_path)
            },
            ConfigError::UnsupportedPath(unsupported) => Self::expected(code, message)
                .with_metadata("key_path", unsupported.key_path)
                .with_metadata("reason", unsupported.reason.as_str()),
            ConfigError::ConfigUnavailable {
                location,
                cause,
                remote,
            } => {
                let envelope = Self::unexpected(code, message, cause.class)
                    .with_metadata("location", location)
                    .with_metadata("cause", cause.code.to_string());
                let Some(remote) = remote else {
                    return envelope;
                };
                let envelope = envelope.with_metadata("remote", remote.code.to_string());
                match remote.metadata.get("cause") {
                    Some(remote_cause) => envelope.with_metadata("remote_cause", remote_cause.clone()),
                    None => envelope,
                }
            },
            ConfigError::RemoteUnavailable { project_id, cause } => {
                Self::unexpected(code, message, ErrorClass::Retriable)
                    .with_metadata("project_id", project_id)
                    .with_metadata("cause", cause.code.to_string())
            },
            ConfigError::Parse { file, line, .. } => {
                let envelope = Self::expected(code, message).with_metadata("file", file);
                match line {
                    Some(line) => envelope.with_metadata("line", line.to_string()),
                    None => envelope,
                }
            },
            ConfigError::Persist { file, cause } => {
                Self::unexpected(code, message, cause.class)
                    .with_metadata("file", file)
                    .with_metadata("cause", cause.code.to_string())
            },
            ConfigError::Cancelled { operation } => {
                Self::cancelled(message).with_metadata("operation", operation)
            },
        }
    }
}

impl From<ErrorEnvelope> for ConfigError {
    /// Cancellation envelopes keep their meaning; anything else is an unavailable source.
    fn from(envelope: ErrorEnvelope) -> Self {
        if envelope.is_cancelled() {
            let operation = envelope
                .metadata
                .get("operation")
                .cloned()
                .unwrap_or_else(|| "unknown".to_owned());
            return Self::Cancelled { operation };
        }
        let location = envelope
            .metadata
            .get("path")
            .cloned()
            .unwrap_or_else(|| "<unknown>".to_owned());
        Self::ConfigUnavailable {
            location,
            cause: Box::new(envelope),
            remote: None,
        }
    }
}

fn remote_note(remote: Option<&ErrorEnvelope>) -> String {
    remote.map_or_else(String::new, |remote| format!("; remote: {remote}"))
}
