//! Error envelope shared by every confhub crate.
//!
//! Domain errors (`ConfigError`, settings errors) convert into an
//! [`ErrorEnvelope`] when they cross a port, an adapter, or the CLI. The code
//! is the stable part; messages are for humans.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Diagnostic key/value pairs attached to an envelope.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Where a failure comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-visible outcomes: bad key paths, missing keys, bad settings.
    Expected,
    /// A broken internal assumption.
    Invariant,
    /// Environment failures: file I/O, the remote service.
    Unexpected,
}

impl ErrorKind {
    /// Lower-case label used in text output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Invariant => "invariant",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Whether retrying the same call can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Transient: timeouts, interrupted I/O, an unreachable remote.
    Retriable,
    /// Retrying gives the same answer.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true for [`ErrorClass::Retriable`].
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(if self.is_retriable() {
            "retriable"
        } else {
            "non-retriable"
        })
    }
}

/// `namespace:code` identifier, e.g. `config:not_found`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Build a code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// `core:cancelled`
    pub fn cancelled() -> Self {
        Self::new("core", "cancelled")
    }

    /// `core:invalid_input`
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// `core:not_found`
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// `core:permission_denied`
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// `core:timeout`
    pub fn timeout() -> Self {
        Self::new("core", "timeout")
    }

    /// `core:io`
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// `core:internal`
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Namespace part.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier part.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns true when both parts match.
    #[must_use]
    pub fn is(&self, namespace: &str, code: &str) -> bool {
        self.namespace == namespace && self.code == code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured failure crossing crate boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Diagnostics such as `path`, `key_path`, or `cause`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    fn build(kind: ErrorKind, class: ErrorClass, code: ErrorCode, message: String) -> Self {
        Self {
            kind,
            class,
            code,
            message,
            metadata: ErrorMetadata::new(),
        }
    }

    /// Non-retriable expected failure.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Expected,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Invariant violation; never retriable.
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Invariant,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Environment failure with an explicit retry class.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self::build(ErrorKind::Unexpected, class, code, message.into())
    }

    /// `core:cancelled` failure.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::cancelled(), message)
    }

    /// Returns true for `core:cancelled`.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code.is("core", "cancelled")
    }

    /// Attach one metadata entry, replacing an existing value.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

/// File-system failures keep their kind as the code; transient kinds are retriable.
impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        let kind = error.kind();
        let code = match kind {
            io::ErrorKind::NotFound => ErrorCode::not_found(),
            io::ErrorKind::PermissionDenied => ErrorCode::permission_denied(),
            io::ErrorKind::TimedOut => ErrorCode::timeout(),
            io::ErrorKind::Interrupted => ErrorCode::cancelled(),
            _ => ErrorCode::io(),
        };
        let class = match kind {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => {
                ErrorClass::Retriable
            },
            _ => ErrorClass::NonRetriable,
        };
        Self::unexpected(code, error.to_string(), class)
    }
}
