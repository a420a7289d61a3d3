//! Access log sink contract.

use crate::BoxFuture;
use confhub_domain::ProjectId;
use confhub_shared::{ErrorCode, RequestContext, Result};
use std::fmt;

/// Engine operation being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOperation {
    /// Key resolution.
    Resolve,
    /// Set.
    Set,
    /// Delete.
    Delete,
}

impl AccessOperation {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Set => "set",
            Self::Delete => "delete",
        }
    }
}

/// Result of the recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The key was found.
    Hit,
    /// The caller's default was returned.
    Default,
    /// A mutation succeeded.
    Ok,
    /// The operation failed with this code.
    Failed(ErrorCode),
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => formatter.write_str("hit"),
            Self::Default => formatter.write_str("default"),
            Self::Ok => formatter.write_str("ok"),
            Self::Failed(code) => write!(formatter, "{code}"),
        }
    }
}

/// One access log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Project, `None` for the global configuration.
    pub project_id: Option<ProjectId>,
    /// Operation.
    pub operation: AccessOperation,
    /// Key path as supplied.
    pub key_path: Box<str>,
    /// Outcome.
    pub outcome: AccessOutcome,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Boundary contract for recording configuration access.
pub trait AccessLogPort: Send + Sync {
    /// Record one entry.
    fn record(&self, ctx: &RequestContext, record: AccessRecord) -> BoxFuture<'_, Result<()>>;
}
