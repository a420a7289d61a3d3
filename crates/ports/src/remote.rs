//! Remote configuration service boundary contract.

use crate::BoxFuture;
use confhub_domain::{ConfigSnapshot, ProjectId};
use confhub_shared::{ErrorCode, RequestContext, Result};

/// Error code adapters use for every remote failure.
#[must_use]
pub fn remote_unavailable_code() -> ErrorCode {
    ErrorCode::new("remote", "unavailable")
}

/// Boundary contract for fetching a project's configuration remotely.
pub trait RemoteConfigPort: Send + Sync {
    /// Fetch the project's configuration as a remote-origin snapshot.
    ///
    /// Implementations do not retry and must bound their own latency.
    fn fetch(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
    ) -> BoxFuture<'_, Result<ConfigSnapshot>>;

    /// Returns false when no remote service is configured.
    fn is_configured(&self) -> bool {
        true
    }
}
