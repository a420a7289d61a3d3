//! Current-project pointer, scoped to one unit of work.
//!
//! Two forms exist: an explicit [`ProjectSession`] value, and a task-local
//! scope installed by `ConfigEngine::with_current_project` once the project
//! has loaded. The task-local is visible only inside the wrapped future and is
//! gone once it completes.

use crate::scope::ProjectScope;
use confhub_domain::{ConfigSnapshot, ProjectId, lookup, resolve};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static CURRENT_PROJECT: ProjectScope;
}

/// Run `future` with `scope` as the current project. The caller has loaded it.
pub(crate) async fn scoped_current_project<F>(scope: ProjectScope, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_PROJECT.scope(scope, future).await
}

/// Current project of the running task, if one was installed.
#[must_use]
pub fn current_project() -> Option<ProjectScope> {
    CURRENT_PROJECT.try_with(ProjectScope::clone).ok()
}

/// One project's snapshot pinned for a unit of work.
///
/// Resolution reads the pinned snapshot; later mutations are not observed.
#[derive(Debug, Clone)]
pub struct ProjectSession {
    scope: ProjectScope,
    snapshot: Arc<ConfigSnapshot>,
}

impl ProjectSession {
    /// Pin `snapshot` for `scope`.
    #[must_use]
    pub const fn new(scope: ProjectScope, snapshot: Arc<ConfigSnapshot>) -> Self {
        Self { scope, snapshot }
    }

    /// Scope of the session.
    #[must_use]
    pub const fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    /// Pinned snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &Arc<ConfigSnapshot> {
        &self.snapshot
    }

    /// Project id of the pinned snapshot.
    #[must_use]
    pub fn project_id(&self) -> Option<&ProjectId> {
        self.snapshot.project_id.as_ref()
    }

    /// Resolve `key_path`, returning `default` when absent.
    #[must_use]
    pub fn resolve(&self, key_path: &str, default: Value) -> Value {
        resolve(&self.snapshot, key_path, default)
    }

    /// Returns true when `key_path` resolves to a value.
    #[must_use]
    pub fn contains(&self, key_path: &str) -> bool {
        lookup(&self.snapshot, key_path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confhub_domain::apply_set;
    use serde_json::json;

    #[tokio::test]
    async fn task_local_is_scoped_to_the_future() {
        assert_eq!(current_project(), None);
        let seen = scoped_current_project(ProjectScope::dir("/srv/alpha"), async {
            current_project()
        })
        .await;
        assert_eq!(seen, Some(ProjectScope::dir("/srv/alpha")));
        assert_eq!(current_project(), None);
    }

    #[test]
    fn session_reads_its_pinned_snapshot() -> Result<(), confhub_domain::ConfigError> {
        let mut snapshot = ConfigSnapshot::empty(None);
        apply_set(&mut snapshot, "system.key.tts_module", "azure")?;
        let session = ProjectSession::new(ProjectScope::Global, Arc::new(snapshot));

        assert_eq!(session.resolve("tts_module", Value::Null), json!("azure"));
        assert!(session.contains("system.tts_module"));
        assert!(!session.contains("config.missing"));
        assert_eq!(session.project_id(), None);
        Ok(())
    }
}
