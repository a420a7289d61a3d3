//! Process-wide snapshot cache with per-project locks.

use crate::scope::ProjectScope;
use confhub_domain::ConfigSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Snapshots keyed by scope.
///
/// The entry map and the lock table are guarded separately: holding one
/// project's lock never blocks reads of another project's snapshot.
#[derive(Debug, Default)]
pub struct ProjectConfigCache {
    entries: Mutex<HashMap<ProjectScope, Arc<ConfigSnapshot>>>,
    locks: Mutex<HashMap<ProjectScope, Arc<Mutex<()>>>>,
}

impl ProjectConfigCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot of `scope`.
    pub async fn get(&self, scope: &ProjectScope) -> Option<Arc<ConfigSnapshot>> {
        self.entries.lock().await.get(scope).cloned()
    }

    /// Replace the snapshot of `scope`.
    pub async fn insert(&self, scope: ProjectScope, snapshot: Arc<ConfigSnapshot>) {
        self.entries.lock().await.insert(scope, snapshot);
    }

    /// Drop the snapshot of `scope`, returning it.
    pub async fn remove(&self, scope: &ProjectScope) -> Option<Arc<ConfigSnapshot>> {
        self.entries.lock().await.remove(scope)
    }

    /// Number of cached snapshots.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true when nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Acquire the load/write lock of `scope`.
    ///
    /// The global scope's lock serializes every load of the global
    /// configuration.
    pub async fn lock(&self, scope: &ProjectScope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(scope.clone()).or_default())
        };
        lock.lock_owned().await
    }
}
