//! Engine facade: scope selection, resolution, mutation, access records.

use crate::current::{ProjectSession, current_project, scoped_current_project};
use crate::deps::{EngineDeps, now_epoch_ms};
use crate::loader::{ConfigLoader, LoadOptions, scope_fields};
use crate::mutator::{ConfigMutator, MutationOutcome};
use crate::scope::{EngineOptions, ProjectScope};
use confhub_domain::{ConfigError, ConfigSnapshot, ProjectId, ResolvedValue, lookup};
use confhub_ports::{AccessOperation, AccessOutcome, AccessRecord, LogLevel, log_fields};
use confhub_shared::RequestContext;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// One resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest<'a> {
    /// Project directory; `None` uses the current project, then the global scope.
    pub project: Option<&'a Path>,
    /// Dotted key path.
    pub key_path: &'a str,
    /// Value returned when the key is absent.
    pub default: Value,
    /// Allow remote fetches while loading.
    pub remote_enabled: bool,
}

impl<'a> ResolveRequest<'a> {
    /// Request with a `null` default and remote fetches allowed.
    #[must_use]
    pub const fn new(key_path: &'a str) -> Self {
        Self {
            project: None,
            key_path,
            default: Value::Null,
            remote_enabled: true,
        }
    }

    /// Target a project directory.
    #[must_use]
    pub const fn project(mut self, project: &'a Path) -> Self {
        self.project = Some(project);
        self
    }

    /// Value returned when the key is absent.
    #[must_use]
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    /// Skip remote fetches for this call.
    #[must_use]
    pub const fn local_only(mut self) -> Self {
        self.remote_enabled = false;
        self
    }
}

/// Multi-project configuration engine.
///
/// Calls without an explicit project use the task's current project (see
/// [`ConfigEngine::with_current_project`]) and fall back to the global scope.
#[derive(Clone)]
pub struct ConfigEngine {
    loader: ConfigLoader,
    mutator: ConfigMutator,
}

impl ConfigEngine {
    /// Build an engine.
    #[must_use]
    pub fn new(deps: EngineDeps, options: EngineOptions) -> Self {
        let loader = ConfigLoader::new(deps, options);
        Self {
            mutator: ConfigMutator::new(loader.clone()),
            loader,
        }
    }

    /// Loader sharing the engine cache.
    #[must_use]
    pub const fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Mutator sharing the engine cache.
    #[must_use]
    pub const fn mutator(&self) -> &ConfigMutator {
        &self.mutator
    }

    /// Scope addressed by `project`.
    #[must_use]
    pub fn scope_for(project: Option<&Path>) -> ProjectScope {
        match project {
            Some(path) => ProjectScope::dir(path),
            None => current_project().unwrap_or(ProjectScope::Global),
        }
    }

    /// Snapshot of `project`.
    pub async fn snapshot(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
    ) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        self.loader
            .load(ctx, &Self::scope_for(project), LoadOptions::default())
            .await
    }

    /// Make `project` the current project while `future` runs.
    ///
    /// The snapshot is loaded (or taken from the cache) first; a project that
    /// cannot be loaded fails here and `future` is never polled.
    pub async fn with_current_project<F>(
        &self,
        ctx: &RequestContext,
        project: &Path,
        future: F,
    ) -> Result<F::Output, ConfigError>
    where
        F: Future,
    {
        let scope = ProjectScope::dir(project);
        let snapshot = self
            .loader
            .load(ctx, &scope, LoadOptions::default())
            .await?;
        self.loader.deps().debug(
            "config.current.entered",
            "Current project set",
            scope_fields(&scope, snapshot.project_id.as_ref()),
        );
        Ok(scoped_current_project(scope, future).await)
    }

    /// Pin the snapshot of `project` for a unit of work.
    pub async fn open_session(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
    ) -> Result<ProjectSession, ConfigError> {
        let scope = Self::scope_for(project);
        let snapshot = self
            .loader
            .load(ctx, &scope, LoadOptions::default())
            .await?;
        Ok(ProjectSession::new(scope, snapshot))
    }

    /// Resolve `key_path` in `project`, returning `default` when absent.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
        key_path: &str,
        default: Value,
    ) -> Result<Value, ConfigError> {
        let request = ResolveRequest {
            project,
            key_path,
            default,
            remote_enabled: true,
        };
        self.resolve_with(ctx, request).await
    }

    /// Resolve with explicit options.
    ///
    /// Missing keys yield the default; only load failures are errors.
    pub async fn resolve_with(
        &self,
        ctx: &RequestContext,
        request: ResolveRequest<'_>,
    ) -> Result<Value, ConfigError> {
        let scope = Self::scope_for(request.project);
        let options = LoadOptions {
            remote_enabled: request.remote_enabled,
        };
        let snapshot = match self.loader.load(ctx, &scope, options).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.record(
                    ctx,
                    self.loader.options().project_id_for(&scope),
                    AccessOperation::Resolve,
                    request.key_path,
                    AccessOutcome::Failed(error.error_code()),
                )
                .await;
                return Err(error);
            },
        };

        let (value, outcome) = match lookup(&snapshot, request.key_path) {
            Some(found) => (ResolvedValue::to_value(found), AccessOutcome::Hit),
            None => (request.default, AccessOutcome::Default),
        };
        self.record(
            ctx,
            snapshot.project_id.clone(),
            AccessOperation::Resolve,
            request.key_path,
            outcome,
        )
        .await;
        Ok(value)
    }

    /// Set `key_path` to `raw` in `project`.
    pub async fn set_value(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
        key_path: &str,
        raw: &str,
    ) -> Result<MutationOutcome, ConfigError> {
        let scope = Self::scope_for(project);
        let result = self.mutator.set_value(ctx, &scope, key_path, raw).await;
        self.record_mutation(ctx, &scope, AccessOperation::Set, key_path, &result)
            .await;
        result
    }

    /// Remove `key_path` from `project`.
    pub async fn delete_value(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
        key_path: &str,
    ) -> Result<MutationOutcome, ConfigError> {
        let scope = Self::scope_for(project);
        let result = self.mutator.delete_value(ctx, &scope, key_path).await;
        self.record_mutation(ctx, &scope, AccessOperation::Delete, key_path, &result)
            .await;
        result
    }

    /// Update existing system options of `project` from form fields.
    pub async fn apply_form_fields(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
        fields: &BTreeMap<String, String>,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutator
            .apply_form_fields(ctx, &Self::scope_for(project), fields)
            .await
    }

    /// Replace the user document of `project`.
    pub async fn replace_user_config(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
        document: Value,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutator
            .replace_user_config(ctx, &Self::scope_for(project), document)
            .await
    }

    /// Write the snapshot of `project` to local files.
    pub async fn materialize(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutator
            .materialize(ctx, &Self::scope_for(project))
            .await
    }

    /// Drop the cached snapshot of `project` and load it again.
    pub async fn reload(
        &self,
        ctx: &RequestContext,
        project: Option<&Path>,
    ) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        self.loader
            .reload(ctx, &Self::scope_for(project), LoadOptions::default())
            .await
    }

    async fn record_mutation(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        operation: AccessOperation,
        key_path: &str,
        result: &Result<MutationOutcome, ConfigError>,
    ) {
        if self.loader.deps().access_log.is_none() {
            return;
        }
        let outcome = match result {
            Ok(_) => AccessOutcome::Ok,
            Err(error) => AccessOutcome::Failed(error.error_code()),
        };
        let project_id = match self.loader.cache().get(scope).await {
            Some(snapshot) => snapshot.project_id.clone(),
            None => self.loader.options().project_id_for(scope),
        };
        self.record(ctx, project_id, operation, key_path, outcome)
            .await;
    }

    async fn record(
        &self,
        ctx: &RequestContext,
        project_id: Option<ProjectId>,
        operation: AccessOperation,
        key_path: &str,
        outcome: AccessOutcome,
    ) {
        let deps = self.loader.deps();
        let Some(access_log) = deps.access_log.as_ref() else {
            return;
        };
        let record = AccessRecord {
            project_id,
            operation,
            key_path: key_path.into(),
            outcome,
            timestamp_ms: now_epoch_ms(),
        };
        if let Err(error) = access_log.record(ctx, record).await
            && let Some(logger) = deps.logger.as_ref()
        {
            logger.failure(
                LogLevel::Warn,
                "config.access_log.failed",
                &error,
                Some(log_fields([("keyPath", key_path)])),
            );
        }
    }
}
