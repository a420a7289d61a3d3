//! Snapshot loading: local files first, remote fallback, cached per scope.

use crate::cache::ProjectConfigCache;
use crate::deps::{EngineDeps, duration_ms};
use crate::scope::{EngineOptions, ProjectScope};
use confhub_domain::{ConfigError, ConfigSnapshot, ProjectId, parse_ini};
use confhub_ports::{LogFields, LogLevel, ProjectFiles, log_fields};
use confhub_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Per-call loading options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Allow remote fetches for this call.
    pub remote_enabled: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            remote_enabled: true,
        }
    }
}

impl LoadOptions {
    /// Options that never contact the remote service.
    #[must_use]
    pub const fn local_only() -> Self {
        Self {
            remote_enabled: false,
        }
    }
}

enum RemoteAttempt {
    Loaded(ConfigSnapshot),
    Skipped,
    Failed(ErrorEnvelope),
}

/// Produces snapshots for scopes and caches them.
#[derive(Clone)]
pub struct ConfigLoader {
    deps: EngineDeps,
    options: Arc<EngineOptions>,
    cache: Arc<ProjectConfigCache>,
}

impl ConfigLoader {
    /// Build a loader with its own cache.
    #[must_use]
    pub fn new(deps: EngineDeps, options: EngineOptions) -> Self {
        Self::with_cache(deps, options, Arc::new(ProjectConfigCache::new()))
    }

    /// Build a loader over an existing cache.
    #[must_use]
    pub fn with_cache(
        deps: EngineDeps,
        options: EngineOptions,
        cache: Arc<ProjectConfigCache>,
    ) -> Self {
        Self {
            deps,
            options: Arc::new(options),
            cache,
        }
    }

    /// Engine options.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ProjectConfigCache> {
        &self.cache
    }

    pub(crate) const fn deps(&self) -> &EngineDeps {
        &self.deps
    }

    /// Snapshot of `scope`, loading it on a cache miss.
    ///
    /// Concurrent loads of one scope run once; later callers observe the
    /// inserted snapshot.
    pub async fn load(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        options: LoadOptions,
    ) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        if let Some(snapshot) = self.cache.get(scope).await {
            return Ok(snapshot);
        }
        let _guard = self.cache.lock(scope).await;
        self.load_locked(ctx, scope, options).await
    }

    /// Drop the cached snapshot of `scope` and load it again.
    pub async fn reload(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        options: LoadOptions,
    ) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let _guard = self.cache.lock(scope).await;
        self.cache.remove(scope).await;
        self.load_locked(ctx, scope, options).await
    }

    /// Cache lookup plus load; the caller holds the scope lock.
    pub(crate) async fn load_locked(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        options: LoadOptions,
    ) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        if let Some(snapshot) = self.cache.get(scope).await {
            return Ok(snapshot);
        }
        let snapshot = Arc::new(self.load_uncached(ctx, scope, options).await?);
        self.cache.insert(scope.clone(), Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(scope = %scope))]
    async fn load_uncached(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        options: LoadOptions,
    ) -> Result<ConfigSnapshot, ConfigError> {
        ctx.ensure_not_cancelled("config.load")?;
        let started_at = Instant::now();
        let files = self.options.files_for(scope);
        let project_id = self.options.project_id_for(scope);
        self.deps.debug(
            "config.load.start",
            "Loading configuration",
            scope_fields(scope, project_id.as_ref()),
        );

        let system_exists = self.deps.store.exists(ctx, files.system.clone()).await?;
        let user_exists = self.deps.store.exists(ctx, files.user.clone()).await?;

        let mut remote_error = None;
        if !(system_exists && user_exists) {
            match self
                .try_remote(ctx, scope, project_id.as_ref(), options)
                .await?
            {
                RemoteAttempt::Loaded(snapshot) => {
                    self.log_loaded(scope, &snapshot, started_at);
                    return Ok(snapshot);
                },
                RemoteAttempt::Failed(error) => remote_error = Some(error),
                RemoteAttempt::Skipped => {},
            }
        }

        let local_error = match self.load_local(ctx, &files, project_id.clone()).await {
            Ok(snapshot) => {
                self.log_loaded(scope, &snapshot, started_at);
                return Ok(snapshot);
            },
            Err(error) if error.is_cancelled() => return Err(error.into()),
            Err(error) => error,
        };

        if let Some(logger) = self.deps.logger.as_ref() {
            logger.failure(
                LogLevel::Warn,
                "config.load.local_failed",
                &local_error,
                Some(scope_fields(scope, project_id.as_ref())),
            );
        }

        if remote_error.is_none() {
            match self
                .try_remote(ctx, scope, project_id.as_ref(), options)
                .await?
            {
                RemoteAttempt::Loaded(snapshot) => {
                    self.log_loaded(scope, &snapshot, started_at);
                    return Ok(snapshot);
                },
                RemoteAttempt::Failed(error) => remote_error = Some(error),
                RemoteAttempt::Skipped => {},
            }
        }

        Err(ConfigError::ConfigUnavailable {
            location: scope.location(),
            cause: Box::new(local_error),
            remote: remote_error.map(Box::new),
        })
    }

    async fn try_remote(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        project_id: Option<&ProjectId>,
        options: LoadOptions,
    ) -> Result<RemoteAttempt, ConfigError> {
        let Some(project_id) = project_id.filter(|_| options.remote_enabled) else {
            return Ok(RemoteAttempt::Skipped);
        };

        match self.deps.remote.fetch(ctx, project_id.clone()).await {
            Ok(snapshot) => Ok(RemoteAttempt::Loaded(snapshot)),
            Err(error) if error.is_cancelled() => Err(error.into()),
            Err(error) => {
                let level = if self.deps.remote.is_configured() {
                    LogLevel::Warn
                } else {
                    LogLevel::Debug
                };
                if let Some(logger) = self.deps.logger.as_ref() {
                    logger.failure(
                        level,
                        "config.remote.failed",
                        &error,
                        Some(scope_fields(scope, Some(project_id))),
                    );
                }
                Ok(RemoteAttempt::Failed(
                    ConfigError::remote_unavailable(project_id.as_str(), error).into(),
                ))
            },
        }
    }

    async fn load_local(
        &self,
        ctx: &RequestContext,
        files: &ProjectFiles,
        project_id: Option<ProjectId>,
    ) -> Result<ConfigSnapshot, ErrorEnvelope> {
        let system_text = self.read_required(ctx, &files.system).await?;
        let user_text = self.read_required(ctx, &files.user).await?;

        let system = parse_ini(&system_text).map_err(|error| {
            ErrorEnvelope::from(ConfigError::ini(display(&files.system), &error))
        })?;
        let user: Value = serde_json::from_str(&user_text).map_err(|error| {
            ErrorEnvelope::from(ConfigError::json(display(&files.user), &error))
        })?;
        Ok(ConfigSnapshot::local(project_id, system, user))
    }

    async fn read_required(
        &self,
        ctx: &RequestContext,
        path: &Path,
    ) -> Result<Box<str>, ErrorEnvelope> {
        self.deps
            .store
            .read_text(ctx, path.to_path_buf())
            .await?
            .ok_or_else(|| {
                ErrorEnvelope::expected(
                    ErrorCode::not_found(),
                    format!("{} does not exist", path.display()),
                )
                .with_metadata("path", display(path))
            })
    }

    fn log_loaded(&self, scope: &ProjectScope, snapshot: &ConfigSnapshot, started_at: Instant) {
        let mut fields = scope_fields(scope, snapshot.project_id.as_ref());
        fields.insert("origin".into(), Value::from(snapshot.origin.as_str()));
        fields.insert(
            "sections".into(),
            Value::from(snapshot.system.sections().len()),
        );
        fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
        self.deps
            .info("config.load.completed", "Configuration loaded", fields);
    }
}

pub(crate) fn scope_fields(scope: &ProjectScope, project_id: Option<&ProjectId>) -> LogFields {
    log_fields([
        ("location", Value::from(scope.location())),
        (
            "projectId",
            project_id.map_or(Value::Null, |id| Value::from(id.as_str())),
        ),
    ])
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
