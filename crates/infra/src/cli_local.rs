//! Blocking entry points used by the CLI.
//!
//! Each call loads settings, wires the engine, and drives one operation on a
//! current-thread runtime.

use crate::engine_factory::build_engine;
use crate::observability::{Observability, observability_from_env, scope_logger};
use crate::settings::load_settings;
use crate::{InfraError, InfraResult};
use confhub_adapters::ProjectPayload;
use confhub_app::{ConfigEngine, LoadOptions, MutationOutcome, ResolveRequest};
use confhub_domain::{ConfigSnapshot, Origin};
use confhub_shared::{ErrorEnvelope, RequestContext};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Settings file and project directory shared by every local command.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTarget<'a> {
    /// Optional JSON/TOML settings file.
    pub settings_path: Option<&'a Path>,
    /// Project directory; `None` selects the global configuration.
    pub project: Option<&'a Path>,
}

/// Serializable summary of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    /// Key path (or target) as supplied.
    pub key_path: String,
    /// Names that changed.
    pub changed: Vec<String>,
    /// True when written to local files.
    pub persisted: bool,
    /// Backup files created before rewriting.
    pub backups: Vec<String>,
}

impl From<MutationOutcome> for MutationReport {
    fn from(outcome: MutationOutcome) -> Self {
        Self {
            key_path: outcome.key_path.into_string(),
            changed: outcome.changed,
            persisted: outcome.persisted,
            backups: outcome
                .backups
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        }
    }
}

/// Snapshot in the remote wire shape, tagged with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    /// Project id; absent for the global configuration without a default id.
    pub project_id: Option<String>,
    /// Where the snapshot came from.
    pub origin: Origin,
    /// Wire payload.
    #[serde(flatten)]
    pub payload: ProjectPayload,
}

impl ProjectView {
    /// View of a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        Self {
            project_id: snapshot
                .project_id
                .as_ref()
                .map(|id| id.as_str().to_owned()),
            origin: snapshot.origin,
            payload: ProjectPayload::from_snapshot(snapshot),
        }
    }
}

/// Resolve one key, returning `default` when it is absent.
pub fn run_get_local(
    target: LocalTarget<'_>,
    key_path: &str,
    default: Value,
    remote_enabled: bool,
) -> InfraResult<Value> {
    let project = target.project.map(Path::to_path_buf);
    let key_path = key_path.to_owned();
    run_engine(target, move |engine, ctx| async move {
        let mut request = ResolveRequest::new(&key_path).default_value(default);
        if let Some(project) = project.as_deref() {
            request = request.project(project);
        }
        if !remote_enabled {
            request = request.local_only();
        }
        Ok(engine.resolve_with(&ctx, request).await?)
    })
}

/// Set one key from its raw string form.
pub fn run_set_local(
    target: LocalTarget<'_>,
    key_path: &str,
    raw: &str,
) -> InfraResult<MutationReport> {
    let project = target.project.map(Path::to_path_buf);
    let key_path = key_path.to_owned();
    let raw = raw.to_owned();
    run_engine(target, move |engine, ctx| async move {
        let outcome = engine
            .set_value(&ctx, project.as_deref(), &key_path, &raw)
            .await?;
        Ok(outcome.into())
    })
}

/// Delete one key.
pub fn run_delete_local(target: LocalTarget<'_>, key_path: &str) -> InfraResult<MutationReport> {
    let project = target.project.map(Path::to_path_buf);
    let key_path = key_path.to_owned();
    run_engine(target, move |engine, ctx| async move {
        let outcome = engine
            .delete_value(&ctx, project.as_deref(), &key_path)
            .await?;
        Ok(outcome.into())
    })
}

/// Update existing system options from `section_option = value` fields.
pub fn run_form_local(
    target: LocalTarget<'_>,
    fields: BTreeMap<String, String>,
) -> InfraResult<MutationReport> {
    let project = target.project.map(Path::to_path_buf);
    run_engine(target, move |engine, ctx| async move {
        let outcome = engine
            .apply_form_fields(&ctx, project.as_deref(), &fields)
            .await?;
        Ok(outcome.into())
    })
}

/// Replace the user document with `document`.
pub fn run_replace_config_local(
    target: LocalTarget<'_>,
    document: Value,
) -> InfraResult<MutationReport> {
    let project = target.project.map(Path::to_path_buf);
    run_engine(target, move |engine, ctx| async move {
        let outcome = engine
            .replace_user_config(&ctx, project.as_deref(), document)
            .await?;
        Ok(outcome.into())
    })
}

/// Snapshot of the target in the remote wire shape.
pub fn run_show_local(target: LocalTarget<'_>, remote_enabled: bool) -> InfraResult<ProjectView> {
    let project = target.project.map(Path::to_path_buf);
    run_engine(target, move |engine, ctx| async move {
        let snapshot = if remote_enabled {
            engine.snapshot(&ctx, project.as_deref()).await?
        } else {
            let scope = ConfigEngine::scope_for(project.as_deref());
            engine
                .loader()
                .load(&ctx, &scope, LoadOptions::local_only())
                .await?
        };
        Ok(ProjectView::from_snapshot(&snapshot))
    })
}

/// Write the target's snapshot to local files.
pub fn run_materialize_local(target: LocalTarget<'_>) -> InfraResult<MutationReport> {
    let project: Option<PathBuf> = target.project.map(Path::to_path_buf);
    run_engine(target, move |engine, ctx| async move {
        let outcome = engine.materialize(&ctx, project.as_deref()).await?;
        Ok(outcome.into())
    })
}

fn run_engine<F, T>(
    target: LocalTarget<'_>,
    op: impl FnOnce(ConfigEngine, RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    let settings = load_settings(target.settings_path)?;
    let ctx = RequestContext::new_request();
    let observability = observability_from_env()?;
    let scoped = Observability {
        logger: scope_logger(observability.logger.as_ref(), &ctx),
        access_log: observability.access_log,
    };
    tracing::debug!(
        target: "confhub::infra",
        correlation_id = ctx.correlation_id().as_str(),
        project = ?target.project,
        "running local command"
    );
    run_async_with_ctx(ctx, move |ctx| async move {
        let engine = build_engine(&settings, &scoped)?;
        op(engine, ctx).await
    })
}

/// Drive `op` to completion on a fresh current-thread runtime.
pub fn run_async_with_ctx<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(async { op(ctx).await })
}
