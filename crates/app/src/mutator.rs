//! Backup + rewrite + cache swap for configuration mutations.

use crate::deps::{EngineDeps, duration_ms};
use crate::loader::{ConfigLoader, LoadOptions, scope_fields};
use crate::scope::ProjectScope;
use confhub_domain::{
    ConfigError, ConfigSnapshot, Origin, Touched, apply_delete, apply_form_fields, apply_set,
    json_path, render_ini, replace_user,
};
use confhub_ports::{LogLevel, ProjectFiles};
use confhub_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Result of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Key path (or target) as supplied.
    pub key_path: Box<str>,
    /// Names that changed; empty when the mutation was a no-op.
    pub changed: Vec<String>,
    /// True when the change was written to local files.
    pub persisted: bool,
    /// Backup files created before rewriting.
    pub backups: Vec<PathBuf>,
}

struct Applied {
    touched: Vec<Touched>,
    changed: Vec<String>,
}

impl Applied {
    fn one(touched: Touched, key_path: &str) -> Self {
        Self {
            touched: vec![touched],
            changed: vec![key_path.to_owned()],
        }
    }
}

/// Applies mutations to cached snapshots and persists local ones.
///
/// Each mutation holds the scope lock from load through cache swap. A failed
/// write leaves the cached snapshot unchanged.
#[derive(Clone)]
pub struct ConfigMutator {
    loader: ConfigLoader,
}

impl ConfigMutator {
    /// Build a mutator sharing `loader`'s cache.
    #[must_use]
    pub const fn new(loader: ConfigLoader) -> Self {
        Self { loader }
    }

    /// Set `key_path` to `raw` (`system.<section>.<option>` or `config.<path>`).
    pub async fn set_value(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        key_path: &str,
        raw: &str,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutate(ctx, scope, "set", key_path, |snapshot| {
            apply_set(snapshot, key_path, raw).map(|touched| Applied::one(touched, key_path))
        })
        .await
    }

    /// Remove `key_path`; fails with `NotFound` when absent.
    pub async fn delete_value(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        key_path: &str,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutate(ctx, scope, "delete", key_path, |snapshot| {
            apply_delete(snapshot, key_path).map(|touched| Applied::one(touched, key_path))
        })
        .await
    }

    /// Update existing system options from `section_option` form fields.
    ///
    /// All changes share one backup and one rewrite of `system.conf`.
    pub async fn apply_form_fields(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        fields: &BTreeMap<String, String>,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutate(ctx, scope, "form", "system", |snapshot| {
            let changed = apply_form_fields(snapshot, fields);
            let touched = if changed.is_empty() {
                Vec::new()
            } else {
                vec![Touched::System]
            };
            Ok(Applied { touched, changed })
        })
        .await
    }

    /// Replace the whole user document.
    pub async fn replace_user_config(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        document: Value,
    ) -> Result<MutationOutcome, ConfigError> {
        self.mutate(ctx, scope, "replace", "config", |snapshot| {
            replace_user(snapshot, document);
            Ok(Applied::one(Touched::User, "config"))
        })
        .await
    }

    /// Write the snapshot of `scope` to its local files.
    ///
    /// Used for remote-origin snapshots; afterwards the cached snapshot is
    /// local.
    pub async fn materialize(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
    ) -> Result<MutationOutcome, ConfigError> {
        let _guard = self.loader.cache().lock(scope).await;
        let started_at = Instant::now();
        let current = self
            .loader
            .load_locked(ctx, scope, LoadOptions::default())
            .await?;

        let mut next = (*current).clone();
        next.origin = Origin::Local;
        let files = self.loader.options().files_for(scope);
        let backups = self
            .persist(ctx, scope, &files, &next, &[Touched::System, Touched::User])
            .await?;
        self.loader.cache().insert(scope.clone(), Arc::new(next)).await;

        let outcome = MutationOutcome {
            key_path: "".into(),
            changed: vec![display(&files.system), display(&files.user)],
            persisted: true,
            backups,
        };
        self.log_completed(scope, "materialize", &outcome, started_at);
        Ok(outcome)
    }

    async fn mutate<F>(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        operation: &'static str,
        key_path: &str,
        apply: F,
    ) -> Result<MutationOutcome, ConfigError>
    where
        F: FnOnce(&mut ConfigSnapshot) -> Result<Applied, ConfigError> + Send,
    {
        let _guard = self.loader.cache().lock(scope).await;
        let started_at = Instant::now();
        let current = self
            .loader
            .load_locked(ctx, scope, LoadOptions::default())
            .await?;

        let mut next = (*current).clone();
        let applied = match apply(&mut next) {
            Ok(applied) => applied,
            Err(error) => {
                self.log_rejected(scope, operation, key_path, &error);
                return Err(error);
            },
        };

        let mut outcome = MutationOutcome {
            key_path: key_path.into(),
            changed: applied.changed,
            persisted: false,
            backups: Vec::new(),
        };
        if applied.touched.is_empty() {
            return Ok(outcome);
        }

        if next.origin == Origin::Local {
            let files = self.loader.options().files_for(scope);
            outcome.backups = self
                .persist(ctx, scope, &files, &next, &applied.touched)
                .await?;
            outcome.persisted = true;
        }
        self.loader.cache().insert(scope.clone(), Arc::new(next)).await;
        self.log_completed(scope, operation, &outcome, started_at);
        Ok(outcome)
    }

    async fn persist(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        files: &ProjectFiles,
        snapshot: &ConfigSnapshot,
        touched: &[Touched],
    ) -> Result<Vec<PathBuf>, ConfigError> {
        let mut backups = Vec::new();
        for side in [Touched::System, Touched::User] {
            if !touched.contains(&side) {
                continue;
            }
            let (path, contents) = match side {
                Touched::System => (files.system.clone(), render_ini(&snapshot.system)),
                Touched::User => (files.user.clone(), render_user(&files.user, &snapshot.user)?),
            };

            if self.loader.options().backups
                && let Some(backup) = self.backup(ctx, scope, path.clone()).await?
            {
                backups.push(backup);
            }

            self.deps()
                .store
                .write_text(ctx, path.clone(), contents.into_boxed_str())
                .await
                .map_err(|cause| persist_error(&path, cause))?;
        }
        Ok(backups)
    }

    async fn backup(
        &self,
        ctx: &RequestContext,
        scope: &ProjectScope,
        path: PathBuf,
    ) -> Result<Option<PathBuf>, ConfigError> {
        match self.deps().store.backup(ctx, path.clone()).await {
            Ok(backup) => Ok(backup),
            Err(error) if error.is_cancelled() => Err(error.into()),
            Err(error) => {
                if let Some(logger) = self.deps().logger.as_ref() {
                    let mut fields = scope_fields(scope, None);
                    fields.insert("file".into(), Value::from(display(&path)));
                    logger.failure(LogLevel::Warn, "config.backup.failed", &error, Some(fields));
                }
                Ok(None)
            },
        }
    }

    const fn deps(&self) -> &EngineDeps {
        self.loader.deps()
    }

    fn log_completed(
        &self,
        scope: &ProjectScope,
        operation: &str,
        outcome: &MutationOutcome,
        started_at: Instant,
    ) {
        let mut fields = scope_fields(scope, None);
        fields.insert("operation".into(), Value::from(operation));
        fields.insert("keyPath".into(), Value::from(outcome.key_path.as_ref()));
        fields.insert("persisted".into(), Value::from(outcome.persisted));
        fields.insert("backups".into(), Value::from(outcome.backups.len()));
        fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
        self.deps()
            .info("config.mutate.completed", "Configuration updated", fields);
    }

    fn log_rejected(
        &self,
        scope: &ProjectScope,
        operation: &str,
        key_path: &str,
        error: &ConfigError,
    ) {
        let mut fields = scope_fields(scope, None);
        fields.insert("operation".into(), Value::from(operation));
        fields.insert("keyPath".into(), Value::from(key_path));
        fields.insert("code".into(), Value::from(error.error_code().to_string()));
        self.deps()
            .debug("config.mutate.rejected", "Configuration update rejected", fields);
    }
}

/// Render the user document as stored in `config.json`.
///
/// Keys are sorted, indentation is four spaces, and non-ASCII text is
/// written as-is.
pub fn render_user_document(document: &Value) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    json_path::sorted(document).serialize(&mut serializer)?;
    let mut text = String::from_utf8_lossy(&buffer).into_owned();
    text.push('\n');
    Ok(text)
}

fn render_user(path: &Path, document: &Value) -> Result<String, ConfigError> {
    render_user_document(document).map_err(|error| {
        persist_error(
            path,
            ErrorEnvelope::invariant(
                ErrorCode::internal(),
                format!("failed to serialize user configuration: {error}"),
            ),
        )
    })
}

fn persist_error(path: &Path, cause: ErrorEnvelope) -> ConfigError {
    if cause.is_cancelled() {
        return cause.into();
    }
    ConfigError::Persist {
        file: display(path),
        cause: Box::new(cause),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
