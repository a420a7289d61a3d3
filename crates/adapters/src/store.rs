//! Local filesystem store for `system.conf` / `config.json`.

use confhub_ports::{BoxFuture, ConfigStorePort, backup_path_for};
use confhub_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;

/// `chrono` format of backup timestamps (`YYYYMMDDHHMMSS`, local time).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Suffix of in-flight staging files.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Local filesystem adapter using async IO.
///
/// Writes go to a uniquely named sibling temp file that is renamed over the
/// target, so a reader never observes a half-written document and two writers
/// of one file never share a staging file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConfigStore;

impl LocalConfigStore {
    /// Build the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ConfigStorePort for LocalConfigStore {
    fn read_text(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Option<Box<str>>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("store.read_text")?;
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => Ok(Some(text.into_boxed_str())),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
                Err(error) => Err(io_error(error, "read", &path)),
            }
        })
    }

    fn write_text(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
        contents: Box<str>,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("store.write_text")?;
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            tokio::fs::create_dir_all(&parent)
                .await
                .map_err(|error| io_error(error, "create_dir", &parent))?;

            spawn_blocking(move || replace_file(&parent, &path, contents.as_bytes()))
                .await
                .map_err(|error| {
                    ErrorEnvelope::unexpected(
                        ErrorCode::internal(),
                        format!("store write task failed: {error}"),
                        ErrorClass::NonRetriable,
                    )
                })?
        })
    }

    fn backup(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<Option<PathBuf>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("store.backup")?;
            if !tokio::fs::try_exists(&path)
                .await
                .map_err(|error| io_error(error, "stat", &path))?
            {
                return Ok(None);
            }

            let timestamp = chrono::Local::now()
                .format(BACKUP_TIMESTAMP_FORMAT)
                .to_string();
            let target = backup_path_for(&path, &timestamp);
            tokio::fs::copy(&path, &target)
                .await
                .map_err(|error| io_error(error, "backup", &target))?;
            Ok(Some(target))
        })
    }

    fn exists(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("store.exists")?;
            tokio::fs::try_exists(&path)
                .await
                .map_err(|error| io_error(error, "stat", &path))
        })
    }
}

/// Stage `contents` in `<name>.<random>.tmp` next to `path`, then rename it
/// over `path`. The staging file is removed when any step fails.
fn replace_file(parent: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    let mut prefix = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    prefix.push(".");
    let mut staging = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(parent)
        .map_err(|error| io_error(error, "create_staging", parent))?;

    if let Ok(existing) = std::fs::metadata(path) {
        staging
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(|error| io_error(error, "chmod", staging.path()))?;
    }
    staging
        .write_all(contents)
        .map_err(|error| io_error(error, "write", path))?;
    staging
        .persist(path)
        .map_err(|error| io_error(error.error, "rename", path))?;
    Ok(())
}

fn io_error(error: std::io::Error, operation: &'static str, path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from(error)
        .with_metadata("operation", operation)
        .with_metadata("path", path.to_string_lossy().to_string())
}
