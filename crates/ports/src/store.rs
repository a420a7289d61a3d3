//! Local configuration file boundary contract.

use crate::BoxFuture;
use confhub_shared::{RequestContext, Result};
use std::path::{Path, PathBuf};

/// Default INI file name inside a project directory.
pub const DEFAULT_SYSTEM_FILE: &str = "system.conf";
/// Default JSON file name inside a project directory.
pub const DEFAULT_USER_FILE: &str = "config.json";
/// Suffix of backup files.
pub const BACKUP_SUFFIX: &str = ".bak";
/// Digits in a backup timestamp (`YYYYMMDDHHMMSS`).
pub const BACKUP_TIMESTAMP_DIGITS: usize = 14;

/// The two persisted files of one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectFiles {
    /// Project directory.
    pub dir: PathBuf,
    /// `system.conf` path.
    pub system: PathBuf,
    /// `config.json` path.
    pub user: PathBuf,
}

impl ProjectFiles {
    /// Resolve file paths inside `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, system_file: &str, user_file: &str) -> Self {
        let dir = dir.into();
        Self {
            system: dir.join(system_file),
            user: dir.join(user_file),
            dir,
        }
    }

    /// Resolve the default file names inside `dir`.
    #[must_use]
    pub fn with_defaults(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_SYSTEM_FILE, DEFAULT_USER_FILE)
    }
}

/// Path of the backup for `original` taken at `timestamp` (`YYYYMMDDHHMMSS`).
#[must_use]
pub fn backup_path_for(original: &Path, timestamp: &str) -> PathBuf {
    let mut name = original
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(timestamp);
    name.push(BACKUP_SUFFIX);
    original.with_file_name(name)
}

/// Returns true when `file_name` is a backup of `original_name`.
#[must_use]
pub fn is_backup_of(file_name: &str, original_name: &str) -> bool {
    let Some(rest) = file_name
        .strip_prefix(original_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(BACKUP_SUFFIX))
    else {
        return false;
    };
    rest.len() == BACKUP_TIMESTAMP_DIGITS && rest.bytes().all(|byte| byte.is_ascii_digit())
}

/// Boundary contract for reading and writing persisted configuration files.
///
/// Paths are absolute or relative to the process working directory; the
/// caller owns path composition.
pub trait ConfigStorePort: Send + Sync {
    /// Read a UTF-8 text file. Returns `None` when the file does not exist.
    fn read_text(&self, ctx: &RequestContext, path: PathBuf)
    -> BoxFuture<'_, Result<Option<Box<str>>>>;

    /// Replace the file contents, creating the file when missing.
    fn write_text(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
        contents: Box<str>,
    ) -> BoxFuture<'_, Result<()>>;

    /// Copy the current file to a timestamped backup next to it.
    ///
    /// Returns `None` when there is nothing to back up.
    fn backup(&self, ctx: &RequestContext, path: PathBuf)
    -> BoxFuture<'_, Result<Option<PathBuf>>>;

    /// Returns true when the file exists.
    fn exists(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<bool>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_files_join_names() {
        let files = ProjectFiles::with_defaults("/srv/alpha");
        assert_eq!(files.system, PathBuf::from("/srv/alpha/system.conf"));
        assert_eq!(files.user, PathBuf::from("/srv/alpha/config.json"));
    }

    #[test]
    fn backup_names_follow_the_timestamp_pattern() {
        let path = backup_path_for(Path::new("/srv/alpha/system.conf"), "20240102030405");
        assert_eq!(
            path,
            PathBuf::from("/srv/alpha/system.conf.20240102030405.bak")
        );
        assert!(is_backup_of("system.conf.20240102030405.bak", "system.conf"));
        assert!(!is_backup_of("system.conf.2024.bak", "system.conf"));
        assert!(!is_backup_of("config.json.20240102030405.bak", "system.conf"));
    }
}
