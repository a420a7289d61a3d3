//! Project scopes and engine-wide options.

use confhub_domain::ProjectId;
use confhub_ports::{DEFAULT_SYSTEM_FILE, DEFAULT_USER_FILE, ProjectFiles};
use std::fmt;
use std::path::{Path, PathBuf};

/// Location label used for the global configuration.
pub const GLOBAL_LOCATION: &str = "<global>";

/// Which configuration a call addresses.
///
/// Directories are used as given; two spellings of the same directory are
/// two cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectScope {
    /// Configuration in the default directory.
    Global,
    /// Configuration of one project directory.
    Dir(PathBuf),
}

impl ProjectScope {
    /// Scope of a project directory.
    #[must_use]
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self::Dir(path.into())
    }

    /// `Dir` when a directory is given, otherwise `Global`.
    #[must_use]
    pub fn from_option(path: Option<&Path>) -> Self {
        path.map_or(Self::Global, |path| Self::Dir(path.to_path_buf()))
    }

    /// Project directory, `None` for the global scope.
    #[must_use]
    pub fn project_dir(&self) -> Option<&Path> {
        match self {
            Self::Global => None,
            Self::Dir(path) => Some(path),
        }
    }

    /// Label used in logs and errors.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Global => GLOBAL_LOCATION.to_owned(),
            Self::Dir(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => formatter.write_str(GLOBAL_LOCATION),
            Self::Dir(path) => write!(formatter, "{}", path.display()),
        }
    }
}

/// Options shared by the loader and the mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Directory of the global configuration.
    pub default_dir: PathBuf,
    /// INI file name inside a project directory.
    pub system_file_name: Box<str>,
    /// JSON file name inside a project directory.
    pub user_file_name: Box<str>,
    /// Project id used for the remote fallback of the global configuration.
    pub default_project_id: Option<ProjectId>,
    /// Copy files to timestamped backups before rewriting them.
    pub backups: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("."),
            system_file_name: DEFAULT_SYSTEM_FILE.into(),
            user_file_name: DEFAULT_USER_FILE.into(),
            default_project_id: None,
            backups: true,
        }
    }
}

impl EngineOptions {
    /// Files of `scope`.
    #[must_use]
    pub fn files_for(&self, scope: &ProjectScope) -> ProjectFiles {
        let dir = scope.project_dir().unwrap_or(&self.default_dir);
        ProjectFiles::new(dir, &self.system_file_name, &self.user_file_name)
    }

    /// Project id sent to the remote service for `scope`.
    ///
    /// Project directories use their last path segment.
    #[must_use]
    pub fn project_id_for(&self, scope: &ProjectScope) -> Option<ProjectId> {
        match scope {
            ProjectScope::Global => self.default_project_id.clone(),
            ProjectScope::Dir(path) => ProjectId::from_project_dir(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_scope_uses_the_default_directory() {
        let options = EngineOptions {
            default_dir: PathBuf::from("/etc/confhub"),
            ..EngineOptions::default()
        };
        let files = options.files_for(&ProjectScope::Global);
        assert_eq!(files.system, PathBuf::from("/etc/confhub/system.conf"));
        assert_eq!(files.user, PathBuf::from("/etc/confhub/config.json"));
        assert_eq!(options.project_id_for(&ProjectScope::Global), None);
    }

    #[test]
    fn project_scope_derives_the_id_from_the_last_segment() {
        let options = EngineOptions::default();
        let scope = ProjectScope::dir("/srv/projects/fay");
        assert_eq!(
            options
                .project_id_for(&scope)
                .as_ref()
                .map(ProjectId::as_str),
            Some("fay")
        );
        assert_eq!(scope.location(), "/srv/projects/fay");
        assert_eq!(ProjectScope::from_option(None).to_string(), GLOBAL_LOCATION);
    }
}
