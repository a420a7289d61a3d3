//! Project identity primitives.

use confhub_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Validation failures for project primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectIdError {
    /// `ProjectId` is empty after trimming.
    Empty {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `ProjectId` contains a path separator and cannot be used in a URL segment.
    ContainsSeparator {
        /// Trimmed input that failed validation.
        input: String,
    },
}

impl fmt::Display for ProjectIdError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { .. } => formatter.write_str("ProjectId must be non-empty"),
            Self::ContainsSeparator { input } => {
                write!(formatter, "ProjectId must not contain '/' or '\\': {input}")
            },
        }
    }
}

impl std::error::Error for ProjectIdError {}

impl From<ProjectIdError> for ErrorEnvelope {
    fn from(error: ProjectIdError) -> Self {
        let message = error.to_string();
        let envelope = Self::expected(ErrorCode::new("domain", "invalid_project_id"), message);
        match error {
            ProjectIdError::Empty { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            ProjectIdError::ContainsSeparator { input } => envelope.with_metadata("input", input),
        }
    }
}

/// Stable identifier of a tenant project, used by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Box<str>);

impl ProjectId {
    /// Parse a `ProjectId` from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, ProjectIdError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectIdError::Empty {
                input_length: raw.len(),
            });
        }
        if trimmed.contains(['/', '\\']) {
            return Err(ProjectIdError::ContainsSeparator {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned().into_boxed_str()))
    }

    /// Derive a project id from the last segment of a project directory.
    ///
    /// Returns `None` for paths without a usable final segment (`/`, `..`, empty).
    #[must_use]
    pub fn from_project_dir(dir: &Path) -> Option<Self> {
        let name = dir.file_name()?.to_str()?;
        Self::parse(name).ok()
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Descriptive project metadata carried by remote payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Display name.
    pub name: Box<str>,
    /// Free-form description.
    pub description: Box<str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn project_id_is_trimmed() -> Result<(), ProjectIdError> {
        let id = ProjectId::parse("  fay-demo ")?;
        assert_eq!(id.as_str(), "fay-demo");
        Ok(())
    }

    #[test]
    fn project_id_rejects_empty_and_separators() {
        assert!(matches!(
            ProjectId::parse("   "),
            Err(ProjectIdError::Empty { input_length: 3 })
        ));
        assert!(matches!(
            ProjectId::parse("a/b"),
            Err(ProjectIdError::ContainsSeparator { .. })
        ));
    }

    #[test]
    fn project_id_derives_from_last_path_segment() {
        let dir = PathBuf::from("/srv/projects/alpha");
        assert_eq!(
            ProjectId::from_project_dir(&dir).map(|id| id.as_str().to_owned()),
            Some("alpha".to_owned())
        );
        assert_eq!(ProjectId::from_project_dir(Path::new("/")), None);
    }

    #[test]
    fn project_id_error_maps_to_envelope() {
        let envelope: ErrorEnvelope = ProjectIdError::Empty { input_length: 2 }.into();
        assert_eq!(envelope.code.code(), "invalid_project_id");
        assert_eq!(
            envelope.metadata.get("input_length").map(String::as_str),
            Some("2")
        );
    }
}
