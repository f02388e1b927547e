//! Loading and writing the repository aggregate (`_data/repositories.yml`).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::DataFileError;

pub(crate) const GITHUB_USERS_KEY: &str = "github_users";
pub(crate) const GITHUB_REPOS_KEY: &str = "github_repos";
pub(crate) const METADATA_KEY: &str = "github_repos_metadata";
pub(crate) const DESCRIPTION_LINES_KEY: &str = "repo_description_lines_max";

/// The previous run's aggregate document, kept as an ordered mapping so
/// keys this tool does not manage survive a rewrite untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteData {
    raw: Mapping,
}

impl SiteData {
    /// Wraps an already-parsed mapping.
    #[must_use]
    pub fn from_mapping(raw: Mapping) -> Self {
        Self { raw }
    }

    /// Loads and parses the data file.
    ///
    /// A document that is only `null` (e.g. a lone comment) loads as an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError`] when the file is missing, zero bytes, unreadable,
    /// not YAML, or not a mapping.
    #[tracing::instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, DataFileError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(DataFileError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(DataFileError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if raw.is_empty() {
            return Err(DataFileError::Empty {
                path: path.to_path_buf(),
            });
        }

        let document: Value =
            serde_yaml::from_str(&raw).map_err(|source| DataFileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        match document {
            Value::Mapping(raw) => {
                debug!(keys = raw.len(), "loaded site data");
                Ok(Self { raw })
            }
            Value::Null => Ok(Self::default()),
            _ => Err(DataFileError::NotMapping {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The underlying mapping in file order.
    #[must_use]
    pub fn as_mapping(&self) -> &Mapping {
        &self.raw
    }

    /// Looks up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Accounts whose repositories are discovered (`github_users`).
    #[must_use]
    pub fn github_users(&self) -> Vec<String> {
        self.string_list(GITHUB_USERS_KEY)
    }

    /// Explicitly configured slugs (`github_repos`), trimmed, blanks dropped.
    #[must_use]
    pub fn github_repos(&self) -> Vec<String> {
        self.string_list(GITHUB_REPOS_KEY)
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        let Some(Value::Sequence(items)) = self.raw.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Serializes `document` and writes it to `path`.
///
/// # Errors
///
/// Returns [`DataFileError`] when serialization or the write fails.
pub fn write_data_file(path: &Path, document: &Mapping) -> Result<(), DataFileError> {
    let text = serde_yaml::to_string(document)
        .map_err(|source| DataFileError::Serialize { source })?;
    fs::write(path, text).map_err(|source| DataFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("repositories.yml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SiteData::load(&dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, DataFileError::NotFound { .. }), "{err:?}");
    }

    #[test]
    fn test_load_zero_byte_file() {
        let dir = TempDir::new().unwrap();
        let err = SiteData::load(&write(&dir, "")).unwrap_err();
        assert!(matches!(err, DataFileError::Empty { .. }), "{err:?}");
        assert!(err.to_string().contains("restore the file"));
    }

    #[test]
    fn test_load_comment_only_file_is_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let data = SiteData::load(&write(&dir, "# nothing yet\n")).unwrap();
        assert!(data.as_mapping().is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let err = SiteData::load(&write(&dir, "github_users: [a\n")).unwrap_err();
        assert!(matches!(err, DataFileError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn test_load_rejects_top_level_sequence() {
        let dir = TempDir::new().unwrap();
        let err = SiteData::load(&write(&dir, "- a\n- b\n")).unwrap_err();
        assert!(matches!(err, DataFileError::NotMapping { .. }), "{err:?}");
    }

    #[test]
    fn test_string_lists_trim_and_skip_blanks() {
        let dir = TempDir::new().unwrap();
        let data = SiteData::load(&write(
            &dir,
            "github_users:\n  - octo\n  - ''\ngithub_repos:\n  - ' octo/a '\n  - null\n",
        ))
        .unwrap();
        assert_eq!(data.github_users(), vec!["octo"]);
        assert_eq!(data.github_repos(), vec!["octo/a"]);
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let data = SiteData::default();
        assert!(data.github_users().is_empty());
        assert!(data.github_repos().is_empty());
    }
}
