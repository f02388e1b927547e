//! Error types for the repository data file.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing `_data/repositories.yml`.
#[derive(Debug, Error)]
pub enum DataFileError {
    /// The file does not exist
    #[error("Data file {} not found.", .path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The file exists but has zero bytes
    #[error(
        "Data file {} is empty. Please restore the file before running the sync.",
        .path.display()
    )]
    Empty {
        /// Path of the empty file
        path: PathBuf,
    },

    /// Reading or writing failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML
    #[error("Unable to parse {}: {source}", .path.display())]
    Parse {
        /// Path of the malformed file
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but its top level is not a mapping
    #[error(
        "Unable to parse {}: expected a mapping at the top level\n  Suggestion: keys such as 'github_users' must be top-level keys",
        .path.display()
    )]
    NotMapping {
        /// Path of the file
        path: PathBuf,
    },

    /// Records could not be converted to YAML
    #[error("Unable to serialize repository data: {source}")]
    Serialize {
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
}
