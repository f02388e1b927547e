//! Error types for site configuration loading.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that prevent reading a required value from a site config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist
    #[error(
        "Configuration file {} not found.\n  Suggestion: ensure the file exists and contains your Google Scholar user ID",
        .path.display()
    )]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The file exists but could not be read
    #[error("Unable to read configuration file {}: {source}", .path.display())]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML
    #[error(
        "Error parsing YAML file {}: {source}\n  Suggestion: verify the YAML syntax",
        .path.display()
    )]
    Parse {
        /// Path of the malformed file
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The required key is absent, empty, or not a string
    #[error(
        "No '{key}' key found in {}.\n  Suggestion: add it before running this command",
        .path.display()
    )]
    MissingKey {
        /// Config file path
        path: PathBuf,
        /// Name of the missing key
        key: String,
    },
}

impl ConfigError {
    /// Creates a `MissingKey` error.
    #[must_use]
    pub fn missing_key(path: &Path, key: &str) -> Self {
        Self::MissingKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        }
    }
}
