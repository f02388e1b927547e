//! Hand-authored entries that replace generated ones with the same key.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::BibtexError;

#[allow(clippy::expect_used)]
static ENTRY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+\{([^,]+),").expect("entry key regex is valid"));

/// Keys and verbatim text from the manual overrides file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualOverrides {
    /// Keys declared in the file.
    pub keys: HashSet<String>,
    /// Trimmed file content plus a trailing newline, or empty.
    pub text: String,
}

impl ManualOverrides {
    /// True when there is nothing to append.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Every entry key declared in `text`, trimmed.
#[must_use]
pub fn extract_keys(text: &str) -> HashSet<String> {
    ENTRY_KEY
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|key| key.as_str().trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

/// Loads the overrides file. A missing or whitespace-only file has no overrides.
///
/// # Errors
///
/// Returns [`BibtexError::ReadOverrides`] when the file exists but cannot be read.
pub fn load_manual_overrides(path: &Path) -> Result<ManualOverrides, BibtexError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(ManualOverrides::default()),
        Err(source) => {
            return Err(BibtexError::ReadOverrides {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(ManualOverrides::default());
    }

    let keys = extract_keys(trimmed);
    if keys.is_empty() {
        warn!("Manual overrides file has content but no BibTeX entries were detected.");
    } else {
        info!(
            "Found {} manual override key(s) that will replace auto-generated entries.",
            keys.len()
        );
    }

    Ok(ManualOverrides {
        keys,
        text: format!("{trimmed}\n"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_keys_all_entries() {
        let text = "@article{smith-2020,\n title={A}\n}\n\n@misc{ doe-n-d ,\n}\n";
        let keys = extract_keys(text);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("smith-2020"));
        assert!(keys.contains("doe-n-d"));
    }

    #[test]
    fn test_extract_keys_ignores_prose() {
        assert!(extract_keys("% just a comment with an @ sign\n").is_empty());
    }

    #[test]
    fn test_missing_file_has_no_overrides() {
        let dir = TempDir::new().unwrap();
        let overrides = load_manual_overrides(&dir.path().join("manual.bib")).unwrap();
        assert!(overrides.is_empty());
        assert!(overrides.keys.is_empty());
    }

    #[test]
    fn test_whitespace_only_file_has_no_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manual.bib");
        fs::write(&path, " \n\t\n").unwrap();
        assert!(load_manual_overrides(&path).unwrap().is_empty());
    }

    #[test]
    fn test_text_is_trimmed_plus_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manual.bib");
        fs::write(&path, "\n\n@book{knuth-1968,\n  title = {TAOCP}\n}\n\n\n").unwrap();
        let overrides = load_manual_overrides(&path).unwrap();
        assert_eq!(overrides.text, "@book{knuth-1968,\n  title = {TAOCP}\n}\n");
        assert!(overrides.keys.contains("knuth-1968"));
    }

    #[test]
    fn test_content_without_entries_keeps_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manual.bib");
        fs::write(&path, "% notes only\n").unwrap();
        let overrides = load_manual_overrides(&path).unwrap();
        assert!(overrides.keys.is_empty());
        assert_eq!(overrides.text, "% notes only\n");
    }
}
