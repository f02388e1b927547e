//! Assembling and writing the managed bibliography.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{BibEntry, BibtexError, ManualOverrides};

/// Drops generated entries whose key is overridden. Returns the kept entries
/// and how many were dropped.
#[must_use]
pub fn merge_with_overrides(
    entries: Vec<BibEntry>,
    overrides: &ManualOverrides,
) -> (Vec<BibEntry>, usize) {
    let before = entries.len();
    let kept: Vec<BibEntry> = entries
        .into_iter()
        .filter(|entry| !overrides.keys.contains(&entry.key))
        .collect();
    let skipped = before - kept.len();
    if skipped > 0 {
        info!("Skipped {skipped} auto-generated entr(y/ies) due to manual overrides.");
    }
    (kept, skipped)
}

/// Renders the whole managed file.
#[must_use]
pub fn render_bibliography(
    entries: &[BibEntry],
    scholar_id: &str,
    overrides: &ManualOverrides,
    manual_label: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = format!(
        "%% Auto-generated on {} UTC\n%% Source: Google Scholar ID {scholar_id}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    for entry in entries {
        out.push_str(&entry.text);
        out.push('\n');
    }
    if !overrides.is_empty() {
        out.push_str(&format!(
            "\n%% Manual overrides appended from {manual_label}\n\n"
        ));
        out.push_str(overrides.text.trim_end());
        out.push('\n');
    }
    out
}

/// Writes `contents` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`BibtexError::Write`] when a directory or the file cannot be written.
pub fn write_bibliography(path: &Path, contents: &str) -> Result<(), BibtexError> {
    let write_error = |source: std::io::Error| BibtexError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}
