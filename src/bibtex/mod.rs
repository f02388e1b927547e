//! BibTeX generation: citation keys, entry rendering, manual overrides, and
//! the managed bibliography file.

mod document;
mod entry;
mod key;
mod overrides;

pub use document::{merge_with_overrides, render_bibliography, write_bibliography};
pub use entry::{
    BibEntry, DEFAULT_AUTHOR, DEFAULT_TITLE, EntryType, build_entries, render_entry, sanitize,
    select_fields, sort_publications,
};
pub use key::{FALLBACK_KEY, KeyAllocator, MISSING_YEAR, base_key, first_author_surname, slugify};
pub use overrides::{ManualOverrides, extract_keys, load_manual_overrides};

use std::path::PathBuf;

use thiserror::Error;

/// Default managed bibliography path.
pub const DEFAULT_OUTPUT_PATH: &str = "_bibliography/papers.bib";

/// Default manual overrides path.
pub const DEFAULT_MANUAL_PATH: &str = "_bibliography/manual_overrides.bib";

/// Errors reading overrides or writing the bibliography.
#[derive(Debug, Error)]
pub enum BibtexError {
    /// The overrides file exists but could not be read
    #[error("Unable to read manual overrides {}: {source}", .path.display())]
    ReadOverrides {
        /// Overrides path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The bibliography could not be written
    #[error(
        "Unable to write {}: {source}\n  Suggestion: check that the directory is writable",
        .path.display()
    )]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
