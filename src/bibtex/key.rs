//! Citation key derivation and collision resolution.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Substituted when slugification leaves nothing.
pub const FALLBACK_KEY: &str = "publication";

/// Year segment used when a publication has no year.
pub const MISSING_YEAR: &str = "n.d.";

#[allow(clippy::expect_used)]
static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("key separator regex is valid"));

/// Normalizes text into a key-safe ASCII slug.
///
/// Diacritics are stripped via NFKD, each run of non-alphanumerics becomes a
/// single `-`, and the result is trimmed and lowercased.
///
/// ```
/// use site_sync::bibtex::slugify;
///
/// assert_eq!(slugify("Müller-2021"), "muller-2021");
/// assert_eq!(slugify("  "), "publication");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let ascii: String = text.nfkd().filter(|ch| !is_combining_mark(*ch)).collect();
    let replaced = NON_ALNUM_RUN.replace_all(&ascii, "-");
    let slug = replaced.trim_matches('-').to_ascii_lowercase();
    if slug.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        slug
    }
}

/// Last whitespace-separated token of the first `" and "`-separated author.
#[must_use]
pub fn first_author_surname(authors: &str) -> &str {
    authors
        .split(" and ")
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .last()
        .unwrap_or(FALLBACK_KEY)
}

/// Builds the `surname-year` base key, before collision resolution.
#[must_use]
pub fn base_key(authors: &str, year: Option<&str>) -> String {
    let year = year.map(str::trim).filter(|y| !y.is_empty()).unwrap_or(MISSING_YEAR);
    slugify(&format!("{}-{year}", first_author_surname(authors)))
}

/// Hands out keys that are unique within one bibliography.
///
/// A taken base gets `-2`, `-3`, … appended, using the first free suffix.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    assigned: HashSet<String>,
}

impl KeyAllocator {
    /// Creates an allocator with no keys taken.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique key for `base` and marks it taken.
    pub fn assign(&mut self, base: &str) -> String {
        let mut key = base.to_string();
        let mut index = 2u32;
        while self.assigned.contains(&key) {
            key = format!("{base}-{index}");
            index += 1;
        }
        self.assigned.insert(key.clone());
        key
    }

    /// Number of keys handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// True when no key has been handed out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
