//! Entry classification, field selection and rendering.

use crate::publication::Publication;

use super::key::{KeyAllocator, MISSING_YEAR, base_key};

/// Author written (and keyed on) when a publication lists none.
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Title written when a publication has none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// BibTeX entry types this tool emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Has a journal.
    Article,
    /// Has a conference or book title.
    InProceedings,
    /// Citation line mentions a thesis.
    PhdThesis,
    /// Anything else.
    Misc,
}

impl EntryType {
    /// Lowercase BibTeX name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::InProceedings => "inproceedings",
            Self::PhdThesis => "phdthesis",
            Self::Misc => "misc",
        }
    }

    /// Classifies by the first matching rule: journal, booktitle, thesis, misc.
    #[must_use]
    pub fn classify(publication: &Publication) -> Self {
        if has_text(publication.journal.as_deref()) {
            Self::Article
        } else if has_text(publication.booktitle.as_deref()) {
            Self::InProceedings
        } else if publication
            .citation
            .as_deref()
            .is_some_and(|citation| citation.to_lowercase().contains("thesis"))
        {
            Self::PhdThesis
        } else {
            Self::Misc
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered entry and the key it was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    /// Unique citation key.
    pub key: String,
    /// Entry type.
    pub entry_type: EntryType,
    /// Full entry text, ending in `}\n`.
    pub text: String,
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}

fn text_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|text| has_text(Some(*text))).unwrap_or(default)
}

/// Trims and collapses internal whitespace runs to single spaces.
#[must_use]
pub fn sanitize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Selects `(name, value)` pairs in output order, omitting empty values.
///
/// Author and title are always present, falling back to [`DEFAULT_AUTHOR`]
/// and [`DEFAULT_TITLE`].
#[must_use]
pub fn select_fields(
    publication: &Publication,
    entry_type: EntryType,
) -> Vec<(&'static str, String)> {
    let year = publication
        .pub_year
        .as_deref()
        .filter(|year| !year.trim().is_empty())
        .unwrap_or(MISSING_YEAR);
    let url = publication
        .pub_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .or(publication.url.as_deref());

    let candidates: [(&'static str, Option<&str>); 11] = [
        ("author", Some(text_or(publication.author.as_deref(), DEFAULT_AUTHOR))),
        ("title", Some(text_or(publication.title.as_deref(), DEFAULT_TITLE))),
        ("journal", publication.journal.as_deref()),
        ("booktitle", publication.booktitle.as_deref()),
        ("publisher", publication.publisher.as_deref()),
        ("volume", publication.volume.as_deref()),
        ("number", publication.number.as_deref()),
        ("pages", publication.pages.as_deref()),
        ("year", Some(year)),
        ("abstract", publication.abstract_text.as_deref()),
        ("url", url),
    ];

    let mut fields: Vec<(&'static str, String)> = candidates
        .into_iter()
        .filter(|(name, _)| match entry_type {
            EntryType::Article => *name != "booktitle",
            EntryType::InProceedings => *name != "journal",
            EntryType::PhdThesis | EntryType::Misc => true,
        })
        .filter_map(|(name, value)| {
            let cleaned = sanitize(value?);
            (!cleaned.is_empty()).then_some((name, cleaned))
        })
        .collect();
    fields.push(("bibtex_show", "true".to_string()));
    fields
}

/// Renders one entry: `@type{key,`, one `  name = {value}` line per field, `}`.
#[must_use]
pub fn render_entry(key: &str, entry_type: EntryType, fields: &[(&'static str, String)]) -> String {
    let body = fields
        .iter()
        .map(|(name, value)| format!("  {name} = {{{value}}}"))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("@{entry_type}{{{key},\n{body}\n}}\n")
}

/// Sorts newest first, then by title descending. Ties keep input order.
pub fn sort_publications(publications: &mut [Publication]) {
    publications.sort_by(|a, b| {
        b.sort_year().cmp(&a.sort_year()).then_with(|| {
            let title_a = a.title.as_deref().unwrap_or_default();
            let title_b = b.title.as_deref().unwrap_or_default();
            title_b.cmp(title_a)
        })
    });
}

/// Sorts, assigns unique keys in sorted order, and renders every entry.
#[must_use]
pub fn build_entries(mut publications: Vec<Publication>) -> Vec<BibEntry> {
    sort_publications(&mut publications);

    let mut keys = KeyAllocator::new();
    publications
        .iter()
        .map(|publication| {
            let base = base_key(
                text_or(publication.author.as_deref(), DEFAULT_AUTHOR),
                publication.pub_year.as_deref(),
            );
            let key = keys.assign(&base);
            let entry_type = EntryType::classify(publication);
            let text = render_entry(&key, entry_type, &select_fields(publication, entry_type));
            BibEntry {
                key,
                entry_type,
                text,
            }
        })
        .collect()
}
