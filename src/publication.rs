//! Publication records shared by the Scholar sources and the BibTeX builder.

/// A publication as listed on an author profile, before its detail is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationStub {
    /// Title shown on the profile (used in warnings when the detail fetch fails).
    pub title: String,
    /// Year column of the profile, when present.
    pub year: Option<String>,
    /// Free-text venue line, e.g. `"Nature 521 (7553), 436-444, 2015"`.
    pub citation: Option<String>,
    /// Opaque identifier the source needs to fetch the detail.
    pub source_id: String,
}

impl PublicationStub {
    /// Title for log messages.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Unknown title"
        } else {
            &self.title
        }
    }
}

/// Full bibliographic record.
///
/// Fields mirror BibTeX field names; every field is optional because upstream
/// detail pages omit whatever they do not know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Publication {
    /// Title.
    pub title: Option<String>,
    /// Authors joined with `" and "`.
    pub author: Option<String>,
    /// Publication year.
    pub pub_year: Option<String>,
    /// Journal name.
    pub journal: Option<String>,
    /// Conference or book title.
    pub booktitle: Option<String>,
    /// Publisher.
    pub publisher: Option<String>,
    /// Volume.
    pub volume: Option<String>,
    /// Issue number.
    pub number: Option<String>,
    /// Page range.
    pub pages: Option<String>,
    /// Abstract.
    pub abstract_text: Option<String>,
    /// URL listed in the bibliographic data.
    pub url: Option<String>,
    /// Landing page of the publication; preferred over `url`.
    pub pub_url: Option<String>,
    /// Free-text citation line, only used to recognise theses.
    pub citation: Option<String>,
}

impl Publication {
    /// Seeds a record with what the profile listing already knows.
    #[must_use]
    pub fn from_stub(stub: &PublicationStub) -> Self {
        Self {
            title: non_blank(Some(stub.title.clone())),
            pub_year: non_blank(stub.year.clone()),
            citation: non_blank(stub.citation.clone()),
            ..Self::default()
        }
    }

    /// Year as a number for sorting; missing or unparsable years sort as 0.
    #[must_use]
    pub fn sort_year(&self) -> i64 {
        self.pub_year
            .as_deref()
            .and_then(|year| year.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// `None` for missing or whitespace-only values.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
