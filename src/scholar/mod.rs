//! Google Scholar access: the [`CitationSource`] seam, its direct/proxied HTML
//! and SerpAPI implementations, the relay chain that picks one, and the
//! fetch loop that turns a profile into full publication records.

mod direct;
mod error;
mod fetch;
mod free_proxy;
pub(crate) mod html;
mod relay;
mod serpapi;

pub use direct::{DEFAULT_SCHOLAR_BASE_URL, ScholarHtmlSource};
pub use error::{RelayError, ScholarError};
pub use fetch::fetch_publications;
pub use free_proxy::{DEFAULT_PROXY_LIST_URL, parse_proxy_list, probe_proxies};
pub use relay::{RelayEndpoints, RelayEnv, configure_session};
pub use serpapi::{DEFAULT_SERPAPI_BASE_URL, SerpApiSource, verify_api_key};

use std::time::Duration;

use async_trait::async_trait;

use crate::publication::{Publication, PublicationStub};

/// Default per-request timeout for Scholar and relay calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Profile page size for both sources.
pub const PROFILE_PAGE_SIZE: usize = 100;

/// Upper bound on profile pages, in case a source keeps returning full pages.
pub(crate) const MAX_PROFILE_PAGES: usize = 50;

/// An author profile: display name plus publication stubs in profile order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorProfile {
    /// Display name, when the source reports one.
    pub name: Option<String>,
    /// Listed publications.
    pub publications: Vec<PublicationStub>,
}

/// A place to fetch author profiles and publication details from.
#[async_trait]
pub trait CitationSource: Send + Sync {
    /// Short name for logs (`"serpapi"`, `"direct"`, `"free-proxy"`).
    fn label(&self) -> &'static str;

    /// Fetches the profile with all publication stubs.
    async fn fetch_author(&self, user_id: &str) -> Result<AuthorProfile, ScholarError>;

    /// Fetches full bibliographic data for one stub.
    async fn fill_publication(&self, stub: &PublicationStub) -> Result<Publication, ScholarError>;
}

/// Copies one labelled detail value into `publication`.
///
/// Labels are matched case-insensitively with `_` read as a space, so the
/// HTML table labels (`Publication date`) and relay JSON keys
/// (`publication_date`) share one mapping. Unknown labels are ignored.
pub(crate) fn apply_detail_field(publication: &mut Publication, label: &str, value: String) {
    let value = value.trim().to_string();
    if value.is_empty() {
        return;
    }
    match label.trim().to_ascii_lowercase().replace('_', " ").as_str() {
        "authors" | "inventors" => {
            if let Some(authors) = join_authors(&value) {
                publication.author = Some(authors);
            }
        }
        "publication date" => {
            if let Some(year) = html::extract_year(&value) {
                publication.pub_year = Some(year);
            }
        }
        "journal" => publication.journal = Some(value),
        "conference" | "book" => publication.booktitle = Some(value),
        "volume" => publication.volume = Some(value),
        "issue" => publication.number = Some(value),
        "pages" => publication.pages = Some(value),
        "publisher" => publication.publisher = Some(value),
        "description" => publication.abstract_text = Some(value),
        _ => {}
    }
}

/// Joins a comma-separated author list with `" and "`.
pub(crate) fn join_authors(authors: &str) -> Option<String> {
    let joined = authors
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "...")
        .collect::<Vec<_>>()
        .join(" and ");
    (!joined.is_empty()).then_some(joined)
}
