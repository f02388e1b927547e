//! Repository metadata records and the GitHub payload they are mapped from.

use serde::{Deserialize, Serialize};

/// Subset of the GitHub `repository` object used by the sync.
///
/// Every field is optional; the API returns `null` for unset descriptions,
/// homepages and languages.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RepoPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub topics: Option<Vec<String>>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: Option<u64>,
    pub updated_at: Option<String>,
}

/// One entry of `github_repos_metadata` in the site data file.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// `owner/name`, the record identity.
    pub slug: String,
    /// Display name; falls back to the last slug segment.
    pub name: String,
    /// Repository description (may be empty).
    pub description: String,
    /// GitHub topics.
    pub keywords: Vec<String>,
    /// Homepage URL (may be empty).
    pub homepage: String,
    /// Primary language (may be empty).
    pub language: String,
    /// Stargazer count.
    pub stars: u64,
    /// `updated_at` timestamp as returned by the API.
    pub updated: Option<String>,
}

impl RepoMetadata {
    pub(crate) fn from_payload(slug: &str, payload: RepoPayload) -> Self {
        let fallback_name = slug.rsplit('/').next().unwrap_or(slug).to_string();
        Self {
            slug: slug.to_string(),
            name: non_empty(payload.name).unwrap_or(fallback_name),
            description: payload.description.unwrap_or_default(),
            keywords: payload.topics.unwrap_or_default(),
            homepage: payload.homepage.unwrap_or_default(),
            language: payload.language.unwrap_or_default(),
            stars: payload.stargazers_count.unwrap_or(0),
            updated: payload.updated_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
