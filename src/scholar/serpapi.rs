//! SerpAPI relay for Google Scholar author and citation lookups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::http::{HttpClientOptions, build_http_client, parse_retry_after};
use crate::publication::{Publication, PublicationStub, non_blank};
use crate::user_agent;

use super::{
    AuthorProfile, CitationSource, MAX_PROFILE_PAGES, PROFILE_PAGE_SIZE, RelayError, ScholarError,
    apply_detail_field,
};

/// Public SerpAPI host.
pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Deserialize)]
struct AuthorResponse {
    error: Option<String>,
    author: Option<AuthorSummary>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct AuthorSummary {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    citation_id: Option<String>,
    publication: Option<String>,
    year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CitationResponse {
    error: Option<String>,
    citation: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    error: Option<String>,
}

// Every request URL carries the API key, so reqwest errors are stripped of
// their URL before they can reach a log line.
fn relay_client(timeout: Duration) -> Result<Client, crate::http::HttpClientError> {
    build_http_client(
        "serpapi",
        HttpClientOptions::new(timeout, user_agent::scholar_user_agent()),
    )
}

/// Checks `api_key` against the account endpoint.
///
/// # Errors
///
/// Returns [`RelayError`] when the key is rejected or the check cannot be made.
#[tracing::instrument(skip(api_key))]
pub async fn verify_api_key(
    base_url: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<(), RelayError> {
    let client = relay_client(timeout)?;
    let url = format!(
        "{}/account.json?api_key={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(api_key)
    );
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| RelayError::Transport {
            source: source.without_url(),
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(RelayError::InvalidKey {
            status: status.as_u16(),
        });
    }
    let body: AccountResponse = response
        .json()
        .await
        .map_err(|source| RelayError::Transport {
            source: source.without_url(),
        })?;
    match body.error {
        Some(message) => Err(RelayError::Account { message }),
        None => Ok(()),
    }
}

/// Citation source backed by SerpAPI's `google_scholar_author` engine.
pub struct SerpApiSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SerpApiSource {
    /// Creates a source for `base_url` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ScholarError::Client`] if client construction fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScholarError> {
        Ok(Self {
            client: relay_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn search_url(&self, params: &str) -> String {
        format!(
            "{}/search.json?engine=google_scholar_author&{params}&api_key={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        )
    }

    async fn get(&self, url: &str, target: &str) -> Result<Response, ScholarError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScholarError::transport(target, source.without_url()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        Err(ScholarError::Http {
            target: target.to_string(),
            status: status.as_u16(),
            retry_after,
        })
    }
}

impl std::fmt::Debug for SerpApiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApiSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CitationSource for SerpApiSource {
    fn label(&self) -> &'static str {
        "serpapi"
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_author(&self, user_id: &str) -> Result<AuthorProfile, ScholarError> {
        let target = format!("profile '{user_id}'");
        let mut profile = AuthorProfile::default();

        for page in 0..MAX_PROFILE_PAGES {
            let url = self.search_url(&format!(
                "author_id={}&start={}&num={PROFILE_PAGE_SIZE}",
                urlencoding::encode(user_id),
                page * PROFILE_PAGE_SIZE
            ));
            debug!(page, "fetching serpapi author page");
            let body: AuthorResponse = self
                .get(&url, &target)
                .await?
                .json()
                .await
                .map_err(|source| ScholarError::transport(&target, source.without_url()))?;
            if let Some(message) = body.error {
                return Err(ScholarError::Relay { target, message });
            }
            if profile.name.is_none() {
                profile.name = body.author.and_then(|author| non_blank(author.name));
            }

            let page_len = body.articles.len();
            profile
                .publications
                .extend(body.articles.into_iter().filter_map(|article| {
                    Some(PublicationStub {
                        source_id: non_blank(article.citation_id)?,
                        title: article.title.unwrap_or_default(),
                        year: non_blank(article.year),
                        citation: non_blank(article.publication),
                    })
                }));
            if page_len < PROFILE_PAGE_SIZE {
                break;
            }
        }
        Ok(profile)
    }

    #[tracing::instrument(skip(self, stub), fields(id = %stub.source_id))]
    async fn fill_publication(&self, stub: &PublicationStub) -> Result<Publication, ScholarError> {
        let target = format!("'{}'", stub.display_title());
        let url = self.search_url(&format!(
            "view_op=view_citation&citation_id={}",
            urlencoding::encode(&stub.source_id)
        ));
        let body: CitationResponse = self
            .get(&url, &target)
            .await?
            .json()
            .await
            .map_err(|source| ScholarError::transport(&target, source.without_url()))?;
        if let Some(message) = body.error {
            return Err(ScholarError::Relay { target, message });
        }
        let citation = body
            .citation
            .ok_or_else(|| ScholarError::parse(&target, "response has no 'citation' object"))?;

        let mut publication = Publication::from_stub(stub);
        for (label, value) in citation {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                _ => continue,
            };
            match label.as_str() {
                "title" => publication.title = non_blank(Some(text)).or(publication.title),
                "link" => publication.pub_url = non_blank(Some(text)),
                _ => apply_detail_field(&mut publication, &label, text),
            }
        }
        Ok(publication)
    }
}
