//! Authenticated GitHub REST client for repository discovery and metadata.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::{HttpClientError, HttpClientOptions, build_http_client};
use crate::user_agent;

use super::GithubError;
use super::record::{RepoMetadata, RepoPayload};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Environment variable holding the API token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Page size for `GET /users/{user}/repos`.
pub const REPOS_PER_PAGE: usize = 100;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_VERSION: &str = "2022-11-28";
const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct RepoListEntry {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Returns the token when `value` holds a non-blank one.
///
/// # Errors
///
/// Returns [`GithubError::MissingToken`] for a missing or blank value.
pub fn require_token(value: Option<String>) -> Result<String, GithubError> {
    value
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| GithubError::MissingToken {
            env_var: TOKEN_ENV_VAR.to_string(),
        })
}

/// GitHub REST client with the fixed header set.
pub struct GithubClient {
    client: Client,
    base_url: String,
}

impl GithubClient {
    /// Creates a client against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError`] if the token is not a valid header value or client construction fails.
    pub fn new(token: &str) -> Result<Self, GithubError> {
        Self::with_base_url(token, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL (GitHub Enterprise, or wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`GithubError`] if the token is not a valid header value or client construction fails.
    pub fn with_base_url(
        token: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GithubError> {
        let options = HttpClientOptions::new(timeout, user_agent::github_user_agent())
            .with_default_headers(default_headers(token)?);
        let client = build_http_client("github", options)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Lists every repository owned by `user`, in API order (most recently updated first).
    ///
    /// A blank user yields an empty list without a request.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::UserNotFound`] on 404 and other [`GithubError`]s on any
    /// non-success status or transport failure.
    #[tracing::instrument(skip(self), fields(user = %user.trim()))]
    pub async fn list_user_repos(&self, user: &str) -> Result<Vec<String>, GithubError> {
        let username = user.trim();
        if username.is_empty() {
            return Ok(Vec::new());
        }

        let base = format!(
            "{}/users/{}/repos",
            self.base_url,
            urlencoding::encode(username)
        );
        let mut slugs = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!(
                "{base}?type=owner&per_page={REPOS_PER_PAGE}&page={page}&sort=updated&direction=desc"
            );
            debug!(%url, page, "listing repositories");
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| GithubError::from_reqwest(username, source))?;

            if response.status() == StatusCode::NOT_FOUND {
                return Err(GithubError::UserNotFound {
                    user: username.to_string(),
                });
            }
            let response = ensure_success(response, username).await?;

            let entries: Vec<RepoListEntry> = response
                .json()
                .await
                .map_err(|source| GithubError::from_reqwest(username, source))?;
            if entries.is_empty() {
                break;
            }

            let page_len = entries.len();
            slugs.extend(
                entries
                    .into_iter()
                    .filter_map(|entry| entry.full_name)
                    .filter(|name| !name.is_empty()),
            );
            if page_len < REPOS_PER_PAGE {
                break;
            }
            page += 1;
        }

        info!("Discovered {} repos for user '{}'.", slugs.len(), username);
        Ok(slugs)
    }

    /// Fetches metadata for one `owner/name` slug.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::EmptySlug`] for a blank slug, [`GithubError::RepoNotFound`]
    /// on 404, and other [`GithubError`]s on any other failure.
    #[tracing::instrument(skip(self), fields(slug = %slug.trim()))]
    pub async fn fetch_repo(&self, slug: &str) -> Result<RepoMetadata, GithubError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(GithubError::EmptySlug);
        }

        let url = format!("{}/repos/{}", self.base_url, slug);
        debug!(%url, "fetching repository");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| GithubError::from_reqwest(slug, source))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GithubError::RepoNotFound {
                slug: slug.to_string(),
            });
        }
        let response = ensure_success(response, slug).await?;

        let payload: RepoPayload = response
            .json()
            .await
            .map_err(|source| GithubError::from_reqwest(slug, source))?;
        Ok(RepoMetadata::from_payload(slug, payload))
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn default_headers(token: &str) -> Result<HeaderMap, HttpClientError> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        HttpClientError::invalid_header(
            "Authorization",
            "GITHUB_TOKEN must not contain newlines or control characters",
        )
    })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MEDIA_TYPE));
    headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
    Ok(headers)
}

async fn ensure_success(response: Response, target: &str) -> Result<Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    debug!(status = status.as_u16(), ?detail, "GitHub API error");
    Err(GithubError::Api {
        target: target.to_string(),
        status: status.as_u16(),
        detail,
    })
}
