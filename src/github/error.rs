//! Error types for GitHub API access.

use thiserror::Error;

use crate::http::HttpClientError;

/// Errors raised by the GitHub client. Every variant is fatal for a repository sync.
#[derive(Debug, Error)]
pub enum GithubError {
    /// `GITHUB_TOKEN` is not set
    #[error(
        "Missing GitHub token. Please export {env_var} with a fine-grained token that can read your repositories."
    )]
    MissingToken {
        /// Environment variable that was checked
        env_var: String,
    },

    /// A configured slug was blank
    #[error("Repository slug cannot be empty.")]
    EmptySlug,

    /// `GET /repos/{slug}` returned 404
    #[error("Repository '{slug}' does not exist or is private.")]
    RepoNotFound {
        /// The slug that was requested
        slug: String,
    },

    /// `GET /users/{user}/repos` returned 404
    #[error("GitHub user '{user}' does not exist or is private.")]
    UserNotFound {
        /// The account that was requested
        user: String,
    },

    /// Any other non-success status
    #[error("GitHub API error for '{target}': HTTP {status}{}", format_detail(.detail.as_deref()))]
    Api {
        /// Slug or user the request was about
        target: String,
        /// HTTP status code
        status: u16,
        /// `message` field from the API error body when present
        detail: Option<String>,
    },

    /// The request never produced a response (DNS, TLS, timeout)
    #[error("GitHub API request for '{target}' failed: {source}")]
    Transport {
        /// Slug or user the request was about
        target: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON shape we expect
    #[error("Unexpected GitHub API response for '{target}': {source}")]
    Decode {
        /// Slug or user the request was about
        target: String,
        /// Underlying decode error
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built
    #[error(transparent)]
    Client(#[from] HttpClientError),
}

fn format_detail(detail: Option<&str>) -> String {
    detail.map(|text| format!(" ({text})")).unwrap_or_default()
}

impl GithubError {
    /// Creates a `Transport` error, or a `Decode` error when reqwest failed on the body.
    #[must_use]
    pub fn from_reqwest(target: &str, source: reqwest::Error) -> Self {
        if source.is_decode() {
            Self::Decode {
                target: target.to_string(),
                source,
            }
        } else {
            Self::Transport {
                target: target.to_string(),
                source,
            }
        }
    }
}
