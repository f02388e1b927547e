//! Error types for citation sources and the relay chain.

use std::time::Duration;

use thiserror::Error;

use crate::http::{FailureType, HttpClientError, Retryable, classify_http_status};

/// Errors from fetching an author profile or publication detail.
#[derive(Debug, Error)]
pub enum ScholarError {
    /// Non-success HTTP status
    #[error("HTTP {status} from {target}")]
    Http {
        /// What was being fetched
        target: String,
        /// HTTP status code
        status: u16,
        /// Parsed `Retry-After`, when sent
        retry_after: Option<Duration>,
    },

    /// No response at all (DNS, TLS, timeout, reset)
    #[error("request for {target} failed: {source}")]
    Transport {
        /// What was being fetched
        target: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Scholar served a CAPTCHA or block page instead of content
    #[error(
        "Google Scholar blocked the request for {target}\n  Suggestion: set SERPAPI_API_KEY to route requests through SerpAPI"
    )]
    Blocked {
        /// What was being fetched
        target: String,
    },

    /// The response did not have the expected shape
    #[error("unexpected response for {target}: {detail}")]
    Parse {
        /// What was being fetched
        target: String,
        /// What was missing or malformed
        detail: String,
    },

    /// The relay answered with an error message
    #[error("SerpAPI error for {target}: {message}")]
    Relay {
        /// What was being fetched
        target: String,
        /// `error` field of the relay response
        message: String,
    },

    /// The author profile could not be fetched; the sync cannot continue
    #[error("Unable to fetch Google Scholar profile '{user_id}': {source}")]
    AuthorFetch {
        /// Scholar user id
        user_id: String,
        /// What went wrong
        #[source]
        source: Box<ScholarError>,
    },

    /// Nothing survived detail fetching
    #[error("No publications retrieved from Google Scholar.")]
    NoPublications,

    /// The HTTP client could not be built
    #[error(transparent)]
    Client(#[from] HttpClientError),
}

impl ScholarError {
    /// Creates a `Transport` error for `target`.
    #[must_use]
    pub fn transport(target: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            target: target.to_string(),
            source,
        }
    }

    /// Creates a `Parse` error for `target`.
    #[must_use]
    pub fn parse(target: &str, detail: impl Into<String>) -> Self {
        Self::Parse {
            target: target.to_string(),
            detail: detail.into(),
        }
    }
}

impl Retryable for ScholarError {
    fn failure_type(&self) -> FailureType {
        match self {
            Self::Http { status, .. } => classify_http_status(*status),
            Self::Transport { source, .. } => {
                if source.is_decode() || source.is_builder() {
                    FailureType::Permanent
                } else {
                    FailureType::Transient
                }
            }
            Self::AuthorFetch { source, .. } => source.failure_type(),
            Self::Blocked { .. }
            | Self::Parse { .. }
            | Self::Relay { .. }
            | Self::NoPublications
            | Self::Client(_) => FailureType::Permanent,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Why a relay step was skipped. Always logged as a warning, never fatal.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The account endpoint rejected the key
    #[error("SerpAPI rejected the API key (HTTP {status})")]
    InvalidKey {
        /// HTTP status code
        status: u16,
    },

    /// The account endpoint answered 200 with an error body
    #[error("SerpAPI account check failed: {message}")]
    Account {
        /// `error` field of the response
        message: String,
    },

    /// The proxy list could not be downloaded
    #[error("unable to fetch proxy list from {url}: {detail}")]
    ProxyList {
        /// List URL
        url: String,
        /// What went wrong
        detail: String,
    },

    /// No listed proxy answered the probe
    #[error("none of {tried} free proxies reached Google Scholar")]
    NoWorkingProxy {
        /// Candidates probed
        tried: usize,
    },

    /// A request in the relay chain failed before a response
    #[error("relay request failed: {source}")]
    Transport {
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// An HTTP client for the relay could not be built
    #[error(transparent)]
    Client(#[from] HttpClientError),
}
