//! Error types for HTTP client construction.

use thiserror::Error;

/// Errors raised while building a `reqwest::Client`.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The builder rejected the configuration or TLS backend initialization failed
    #[error("{purpose} HTTP client construction failed: {reason}")]
    Build {
        /// Which client was being built (`github`, `scholar`, ...)
        purpose: String,
        /// Underlying failure
        reason: String,
    },

    /// The proxy address could not be turned into a `reqwest::Proxy`
    #[error("invalid proxy '{proxy}': {reason}\n  Suggestion: use the form http://host:port")]
    InvalidProxy {
        /// The rejected proxy address
        proxy: String,
        /// Why it was rejected
        reason: String,
    },

    /// A default header value contained bytes that are not valid in HTTP headers
    #[error("invalid value for header '{name}'\n  Suggestion: {suggestion}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// How to fix the issue
        suggestion: String,
    },
}

impl HttpClientError {
    /// Creates a `Build` error.
    #[must_use]
    pub fn build(purpose: &str, reason: impl Into<String>) -> Self {
        Self::Build {
            purpose: purpose.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidHeader` error.
    #[must_use]
    pub fn invalid_header(name: &str, suggestion: &str) -> Self {
        Self::InvalidHeader {
            name: name.to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}
