//! Shared HTTP plumbing for the GitHub and Scholar clients.
//!
//! - [`build_http_client`] - one client construction policy (timeouts, user agent, proxy)
//! - [`RetryPolicy`] - bounded exponential backoff used by the Scholar detail fetch

mod client;
mod error;
mod retry;

pub use client::{HttpClientOptions, build_http_client};
pub use error::HttpClientError;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, Retryable, RetryDecision, RetryPolicy, classify_http_status,
    parse_retry_after, run_with_retry,
};
