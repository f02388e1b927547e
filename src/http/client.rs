//! Shared HTTP client construction policy.
//!
//! GitHub and Scholar clients differ in headers, timeout and proxy, but are
//! built through the same path so gzip, connect timeout and the system-proxy
//! workaround stay consistent.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, warn};

use super::HttpClientError;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Inputs for [`build_http_client`].
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// Total per-request timeout.
    pub timeout: Duration,
    /// TCP/TLS connect timeout (clamped to `timeout`).
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Headers sent with every request.
    pub default_headers: HeaderMap,
    /// Route every request through this proxy (`http://host:port`).
    pub proxy: Option<String>,
}

impl HttpClientOptions {
    /// Options with the given timeout and user agent, no extra headers and no proxy.
    #[must_use]
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: user_agent.into(),
            default_headers: HeaderMap::new(),
            proxy: None,
        }
    }

    /// Replaces the default header set.
    #[must_use]
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Routes requests through `proxy`.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// Builds a client for `purpose` (used only in errors and logs).
///
/// # Errors
///
/// Returns [`HttpClientError`] when the proxy is invalid or client construction fails.
pub fn build_http_client(
    purpose: &str,
    options: HttpClientOptions,
) -> Result<Client, HttpClientError> {
    let proxy = match options.proxy.as_deref() {
        Some(address) => Some(Proxy::all(address).map_err(|error| {
            HttpClientError::InvalidProxy {
                proxy: address.to_string(),
                reason: error.to_string(),
            }
        })?),
        None => None,
    };

    match try_build_client(&options, proxy.clone(), false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when reqwest queries system
            // proxy settings; retry with system lookup disabled.
            warn!(
                purpose,
                "HTTP client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(&options, proxy, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(HttpClientError::build(
                    purpose,
                    "client construction panicked while initializing networking",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(HttpClientError::build(purpose, error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => {
            Err(HttpClientError::build(purpose, error.to_string()))
        }
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    options: &HttpClientOptions,
    proxy: Option<Proxy>,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(options);
        match proxy {
            Some(proxy) => {
                debug!("routing requests through explicit proxy");
                builder = builder.proxy(proxy);
            }
            None if disable_system_proxy_lookup => {
                builder = apply_env_proxy_fallback(builder.no_proxy());
            }
            None => {}
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(options: &HttpClientOptions) -> ClientBuilder {
    Client::builder()
        .connect_timeout(options.connect_timeout.min(options.timeout))
        .timeout(options.timeout)
        .user_agent(options.user_agent.clone())
        .default_headers(options.default_headers.clone())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
