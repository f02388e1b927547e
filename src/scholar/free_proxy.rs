//! Free proxy discovery for CI runners, whose addresses Scholar tends to block.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::http::{HttpClientOptions, build_http_client};
use crate::user_agent;

use super::RelayError;
use super::html::compile_static_regex;

/// Plain-text list of `host:port` HTTP proxies.
pub const DEFAULT_PROXY_LIST_URL: &str =
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt";

/// Most candidates probed before giving up.
pub(crate) const MAX_PROXY_CANDIDATES: usize = 20;

static PROXY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^[A-Za-z0-9.\-]+:\d{1,5}$"));

/// Parses `host:port` lines into proxy URLs, dropping junk and duplicates.
#[must_use]
pub fn parse_proxy_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| PROXY_LINE_RE.is_match(line))
        .filter(|line| seen.insert(line.to_string()))
        .take(MAX_PROXY_CANDIDATES)
        .map(|line| format!("http://{line}"))
        .collect()
}

/// Downloads and parses the proxy list.
///
/// # Errors
///
/// Returns [`RelayError::ProxyList`] when the list cannot be fetched or is empty.
pub(crate) async fn fetch_proxy_list(url: &str, timeout: Duration) -> Result<Vec<String>, RelayError> {
    let list_error = |detail: String| RelayError::ProxyList {
        url: url.to_string(),
        detail,
    };
    let client = build_http_client(
        "proxy-list",
        HttpClientOptions::new(timeout, user_agent::scholar_user_agent()),
    )?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| list_error(error.to_string()))?;
    if !response.status().is_success() {
        return Err(list_error(format!("HTTP {}", response.status().as_u16())));
    }
    let body = response
        .text()
        .await
        .map_err(|error| list_error(error.to_string()))?;

    let proxies = parse_proxy_list(&body);
    if proxies.is_empty() {
        return Err(list_error("no host:port entries".to_string()));
    }
    Ok(proxies)
}

/// Tries each proxy in turn against `probe_url`; returns the first that answers 2xx.
///
/// # Errors
///
/// Returns [`RelayError::NoWorkingProxy`] when every candidate fails.
pub async fn probe_proxies(
    candidates: &[String],
    probe_url: &str,
    timeout: Duration,
) -> Result<String, RelayError> {
    for proxy in candidates {
        let options = HttpClientOptions::new(timeout, user_agent::scholar_user_agent())
            .with_proxy(proxy.clone());
        let client = match build_http_client("proxy-probe", options) {
            Ok(client) => client,
            Err(error) => {
                debug!(%proxy, %error, "skipping unusable proxy");
                continue;
            }
        };
        match client.get(probe_url).send().await {
            Ok(response) if response.status().is_success() => return Ok(proxy.clone()),
            Ok(response) => debug!(%proxy, status = response.status().as_u16(), "proxy probe rejected"),
            Err(error) => debug!(%proxy, %error, "proxy probe failed"),
        }
    }
    Err(RelayError::NoWorkingProxy {
        tried: candidates.len(),
    })
}
