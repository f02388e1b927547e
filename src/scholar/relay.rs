//! Picks the Scholar session: paid relay, then direct outside CI, then free
//! proxies, then direct as a last resort. No step is fatal.

use std::time::Duration;

use tracing::{info, warn};

use super::free_proxy::fetch_proxy_list;
use super::{
    CitationSource, DEFAULT_PROXY_LIST_URL, DEFAULT_SCHOLAR_BASE_URL, DEFAULT_SERPAPI_BASE_URL,
    RelayError, ScholarError, ScholarHtmlSource, SerpApiSource, probe_proxies, verify_api_key,
};

/// Environment variables checked for the SerpAPI key, in order.
pub const SERPAPI_KEY_ENV_VARS: [&str; 2] = ["SERPAPI_API_KEY", "SERPAPI_KEY"];

/// Relay-relevant environment, captured once so tests can inject it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RelayEnv {
    /// First non-blank SerpAPI key.
    pub serpapi_key: Option<String>,
    /// `CI` is exactly `"true"`.
    pub ci: bool,
}

impl RelayEnv {
    /// Reads `SERPAPI_API_KEY`, `SERPAPI_KEY` and `CI` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the environment from an arbitrary lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let serpapi_key = SERPAPI_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());
        let ci = lookup("CI").as_deref() == Some("true");
        Self { serpapi_key, ci }
    }
}

impl std::fmt::Debug for RelayEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEnv")
            .field("serpapi_key", &self.serpapi_key.as_ref().map(|_| "<redacted>"))
            .field("ci", &self.ci)
            .finish()
    }
}

/// Hosts the relay chain talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoints {
    /// Google Scholar host.
    pub scholar_base_url: String,
    /// SerpAPI host.
    pub serpapi_base_url: String,
    /// Free proxy list URL.
    pub proxy_list_url: String,
}

impl Default for RelayEndpoints {
    fn default() -> Self {
        Self {
            scholar_base_url: DEFAULT_SCHOLAR_BASE_URL.to_string(),
            serpapi_base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            proxy_list_url: DEFAULT_PROXY_LIST_URL.to_string(),
        }
    }
}

/// Runs the relay chain and returns the source to use.
///
/// # Errors
///
/// Returns [`ScholarError::Client`] only when not even a direct client can be built.
#[tracing::instrument(skip_all, fields(ci = env.ci, has_key = env.serpapi_key.is_some()))]
pub async fn configure_session(
    env: &RelayEnv,
    endpoints: &RelayEndpoints,
    timeout: Duration,
) -> Result<Box<dyn CitationSource>, ScholarError> {
    if let Some(api_key) = env.serpapi_key.as_deref() {
        match verify_api_key(&endpoints.serpapi_base_url, api_key, timeout).await {
            Ok(()) => {
                let source =
                    SerpApiSource::with_base_url(&endpoints.serpapi_base_url, api_key, timeout)?;
                info!("Using SerpAPI for Google Scholar requests.");
                return Ok(Box::new(source));
            }
            Err(error) => warn!("Unable to use SerpAPI ({error}); falling back to other options."),
        }
    }

    if !env.ci {
        info!("CI environment not detected; using direct Google Scholar connection.");
        return direct(endpoints, timeout);
    }

    match free_proxy_source(endpoints, timeout).await {
        Ok(source) => {
            info!("Using rotating free proxies for Google Scholar requests.");
            return Ok(Box::new(source));
        }
        Err(error) => warn!("Unable to configure free proxies ({error})."),
    }

    warn!(
        "Continuing without a proxy; Google Scholar may block requests from CI. Add SERPAPI_API_KEY as a repository secret for reliable access."
    );
    direct(endpoints, timeout)
}

fn direct(
    endpoints: &RelayEndpoints,
    timeout: Duration,
) -> Result<Box<dyn CitationSource>, ScholarError> {
    Ok(Box::new(ScholarHtmlSource::with_base_url(
        &endpoints.scholar_base_url,
        timeout,
        None,
    )?))
}

async fn free_proxy_source(
    endpoints: &RelayEndpoints,
    timeout: Duration,
) -> Result<ScholarHtmlSource, RelayError> {
    let candidates = fetch_proxy_list(&endpoints.proxy_list_url, timeout).await?;
    let probe_url = format!("{}/", endpoints.scholar_base_url.trim_end_matches('/'));
    let proxy = probe_proxies(&candidates, &probe_url, timeout).await?;
    info!(%proxy, "free proxy answered probe");
    ScholarHtmlSource::with_base_url(&endpoints.scholar_base_url, timeout, Some(proxy)).map_err(
        |error| match error {
            ScholarError::Client(client) => RelayError::Client(client),
            other => RelayError::ProxyList {
                url: endpoints.proxy_list_url.clone(),
                detail: other.to_string(),
            },
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn env_from(pairs: &[(&str, &str)]) -> RelayEnv {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayEnv::from_lookup(|name| vars.get(name).cloned())
    }

    fn endpoints(base: &str) -> RelayEndpoints {
        RelayEndpoints {
            scholar_base_url: base.to_string(),
            serpapi_base_url: base.to_string(),
            proxy_list_url: format!("{base}/http.txt"),
        }
    }

    #[test]
    fn test_relay_env_key_precedence_and_ci_flag() {
        let env = env_from(&[("SERPAPI_API_KEY", " "), ("SERPAPI_KEY", "k2"), ("CI", "true")]);
        assert_eq!(env.serpapi_key.as_deref(), Some("k2"));
        assert!(env.ci);

        let env = env_from(&[("SERPAPI_API_KEY", "k1"), ("SERPAPI_KEY", "k2"), ("CI", "1")]);
        assert_eq!(env.serpapi_key.as_deref(), Some("k1"));
        assert!(!env.ci);
    }

    #[test]
    fn test_relay_env_debug_redacts_key() {
        let env = env_from(&[("SERPAPI_API_KEY", "topsecret")]);
        assert!(!format!("{env:?}").contains("topsecret"));
    }

    #[tokio::test]
    async fn test_no_key_outside_ci_is_direct() {
        let source = configure_session(
            &RelayEnv::default(),
            &RelayEndpoints::default(),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(source.label(), "direct");
    }

    #[tokio::test]
    async fn test_valid_key_uses_serpapi() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/account.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let env = env_from(&[("SERPAPI_API_KEY", "good")]);
        let source = configure_session(&env, &endpoints(&server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(source.label(), "serpapi");
    }

    #[tokio::test]
    async fn test_rejected_key_falls_back_to_direct() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/account.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let env = env_from(&[("SERPAPI_API_KEY", "bad")]);
        let source = configure_session(&env, &endpoints(&server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(source.label(), "direct");
    }

    #[tokio::test]
    async fn test_ci_without_proxies_falls_back_to_direct() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/http.txt"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let env = env_from(&[("CI", "true")]);
        let source = configure_session(&env, &endpoints(&server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(source.label(), "direct");
    }
}
