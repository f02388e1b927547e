//! Shared User-Agent strings for GitHub and Scholar HTTP clients.
//!
//! GitHub requires a User-Agent on every API request; Scholar traffic uses a
//! browser-like agent because the plain project agent is served a CAPTCHA page.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/alshedivat/al-folio";

/// Product token GitHub sees on repository sync requests.
pub(crate) const GITHUB_UA_PRODUCT: &str = "al-folio-repo-sync";

/// User-Agent for GitHub API requests.
#[must_use]
pub(crate) fn github_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{GITHUB_UA_PRODUCT}/{version} (+{PROJECT_UA_URL})")
}

/// User-Agent for Scholar and relay requests.
#[must_use]
pub(crate) fn scholar_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) site-sync/{version}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_user_agent_contains_product_and_version() {
        let ua = github_user_agent();
        assert!(ua.starts_with(GITHUB_UA_PRODUCT), "unexpected UA: {ua}");
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
        assert!(ua.contains(PROJECT_UA_URL));
    }

    #[test]
    fn test_scholar_user_agent_is_browser_like() {
        let ua = scholar_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"), "unexpected UA: {ua}");
        assert!(ua.contains("site-sync/"));
    }
}
