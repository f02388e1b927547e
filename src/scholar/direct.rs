//! Scholar HTML source, used for direct connections and free-proxy sessions.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use tracing::debug;

use crate::http::{HttpClientOptions, build_http_client, parse_retry_after};
use crate::publication::{Publication, PublicationStub};
use crate::user_agent;

use super::html::{
    absolutize_url, compile_static_regex, extract_href, extract_year, html_to_text, text_or_none,
};
use super::{
    AuthorProfile, CitationSource, MAX_PROFILE_PAGES, PROFILE_PAGE_SIZE, ScholarError,
    apply_detail_field,
};

/// Public Google Scholar host.
pub const DEFAULT_SCHOLAR_BASE_URL: &str = "https://scholar.google.com";

static PROFILE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<div id="gsc_prf_in"[^>]*>(.*?)</div>"#));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<tr[^>]*class="gsc_a_tr"[^>]*>(.*?)</tr>"#));
static ROW_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<a\s+([^>]*class="gsc_a_at"[^>]*)>(.*?)</a>"#));
static ROW_GRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<div class="gs_gray">(.*?)</div>"#));
static ROW_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<span class="gsc_a_h[^"]*"[^>]*>(.*?)</span>"#));
static ROW_YEAR_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<span class="gs_oph">.*?</span>"#));
static CITATION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"citation_for_view=([^&"'\s]+)"#));
static DETAIL_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<div id="gsc_oci_title"[^>]*>(.*?)</div>"#));
static DETAIL_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?s)<a\s+([^>]*class="gsc_oci_title_link"[^>]*)>"#));
static DETAIL_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?s)<div class="gsc_oci_field">(.*?)</div>\s*<div class="gsc_oci_value"[^>]*>(.*?)</div>"#,
    )
});

/// Reads Scholar profile and citation pages over plain HTTP, optionally through a proxy.
pub struct ScholarHtmlSource {
    client: Client,
    base_url: String,
    label: &'static str,
}

impl ScholarHtmlSource {
    /// Creates a direct source against the public Scholar host.
    ///
    /// # Errors
    ///
    /// Returns [`ScholarError::Client`] if client construction fails.
    pub fn new(timeout: Duration) -> Result<Self, ScholarError> {
        Self::with_base_url(DEFAULT_SCHOLAR_BASE_URL, timeout, None)
    }

    /// Creates a source against `base_url`, optionally routed through `proxy`.
    ///
    /// # Errors
    ///
    /// Returns [`ScholarError::Client`] if the proxy is invalid or client construction fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
        proxy: Option<String>,
    ) -> Result<Self, ScholarError> {
        let mut options = HttpClientOptions::new(timeout, user_agent::scholar_user_agent());
        let label = if let Some(proxy) = proxy {
            options = options.with_proxy(proxy);
            "free-proxy"
        } else {
            "direct"
        };
        let client = build_http_client("scholar", options)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            label,
        })
    }

    async fn get_page(&self, url: &str, target: &str) -> Result<String, ScholarError> {
        debug!(%url, "fetching scholar page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScholarError::transport(target, source))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            return Err(ScholarError::Http {
                target: target.to_string(),
                status: status.as_u16(),
                retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ScholarError::transport(target, source))?;
        if looks_blocked(&body) {
            return Err(ScholarError::Blocked {
                target: target.to_string(),
            });
        }
        Ok(body)
    }
}

impl std::fmt::Debug for ScholarHtmlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScholarHtmlSource")
            .field("base_url", &self.base_url)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CitationSource for ScholarHtmlSource {
    fn label(&self) -> &'static str {
        self.label
    }

    #[tracing::instrument(skip(self), fields(source = self.label))]
    async fn fetch_author(&self, user_id: &str) -> Result<AuthorProfile, ScholarError> {
        let target = format!("profile '{user_id}'");
        let mut profile = AuthorProfile::default();

        for page in 0..MAX_PROFILE_PAGES {
            let url = format!(
                "{}/citations?hl=en&user={}&cstart={}&pagesize={PROFILE_PAGE_SIZE}",
                self.base_url,
                urlencoding::encode(user_id),
                page * PROFILE_PAGE_SIZE
            );
            let html = self.get_page(&url, &target).await?;
            if profile.name.is_none() {
                profile.name = parse_profile_name(&html);
            }

            let rows = parse_profile_rows(&html);
            let page_len = rows.len();
            debug!(page, rows = page_len, "parsed profile page");
            profile.publications.extend(rows);
            if page_len < PROFILE_PAGE_SIZE {
                break;
            }
        }

        if profile.name.is_none() && profile.publications.is_empty() {
            return Err(ScholarError::parse(&target, "page is not a Scholar profile"));
        }
        Ok(profile)
    }

    #[tracing::instrument(skip(self, stub), fields(source = self.label, id = %stub.source_id))]
    async fn fill_publication(&self, stub: &PublicationStub) -> Result<Publication, ScholarError> {
        let target = format!("'{}'", stub.display_title());
        let url = format!(
            "{}/citations?view_op=view_citation&hl=en&citation_for_view={}",
            self.base_url,
            urlencoding::encode(&stub.source_id)
        );
        let html = self.get_page(&url, &target).await?;
        parse_detail_page(&html, &self.base_url, stub)
            .ok_or_else(|| ScholarError::parse(&target, "no citation details on page"))
    }
}

fn looks_blocked(body: &str) -> bool {
    body.contains("gs_captcha") || body.contains("unusual traffic from your computer")
}

fn parse_profile_name(html: &str) -> Option<String> {
    PROFILE_NAME_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|name| text_or_none(name.as_str()))
}

/// Parses the publication table of one profile page.
pub(crate) fn parse_profile_rows(html: &str) -> Vec<PublicationStub> {
    ROW_RE
        .captures_iter(html)
        .filter_map(|row| {
            let row = row.get(1)?.as_str();
            let link = ROW_TITLE_RE.captures(row)?;
            let href = extract_href(link.get(1)?.as_str())?;
            let source_id = CITATION_ID_RE.captures(&href)?.get(1)?.as_str().to_string();
            let title = html_to_text(link.get(2)?.as_str());

            // First gray line is the (truncated) author list, second the venue.
            let citation = ROW_GRAY_RE
                .captures_iter(row)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
                .nth(1)
                .map(|venue| ROW_YEAR_SUFFIX_RE.replace_all(venue, ""))
                .and_then(|venue| text_or_none(&venue));
            let year = ROW_YEAR_RE
                .captures(row)
                .and_then(|caps| caps.get(1))
                .and_then(|cell| extract_year(&html_to_text(cell.as_str())));

            Some(PublicationStub {
                title,
                year,
                citation,
                source_id,
            })
        })
        .collect()
}

/// Parses a citation detail page on top of what the stub already knows.
/// Returns `None` when the page has neither a title nor a field table.
pub(crate) fn parse_detail_page(
    html: &str,
    base_url: &str,
    stub: &PublicationStub,
) -> Option<Publication> {
    let title = DETAIL_TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|block| text_or_none(block.as_str()));
    let fields: Vec<(String, String)> = DETAIL_FIELD_RE
        .captures_iter(html)
        .filter_map(|caps| {
            Some((
                html_to_text(caps.get(1)?.as_str()),
                html_to_text(caps.get(2)?.as_str()),
            ))
        })
        .collect();
    if title.is_none() && fields.is_empty() {
        return None;
    }

    let mut publication = Publication::from_stub(stub);
    if title.is_some() {
        publication.title = title;
    }
    publication.pub_url = DETAIL_LINK_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|attributes| extract_href(attributes.as_str()))
        .and_then(|href| absolutize_url(&href, base_url));
    for (label, value) in fields {
        apply_detail_field(&mut publication, &label, value);
    }
    Some(publication)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn row(id: &str, title: &str, venue: &str, year: &str) -> String {
        format!(
            r#"<tr class="gsc_a_tr"><td class="gsc_a_t"><a href="/citations?view_op=view_citation&amp;hl=en&amp;user=ABC&amp;citation_for_view={id}" class="gsc_a_at">{title}</a><div class="gs_gray">J Smith, A Doe</div><div class="gs_gray">{venue}<span class="gs_oph">, {year}</span></div></td><td class="gsc_a_c"><a class="gsc_a_ac">12</a></td><td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">{year}</span></td></tr>"#
        )
    }

    fn profile_page(rows: &[String]) -> String {
        format!(
            r#"<html><body><div id="gsc_prf_in">Jane Smith</div><table id="gsc_a_t"><tbody id="gsc_a_b">{}</tbody></table></body></html>"#,
            rows.join("")
        )
    }

    const DETAIL_PAGE: &str = r#"<html><body>
<div id="gsc_oci_title"><a class="gsc_oci_title_link" href="https://example.org/paper" data-clk="x">Deep &amp; Wide</a></div>
<div id="gsc_oci_table">
<div class="gs_scl"><div class="gsc_oci_field">Authors</div><div class="gsc_oci_value">Jane Smith, Alan Doe</div></div>
<div class="gs_scl"><div class="gsc_oci_field">Publication date</div><div class="gsc_oci_value">2015/5/28</div></div>
<div class="gs_scl"><div class="gsc_oci_field">Journal</div><div class="gsc_oci_value">Nature</div></div>
<div class="gs_scl"><div class="gsc_oci_field">Volume</div><div class="gsc_oci_value">521</div></div>
<div class="gs_scl"><div class="gsc_oci_field">Issue</div><div class="gsc_oci_value">7553</div></div>
<div class="gs_scl"><div class="gsc_oci_field">Pages</div><div class="gsc_oci_value">436-444</div></div>
<div class="gs_scl"><div class="gsc_oci_field">Description</div><div class="gsc_oci_value" id="gsc_oci_descr"><div class="gsh_small"><div class="gsh_csp">Deep learning allows   models.</div></div></div></div>
</div></body></html>"#;

    fn stub(id: &str) -> PublicationStub {
        PublicationStub {
            title: "Listed title".to_string(),
            year: Some("2015".to_string()),
            citation: Some("Nature 521".to_string()),
            source_id: id.to_string(),
        }
    }

    #[test]
    fn test_parse_profile_rows_extracts_stub_fields() {
        let html = profile_page(&[
            row("ABC:x1", "Deep &amp; Wide", "Nature 521 (7553), 436-444", "2015"),
            row("ABC:x2", "Untimed", "PhD thesis, MIT", ""),
        ]);
        let rows = parse_profile_rows(&html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Deep & Wide");
        assert_eq!(rows[0].source_id, "ABC:x1");
        assert_eq!(rows[0].year.as_deref(), Some("2015"));
        assert_eq!(rows[0].citation.as_deref(), Some("Nature 521 (7553), 436-444"));
        assert_eq!(rows[1].year, None);
        assert_eq!(rows[1].citation.as_deref(), Some("PhD thesis, MIT"));
        assert_eq!(parse_profile_name(&html).as_deref(), Some("Jane Smith"));
    }

    #[test]
    fn test_parse_detail_page_maps_fields() {
        let publication =
            parse_detail_page(DETAIL_PAGE, DEFAULT_SCHOLAR_BASE_URL, &stub("ABC:x1")).unwrap();
        assert_eq!(publication.title.as_deref(), Some("Deep & Wide"));
        assert_eq!(publication.author.as_deref(), Some("Jane Smith and Alan Doe"));
        assert_eq!(publication.pub_year.as_deref(), Some("2015"));
        assert_eq!(publication.journal.as_deref(), Some("Nature"));
        assert_eq!(publication.volume.as_deref(), Some("521"));
        assert_eq!(publication.number.as_deref(), Some("7553"));
        assert_eq!(publication.pages.as_deref(), Some("436-444"));
        assert_eq!(publication.abstract_text.as_deref(), Some("Deep learning allows models."));
        assert_eq!(publication.pub_url.as_deref(), Some("https://example.org/paper"));
        assert_eq!(publication.citation.as_deref(), Some("Nature 521"));
    }

    #[test]
    fn test_parse_detail_page_rejects_unrelated_page() {
        assert!(parse_detail_page("<html></html>", DEFAULT_SCHOLAR_BASE_URL, &stub("x")).is_none());
    }

    #[tokio::test]
    async fn test_fetch_author_single_page() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/citations"))
            .and(query_param("user", "ABC"))
            .and(query_param("cstart", "0"))
            .and(query_param("pagesize", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(&[row(
                "ABC:x1", "Paper", "Venue", "2020",
            )])))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            ScholarHtmlSource::with_base_url(server.uri(), Duration::from_secs(5), None).unwrap();
        let profile = source.fetch_author("ABC").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Jane Smith"));
        assert_eq!(profile.publications.len(), 1);
        assert_eq!(source.label(), "direct");
    }

    #[tokio::test]
    async fn test_fetch_author_follows_full_pages() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let full: Vec<String> = (0..100)
            .map(|i| row(&format!("ABC:p{i}"), &format!("Paper {i}"), "Venue", "2020"))
            .collect();
        Mock::given(method("GET"))
            .and(path("/citations"))
            .and(query_param("cstart", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(&full)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/citations"))
            .and(query_param("cstart", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(&[row(
                "ABC:last", "Last", "Venue", "2019",
            )])))
            .mount(&server)
            .await;

        let source =
            ScholarHtmlSource::with_base_url(server.uri(), Duration::from_secs(5), None).unwrap();
        let profile = source.fetch_author("ABC").await.unwrap();
        assert_eq!(profile.publications.len(), 101);
        assert_eq!(profile.publications[100].source_id, "ABC:last");
    }

    #[tokio::test]
    async fn test_fill_publication_fetches_detail() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/citations"))
            .and(query_param("view_op", "view_citation"))
            .and(query_param("citation_for_view", "ABC:x1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
            .mount(&server)
            .await;

        let source =
            ScholarHtmlSource::with_base_url(server.uri(), Duration::from_secs(5), None).unwrap();
        let publication = source.fill_publication(&stub("ABC:x1")).await.unwrap();
        assert_eq!(publication.journal.as_deref(), Some("Nature"));
    }

    #[tokio::test]
    async fn test_fill_publication_404_is_http_error() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/citations"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source =
            ScholarHtmlSource::with_base_url(server.uri(), Duration::from_secs(5), None).unwrap();
        let err = source.fill_publication(&stub("ABC:gone")).await.unwrap_err();
        assert!(
            matches!(err, ScholarError::Http { status: 404, .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_captcha_page_is_blocked() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/citations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><div id="gs_captcha_ccl">robot?</div></html>"#),
            )
            .mount(&server)
            .await;

        let source =
            ScholarHtmlSource::with_base_url(server.uri(), Duration::from_secs(5), None).unwrap();
        let err = source.fetch_author("ABC").await.unwrap_err();
        assert!(matches!(err, ScholarError::Blocked { .. }), "{err:?}");
    }

    #[test]
    fn test_proxy_source_label() {
        let source = ScholarHtmlSource::with_base_url(
            DEFAULT_SCHOLAR_BASE_URL,
            Duration::from_secs(5),
            Some("http://127.0.0.1:8080".to_string()),
        )
        .unwrap();
        assert_eq!(source.label(), "free-proxy");
    }
}
