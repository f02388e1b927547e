//! Small HTML helpers for Scholar pages: tag stripping, entity decoding,
//! year extraction, and URL resolution.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&#(?:x([0-9A-Fa-f]+)|([0-9]+));"));
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"\b(1[5-9]|20)\d{2}\b"));
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)href\s*=\s*["']([^"']+)["']"#));

/// Decodes the named entities Scholar emits plus any numeric entity.
#[must_use]
pub(crate) fn html_unescape(value: &str) -> String {
    let named = value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&nbsp;", " ")
        .replace("&hellip;", "\u{2026}");

    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            (None, None) => None,
        };
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });

    // Last, so "&amp;lt;" decodes to "&lt;" and not "<".
    numeric.replace("&amp;", "&")
}

/// Removes tags, decodes entities, and collapses whitespace.
#[must_use]
pub(crate) fn html_to_text(fragment: &str) -> String {
    let without_tags = TAG_RE.replace_all(fragment, " ");
    html_unescape(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `html_to_text`, or `None` when nothing is left.
#[must_use]
pub(crate) fn text_or_none(fragment: &str) -> Option<String> {
    let text = html_to_text(fragment);
    (!text.is_empty()).then_some(text)
}

/// First four-digit year in `value`.
#[must_use]
pub(crate) fn extract_year(value: &str) -> Option<String> {
    YEAR_RE.find(value).map(|found| found.as_str().to_string())
}

/// `href` attribute of a tag's attribute string, entity-decoded.
#[must_use]
pub(crate) fn extract_href(attributes: &str) -> Option<String> {
    HREF_RE
        .captures(attributes)
        .and_then(|caps| caps.get(1))
        .map(|href| html_unescape(href.as_str().trim()))
}

/// Resolves `value` against `base_url` unless it is already absolute.
#[must_use]
pub(crate) fn absolutize_url(value: &str, base_url: &str) -> Option<String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    Url::parse(base_url)
        .ok()?
        .join(value)
        .ok()
        .map(|url| url.to_string())
}
