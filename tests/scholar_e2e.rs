//! End-to-end tests for `site-sync scholar` against a mock Scholar host.

mod support;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Site {
    dir: TempDir,
}

impl Site {
    fn new(scholar_id: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("_data")).unwrap();
        fs::write(
            dir.path().join("_data/socials.yml"),
            format!("scholar_userid: {scholar_id}\n"),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn output_text(&self) -> String {
        fs::read_to_string(self.path("_bibliography/papers.bib")).unwrap()
    }
}

fn profile_row(id: &str, title: &str, year: &str) -> String {
    format!(
        r#"<tr class="gsc_a_tr"><td class="gsc_a_t"><a href="/citations?view_op=view_citation&amp;hl=en&amp;user=XYZ&amp;citation_for_view={id}" class="gsc_a_at">{title}</a><div class="gs_gray">J Smith</div><div class="gs_gray">Some venue<span class="gs_oph">, {year}</span></div></td><td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">{year}</span></td></tr>"#
    )
}

fn detail_page(title: &str, authors: &str, date: Option<&str>) -> String {
    let authors_row = format!(
        r#"<div class="gs_scl"><div class="gsc_oci_field">Authors</div><div class="gsc_oci_value">{authors}</div></div>"#
    );
    detail_page_rows(title, &authors_row, date)
}

fn detail_page_rows(title: &str, rows: &str, date: Option<&str>) -> String {
    let date_row = date.map_or_else(String::new, |date| {
        format!(
            r#"<div class="gs_scl"><div class="gsc_oci_field">Publication date</div><div class="gsc_oci_value">{date}</div></div>"#
        )
    });
    format!(
        r#"<html><body><div id="gsc_oci_title"><a class="gsc_oci_title_link" href="https://example.org/paper">{title}</a></div><div id="gsc_oci_table">{rows}{date_row}</div></body></html>"#
    )
}

async fn mount_profile(server: &MockServer, rows: &[String]) {
    Mock::given(method("GET"))
        .and(path("/citations"))
        .and(query_param("user", "XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><div id="gsc_prf_in">Jane Smith</div><table><tbody>{}</tbody></table></body></html>"#,
            rows.join("")
        )))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/citations"))
        .and(query_param("citation_for_view", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn run_scholar(server: &MockServer, site: &Path) -> Output {
    let scholar = server.uri();
    let site = site.to_path_buf();
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("site-sync")
            .unwrap()
            .current_dir(&site)
            .env_remove("RUST_LOG")
            .env_remove("SERPAPI_API_KEY")
            .env_remove("SERPAPI_KEY")
            .env_remove("CI")
            .args(["--no-color", "scholar", "--scholar-base-url", &scholar])
            .args(["--retries", "1"])
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publication_without_year_uses_placeholder() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_profile(&server, &[profile_row("XYZ:1", "Undated Notes", "")]).await;
    mount_detail(&server, "XYZ:1", detail_page("Undated Notes", "Jane Smith", None)).await;

    let site = Site::new("XYZ");
    let output = run_scholar(&server, site.dir.path()).await;
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{text}");
    assert!(
        text.contains("CI environment not detected; using direct Google Scholar connection."),
        "{text}"
    );
    assert!(text.contains("Saved 1 entries to"), "{text}");

    let bib = site.output_text();
    assert!(bib.starts_with("%% Auto-generated on "), "{bib}");
    assert!(bib.contains("%% Source: Google Scholar ID XYZ\n\n"), "{bib}");
    assert!(bib.contains("@misc{smith-n-d,\n"), "{bib}");
    assert!(bib.contains("  year = {n.d.}"), "{bib}");
    assert!(bib.contains("  bibtex_show = {true}\n}\n"), "{bib}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_manual_override_suppresses_generated_entry() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_profile(
        &server,
        &[
            profile_row("XYZ:1", "Overridden", "2020"),
            profile_row("XYZ:2", "Kept", "2019"),
        ],
    )
    .await;
    mount_detail(&server, "XYZ:1", detail_page("Overridden", "Jane Smith", Some("2020/1/2"))).await;
    mount_detail(&server, "XYZ:2", detail_page("Kept", "Alan Doe", Some("2019"))).await;

    let site = Site::new("XYZ");
    fs::create_dir_all(site.path("_bibliography")).unwrap();
    fs::write(
        site.path("_bibliography/manual_overrides.bib"),
        "\n@article{smith-2020,\n  title = {Curated},\n  year = {2020}\n}\n\n",
    )
    .unwrap();

    let output = run_scholar(&server, site.dir.path()).await;
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{text}");
    assert!(text.contains("Found 1 manual override key(s)"), "{text}");
    assert!(text.contains("Skipped 1 auto-generated"), "{text}");
    assert!(
        text.contains("Saved 1 auto-generated entries plus manual overrides to"),
        "{text}"
    );

    let bib = site.output_text();
    assert_eq!(bib.matches("smith-2020,").count(), 1, "{bib}");
    assert!(!bib.contains("title = {Overridden}"), "{bib}");
    assert!(bib.contains("@misc{doe-2019,"), "{bib}");
    assert!(bib.ends_with(
        "\n%% Manual overrides appended from _bibliography/manual_overrides.bib\n\n@article{smith-2020,\n  title = {Curated},\n  year = {2020}\n}\n"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_detail_is_skipped_with_warning() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_profile(
        &server,
        &[
            profile_row("XYZ:gone", "Vanished", "2021"),
            profile_row("XYZ:2", "Present", "2019"),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/citations"))
        .and(query_param("citation_for_view", "XYZ:gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_detail(&server, "XYZ:2", detail_page("Present", "Alan Doe", Some("2019"))).await;

    let site = Site::new("XYZ");
    let output = run_scholar(&server, site.dir.path()).await;
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{text}");
    let warning = text
        .lines()
        .find(|line| line.contains("Could not fetch full data for 'Vanished'"))
        .unwrap_or_else(|| panic!("missing skip warning in:\n{text}"));
    assert!(warning.contains("WARN"), "{warning}");
    assert!(!warning.contains("Warning:"), "{warning}");
    assert!(site.output_text().contains("@misc{doe-2019,"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publication_without_authors_uses_unknown_author_key() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_profile(&server, &[profile_row("XYZ:anon", "Anonymous Memo", "2018")]).await;
    mount_detail(
        &server,
        "XYZ:anon",
        detail_page_rows("Anonymous Memo", "", Some("2018")),
    )
    .await;

    let site = Site::new("XYZ");
    let output = run_scholar(&server, site.dir.path()).await;
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{text}");

    let bib = site.output_text();
    assert!(bib.contains("@misc{unknown-2018,\n"), "{bib}");
    assert!(bib.contains("  author = {Unknown},\n  title = {Anonymous Memo},\n"), "{bib}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_profile_exits_one_without_writing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_profile(&server, &[]).await;

    let site = Site::new("XYZ");
    let output = run_scholar(&server, site.dir.path()).await;
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "{text}");
    assert!(
        text.contains("No publications retrieved from Google Scholar."),
        "{text}"
    );
    assert!(!site.path("_bibliography/papers.bib").exists());
}
