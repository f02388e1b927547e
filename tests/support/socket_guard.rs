use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKET_TESTS_ENV: &str = "SITE_SYNC_REQUIRE_SOCKET_TESTS";

#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_SOCKET_TESTS_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    if socket_tests_required() {
        panic!("[socket-bound-test] cannot bind localhost socket; {REQUIRE_SOCKET_TESTS_ENV} is set");
    }
    eprintln!("[socket-bound-test] cannot bind localhost socket; skipping wiremock-based test");
    None
}
