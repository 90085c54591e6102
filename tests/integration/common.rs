//! Shared helpers for the mock-server tests.

use serde_json::{json, Value};
use sigma_query::config::ClientConfig;
use sigma_query::query::PollPolicy;
use sigma_query::QueryExecutor;
use std::time::Duration;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "sk_test_123";

/// Builds an executor pointed at `server` that polls every millisecond.
pub fn executor_for(server: &MockServer, max_attempts: u32) -> QueryExecutor {
    let policy = PollPolicy::new(Duration::from_millis(1), max_attempts).unwrap();
    let config = ClientConfig::new(API_KEY)
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_secs(5))
        .with_poll_policy(policy);
    QueryExecutor::from_config(&config).unwrap()
}

pub fn run_body(id: &str, status: &str) -> Value {
    json!({ "id": id, "object": "sigma.query_run", "status": status })
}

pub fn succeeded_body(id: &str, file: &str) -> Value {
    json!({
        "id": id,
        "object": "sigma.query_run",
        "status": "succeeded",
        "result": { "file": file }
    })
}

/// Mounts the create-run endpoint returning `run_id`.
pub async fn mount_create_run(server: &MockServer, run_id: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/sigma/query_runs"))
        .and(basic_auth(API_KEY, ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(run_id, "running")))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a status response that is served `times` times.
pub async fn mount_status(server: &MockServer, run_id: &str, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/sigma/query_runs/{run_id}")))
        .and(basic_auth(API_KEY, ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts file metadata that points at `files_server` and the file body there.
pub async fn mount_file(
    api_server: &MockServer,
    files_server: &MockServer,
    file_id: &str,
    contents: &str,
) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/files/{file_id}")))
        .and(basic_auth(API_KEY, ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": file_id,
            "object": "file",
            "url": format!("{}/v1/files/{}/contents", files_server.uri(), file_id)
        })))
        .expect(1)
        .mount(api_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/files/{file_id}/contents")))
        .and(basic_auth(API_KEY, ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(contents))
        .expect(1)
        .mount(files_server)
        .await;
}

/// Mounts a catch-all on the files paths that must never be hit.
pub async fn forbid_file_access(api_server: &MockServer, files_server: &MockServer) {
    Mock::given(wiremock::matchers::path_regex("^/v1/files/.*"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(api_server)
        .await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(files_server)
        .await;
}
