//! Request shape and error classification for individual endpoints.

use serde_json::json;
use sigma_query::api::{ArtifactReference, HttpSigmaApi, SigmaApi};
use sigma_query::config::ClientConfig;
use sigma_query::SigmaError;
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{run_body, API_KEY};

fn http_api(base_url: &str) -> HttpSigmaApi {
    let config = ClientConfig::new(API_KEY)
        .unwrap()
        .with_base_url(base_url)
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    HttpSigmaApi::new(&config).unwrap()
}

#[tokio::test]
async fn test_create_run_sends_form_encoded_sql() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sigma/query_runs"))
        .and(basic_auth(API_KEY, ""))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("sql=SELECT+id+FROM+charges+WHERE+amount+%3E+100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("sqr_1", "running")))
        .expect(1)
        .mount(&server)
        .await;

    let run_id = http_api(&server.uri())
        .create_query_run("SELECT id FROM charges WHERE amount > 100")
        .await
        .unwrap();

    assert_eq!(run_id, "sqr_1");
}

#[tokio::test]
async fn test_create_run_remote_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sigma/query_runs"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "Invalid API Key provided" } })),
        )
        .mount(&server)
        .await;

    let err = http_api(&server.uri())
        .create_query_run("SELECT 1")
        .await
        .unwrap_err();

    match err {
        SigmaError::Remote { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API Key provided"));
        }
        other => panic!("expected Remote, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_run_protocol_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sigma/query_runs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sigma/query_runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "sigma.query_run" })))
        .mount(&server)
        .await;

    let api = http_api(&server.uri());

    let not_json = api.create_query_run("SELECT 1").await.unwrap_err();
    assert!(matches!(not_json, SigmaError::Protocol(_)));

    let missing_id = api.create_query_run("SELECT 1").await.unwrap_err();
    assert!(matches!(missing_id, SigmaError::Protocol(_)));
    assert!(!missing_id.is_retryable());
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    // Bind and drop a listener to get a port with nothing behind it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = http_api(&format!("http://127.0.0.1:{port}"))
        .create_query_run("SELECT 1")
        .await
        .unwrap_err();

    assert!(matches!(err, SigmaError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_download_uses_same_credential_on_other_host() {
    let files = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/abc"))
        .and(basic_auth(API_KEY, ""))
        .respond_with(ResponseTemplate::new(200).set_body_string("a\n1\n"))
        .expect(1)
        .mount(&files)
        .await;

    let api = http_api("https://api.stripe.com");
    let location = url::Url::parse(&format!("{}/abc", files.uri())).unwrap();
    let bytes = api.download(&location).await.unwrap();

    assert_eq!(bytes, b"a\n1\n");
}

#[tokio::test]
async fn test_download_remote_error() {
    let files = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/expired"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Request has expired"))
        .mount(&files)
        .await;

    let api = http_api(&files.uri());
    let location = url::Url::parse(&format!("{}/expired", files.uri())).unwrap();
    let err = api.download(&location).await.unwrap_err();

    assert!(matches!(err, SigmaError::Remote { status: 403, .. }));
}

#[tokio::test]
async fn test_file_metadata_without_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/files/file_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "file_1", "object": "file" })),
        )
        .mount(&server)
        .await;

    let api = http_api(&server.uri());
    let metadata = api
        .retrieve_file(&ArtifactReference::new("file_1"))
        .await
        .unwrap();

    assert!(matches!(
        metadata.download_location(),
        Err(SigmaError::Protocol(_))
    ));
}
