//! Poll budget behavior over HTTP.

use sigma_query::SigmaError;
use wiremock::MockServer;

use super::common::{
    executor_for, forbid_file_access, mount_create_run, mount_status, run_body,
};

/// Scenario: Run never finishes
/// Given every status check reports pending
/// When execute_query is called with a budget of 30
/// Then it fails with a timeout after exactly 30 status checks
#[tokio::test]
async fn test_poll_budget_exhausted() {
    let api = MockServer::start().await;
    let files = MockServer::start().await;

    mount_create_run(&api, "run_1").await;
    // Served at most 30 times; a 31st check would hit no mock and fail with a 404.
    mount_status(&api, "run_1", run_body("run_1", "pending"), 30).await;
    forbid_file_access(&api, &files).await;

    let err = executor_for(&api, 30)
        .execute_query("SELECT * FROM balance_transactions")
        .await
        .unwrap_err();

    assert!(matches!(err, SigmaError::Timeout { attempts: 30 }));
    assert!(err.is_retryable());

    api.verify().await;
    files.verify().await;
}

/// Scenario: Server reports a status this client does not know
/// Given every status check reports "canceled"
/// When execute_query is called with a budget of 3
/// Then it keeps polling and times out instead of erroring early
#[tokio::test]
async fn test_unknown_status_polls_until_budget() {
    let api = MockServer::start().await;
    let files = MockServer::start().await;

    mount_create_run(&api, "run_1").await;
    mount_status(&api, "run_1", run_body("run_1", "canceled"), 3).await;
    forbid_file_access(&api, &files).await;

    let err = executor_for(&api, 3)
        .execute_query("SELECT 1")
        .await
        .unwrap_err();

    assert!(matches!(err, SigmaError::Timeout { attempts: 3 }));
    api.verify().await;
}

/// Scenario: Status endpoint errors mid-poll
/// Given the first status check is pending and the second returns 500
/// When execute_query is called
/// Then the remote error is surfaced without further polling
#[tokio::test]
async fn test_status_error_is_not_retried() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let api = MockServer::start().await;

    mount_create_run(&api, "run_1").await;
    mount_status(&api, "run_1", run_body("run_1", "pending"), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/sigma/query_runs/run_1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&api)
        .await;

    let err = executor_for(&api, 30)
        .execute_query("SELECT 1")
        .await
        .unwrap_err();

    match err {
        SigmaError::Remote { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal");
        }
        other => panic!("expected Remote, got {:?}", other),
    }
    api.verify().await;
}
