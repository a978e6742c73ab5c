//! Pull-request idempotency and retry behavior against a scripted host.

use std::time::Duration;

use ensemble_core::Workspace;
use ensemble_scm::{GithubClient, RepoSlug, RetryPolicy, ScmClient, ScmError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BRANCH: &str = "ensemble/run-cafe0123";

fn pull_json(number: u64) -> serde_json::Value {
    json!({
        "number": number,
        "html_url": format!("https://github.com/acme/widgets/pull/{}", number),
        "created_at": "2026-08-23T10:00:00Z",
        "head": {"ref": BRANCH}
    })
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

fn client_for(server: &MockServer) -> ScmClient<GithubClient> {
    let slug = RepoSlug::parse("https://github.com/acme/widgets.git").unwrap();
    let host = GithubClient::new(slug, "test-token").with_api_base(server.uri());
    ScmClient::new(host, "main").with_retry(fast_retry())
}

fn scratch_workspace(dir: &TempDir) -> Workspace {
    // No git history needed: commit counting degrades to zero.
    Workspace::new(dir.path(), "https://github.com/acme/widgets.git", BRANCH)
}

#[tokio::test]
async fn test_open_pull_request_twice_returns_same_identity() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let workspace = scratch_workspace(&dir);

    // First lookup finds nothing, so the client creates #7.
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(query_param("head", format!("acme:{}", BRANCH)))
        .and(query_param("state", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(201).set_body_json(pull_json(7)))
        .expect(1)
        .mount(&server)
        .await;
    // Every later lookup sees the open pull request.
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([pull_json(7)])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client
        .open_pull_request(&workspace, "Add widget", "Adds the widget")
        .await
        .unwrap();
    let second = client
        .open_pull_request(&workspace, "Add widget", "Adds the widget")
        .await
        .unwrap();

    assert_eq!(first.url, second.url);
    assert_eq!(first.branch, BRANCH);
    // expect(1) on the POST mock verifies no duplicate creation.
}

#[tokio::test]
async fn test_transient_host_errors_are_retried_to_success() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let workspace = scratch_workspace(&dir);

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(201).set_body_json(pull_json(9)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .open_pull_request(&workspace, "Add widget", "body")
        .await
        .unwrap();
    assert!(result.url.ends_with("/pull/9"));
}

#[tokio::test]
async fn test_transient_on_every_attempt_surfaces_one_fatal_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let workspace = scratch_workspace(&dir);

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .open_pull_request(&workspace, "Add widget", "body")
        .await
        .unwrap_err();

    match err {
        ScmError::RetriesExhausted { op, attempts, .. } => {
            assert_eq!(op, "open_pull_request");
            assert_eq!(attempts, 3);
        }
        other => panic!("Expected RetriesExhausted, got {}", other),
    }
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let workspace = scratch_workspace(&dir);

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .open_pull_request(&workspace, "Add widget", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::Auth(_)));
}

#[tokio::test]
async fn test_validation_rejection_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let workspace = scratch_workspace(&dir);

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(422).set_body_string("head invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .open_pull_request(&workspace, "Add widget", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::Validation(_)));
}

#[tokio::test]
async fn test_rate_limit_with_retry_after_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let workspace = scratch_workspace(&dir);

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("rate limited"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([pull_json(11)])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .open_pull_request(&workspace, "Add widget", "body")
        .await
        .unwrap();
    assert!(result.url.ends_with("/pull/11"));
}
