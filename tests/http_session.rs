//! End-to-end tests for `JiraSession` over `HttpTransport`.
//!
//! A wiremock server stands in for JIRA, so these run without network
//! access or real credentials.

use chrono::Duration;
use jira_session::api::types::EstimateUpdateMethod;
use jira_session::api::ApiError;
use jira_session::config::{AuthMode, Profile, Settings};
use jira_session::{HttpTransport, JiraSession};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer) -> JiraSession<HttpTransport> {
    JiraSession::with_transport(HttpTransport::new(&server.uri()).unwrap())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/auth/1/session"))
        .and(body_json(json!({ "username": "alice", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "name": "JSESSIONID", "value": "abc123" }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/auth/1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "self": "http://jira/rest/api/2/user?username=alice",
            "name": "alice"
        })))
        .mount(server)
        .await;
}

async fn logged_in(server: &MockServer) -> JiraSession<HttpTransport> {
    mount_login(server).await;
    let mut session = session_for(server);
    assert!(session.authenticate("alice", "secret").await.unwrap());
    assert!(session.validate_session().await.unwrap());
    session
}

// ============================================================================
// Session state
// ============================================================================

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/auth/1/session"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorMessages": ["Invalid credentials"],
            "errors": {}
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    assert!(!session.authenticate("alice", "wrong").await.unwrap());
    assert_eq!(session.error_message(), "Invalid credentials");
    assert!(!session.session_valid());
}

#[tokio::test]
async fn test_login_and_read_summary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/KEY-1"))
        .and(query_param("fields", "summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10001",
            "key": "KEY-1",
            "fields": { "summary": "Fix bug" }
        })))
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    assert!(session.session_valid());
    assert_eq!(session.get_issue_summary("KEY-1").await.unwrap(), "Fix bug");
}

#[tokio::test]
async fn test_expired_session_detected_on_revalidation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/auth/1/session"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorMessages": ["You are not authenticated. Authentication required to perform this operation."]
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    assert!(!session.validate_session().await.unwrap());
    assert!(!session.session_valid());
    assert!(session.error_message().starts_with("You are not authenticated"));
}

// ============================================================================
// Access denied and other failures
// ============================================================================

#[tokio::test]
async fn test_forbidden_returns_stand_in_and_keeps_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/KEY-9/transitions"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errorMessages": ["You do not have permission to view this issue"]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/user/search"))
        .and(query_param("username", "bob"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    assert_eq!(session.get_available_transitions("KEY-9").await.unwrap(), None);
    assert!(session.find_users("bob").await.unwrap().is_empty());
    assert!(session.session_valid());
    assert_eq!(session.error_message(), "");
}

#[tokio::test]
async fn test_server_error_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/filter/favourite"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    let err = session.get_favorite_filters().await.unwrap_err();
    assert!(matches!(err, ApiError::ServerError(_)));
}

#[tokio::test]
async fn test_unreachable_server_propagates_network_error() {
    // Nothing listens on port 1.
    let transport = HttpTransport::new("http://127.0.0.1:1").unwrap();
    let mut session = JiraSession::with_transport(transport);
    let err = session.authenticate("alice", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert!(!session.session_valid());
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_post_worklog() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/KEY-1/worklog"))
        .and(query_param("adjustEstimate", "manual"))
        .and(query_param("reduceBy", "30m"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "100028",
            "timeSpentSeconds": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    let posted = session
        .post_worklog(
            "KEY-1",
            Duration::minutes(30),
            "Reviewed",
            EstimateUpdateMethod::ManualDecrease,
            "30m",
        )
        .await
        .unwrap();
    assert!(posted);
}

#[tokio::test]
async fn test_do_transition_with_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/KEY-1/transitions"))
        .and(body_json(json!({ "transition": { "id": "21" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    assert!(session.do_transition("KEY-1", 21).await.unwrap());
}

#[tokio::test]
async fn test_create_issue_returns_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue"))
        .and(body_json(json!({
            "fields": {
                "issuetype": { "id": 3 },
                "project": { "id": 10000 },
                "summary": "New task",
                "description": "Details",
                "assignee": { "name": "alice" }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10042",
            "key": "PROJ-42",
            "self": "http://jira/rest/api/2/issue/10042"
        })))
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    let key = session
        .create_issue(10000, 3, "New task", "Details", "alice")
        .await
        .unwrap();
    assert_eq!(key.as_deref(), Some("PROJ-42"));
}

// ============================================================================
// Basic auth profiles
// ============================================================================

#[tokio::test]
async fn test_basic_profile_sends_authorization_header() {
    let server = MockServer::start().await;

    // "alice:token" in Base64
    Mock::given(method("GET"))
        .and(path("/rest/api/2/myself"))
        .and(header("authorization", "Basic YWxpY2U6dG9rZW4="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "alice",
            "displayName": "Alice Example"
        })))
        .mount(&server)
        .await;

    let mut profile = Profile::new("work".to_string(), server.uri(), "alice".to_string());
    profile.auth = AuthMode::Basic;
    let transport = HttpTransport::from_profile(&profile, &Settings::default(), "token").unwrap();

    let session = JiraSession::with_transport(transport);
    let me = session.get_myself().await.unwrap();
    assert_eq!(me.display_name, "Alice Example");
}
