//! Request descriptors and the builder that produces them.
//!
//! A [`RequestBuilder`] turns a domain intent into an [`ApiRequest`] without
//! performing any I/O. The descriptor is handed to a
//! [`Transport`](super::transport::Transport) exactly once.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde_json::json;

use super::types::{EstimateUpdateMethod, NewIssue};

/// Format JIRA expects for worklog `started` timestamps.
const JIRA_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// An HTTP request against the JIRA REST API, not yet sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// The HTTP method.
    pub method: Method,
    /// The path relative to the JIRA base URL, starting with `/`.
    pub path: String,
    /// Query string parameters, unencoded.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// A GET request with no query parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// A POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Look up the first query parameter with the given name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Produces request descriptors, one factory per session operation.
///
/// Implementations must be pure: no network access, no shared state.
pub trait RequestBuilder {
    /// Log in: `POST /rest/auth/1/session`.
    fn create_authenticate(&self, username: &str, password: &str) -> ApiRequest;

    /// Current session info: `GET /rest/auth/1/session`.
    fn create_validate_session(&self) -> ApiRequest;

    /// Favourite filters: `GET /rest/api/2/filter/favourite`.
    fn create_get_favorite_filters(&self) -> ApiRequest;

    /// One page of a JQL search: `GET /rest/api/2/search`.
    fn create_get_issues_by_jql(&self, jql: &str, max_results: u32) -> ApiRequest;

    /// Summary projection: `GET /rest/api/2/issue/{key}?fields=summary`.
    fn create_get_issue_summary(&self, key: &str) -> ApiRequest;

    /// Time tracking projection: `GET /rest/api/2/issue/{key}?fields=timetracking`.
    fn create_get_issue_timetracking(&self, key: &str) -> ApiRequest;

    /// Log work: `POST /rest/api/2/issue/{key}/worklog`.
    ///
    /// `time_spent` is sent in whole seconds.
    fn create_post_worklog(
        &self,
        key: &str,
        started: DateTime<Utc>,
        time_spent: Duration,
        comment: &str,
        estimate_update_method: EstimateUpdateMethod,
        estimate_update_value: &str,
    ) -> ApiRequest;

    /// Add a comment: `POST /rest/api/2/issue/{key}/comment`.
    fn create_post_comment(&self, key: &str, comment: &str) -> ApiRequest;

    /// Available transitions: `GET /rest/api/2/issue/{key}/transitions`.
    fn create_get_available_transitions(&self, key: &str) -> ApiRequest;

    /// Perform a transition: `POST /rest/api/2/issue/{key}/transitions`.
    fn create_do_transition(&self, key: &str, transition_id: u32) -> ApiRequest;

    /// Create metadata: `GET /rest/api/2/issue/createmeta`.
    fn create_get_create_issue_meta(&self) -> ApiRequest;

    /// User search: `GET /rest/api/2/user/search`.
    fn create_find_users(&self, search_pattern: &str) -> ApiRequest;

    /// Logged-in user: `GET /rest/api/2/myself`.
    fn create_get_myself(&self) -> ApiRequest;

    /// Create an issue: `POST /rest/api/2/issue`.
    fn create_create_issue(&self, issue: &NewIssue) -> ApiRequest;
}

/// [`RequestBuilder`] for the JIRA REST API v2 with cookie-based sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestRequestBuilder;

impl RestRequestBuilder {
    pub fn new() -> Self {
        Self
    }
}

fn issue_path(key: &str) -> String {
    format!("/rest/api/2/issue/{}", urlencoding::encode(key))
}

impl RequestBuilder for RestRequestBuilder {
    fn create_authenticate(&self, username: &str, password: &str) -> ApiRequest {
        ApiRequest::post(
            "/rest/auth/1/session",
            json!({ "username": username, "password": password }),
        )
    }

    fn create_validate_session(&self) -> ApiRequest {
        ApiRequest::get("/rest/auth/1/session")
    }

    fn create_get_favorite_filters(&self) -> ApiRequest {
        ApiRequest::get("/rest/api/2/filter/favourite")
    }

    fn create_get_issues_by_jql(&self, jql: &str, max_results: u32) -> ApiRequest {
        ApiRequest::get("/rest/api/2/search")
            .with_query("jql", jql)
            .with_query("maxResults", max_results.to_string())
            .with_query("fields", "summary")
    }

    fn create_get_issue_summary(&self, key: &str) -> ApiRequest {
        ApiRequest::get(issue_path(key)).with_query("fields", "summary")
    }

    fn create_get_issue_timetracking(&self, key: &str) -> ApiRequest {
        ApiRequest::get(issue_path(key)).with_query("fields", "timetracking")
    }

    fn create_post_worklog(
        &self,
        key: &str,
        started: DateTime<Utc>,
        time_spent: Duration,
        comment: &str,
        estimate_update_method: EstimateUpdateMethod,
        estimate_update_value: &str,
    ) -> ApiRequest {
        let mut request = ApiRequest::post(
            format!("{}/worklog", issue_path(key)),
            json!({
                "started": started.format(JIRA_DATETIME_FORMAT).to_string(),
                "timeSpentSeconds": time_spent.num_seconds(),
                "comment": comment,
            }),
        );
        request.query = estimate_update_method.query_params(estimate_update_value);
        request
    }

    fn create_post_comment(&self, key: &str, comment: &str) -> ApiRequest {
        ApiRequest::post(
            format!("{}/comment", issue_path(key)),
            json!({ "body": comment }),
        )
    }

    fn create_get_available_transitions(&self, key: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/transitions", issue_path(key)))
    }

    fn create_do_transition(&self, key: &str, transition_id: u32) -> ApiRequest {
        ApiRequest::post(
            format!("{}/transitions", issue_path(key)),
            json!({ "transition": { "id": transition_id.to_string() } }),
        )
    }

    fn create_get_create_issue_meta(&self) -> ApiRequest {
        ApiRequest::get("/rest/api/2/issue/createmeta")
    }

    fn create_find_users(&self, search_pattern: &str) -> ApiRequest {
        ApiRequest::get("/rest/api/2/user/search").with_query("username", search_pattern)
    }

    fn create_get_myself(&self) -> ApiRequest {
        ApiRequest::get("/rest/api/2/myself")
    }

    fn create_create_issue(&self, issue: &NewIssue) -> ApiRequest {
        let fields = &issue.fields;
        ApiRequest::post(
            "/rest/api/2/issue",
            json!({
                "fields": {
                    "issuetype": { "id": fields.issuetype.id },
                    "project": { "id": fields.project.id },
                    "summary": fields.summary,
                    "description": fields.description,
                    "assignee": { "name": fields.assignee.name },
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::api::types::{IdRef, NameRef, NewIssueFields};

    #[test]
    fn test_authenticate_request() {
        let request = RestRequestBuilder.create_authenticate("alice", "secret");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/rest/auth/1/session");
        assert_eq!(
            request.body,
            Some(json!({ "username": "alice", "password": "secret" }))
        );
    }

    #[test]
    fn test_validate_session_request() {
        let request = RestRequestBuilder.create_validate_session();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/rest/auth/1/session");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_search_request_carries_single_page_bound() {
        let request = RestRequestBuilder.create_get_issues_by_jql("project = KEY", 200);
        assert_eq!(request.path, "/rest/api/2/search");
        assert_eq!(request.query_param("jql"), Some("project = KEY"));
        assert_eq!(request.query_param("maxResults"), Some("200"));
        assert_eq!(request.query_param("fields"), Some("summary"));
    }

    #[test]
    fn test_issue_projections() {
        let summary = RestRequestBuilder.create_get_issue_summary("KEY-1");
        assert_eq!(summary.path, "/rest/api/2/issue/KEY-1");
        assert_eq!(summary.query_param("fields"), Some("summary"));

        let tt = RestRequestBuilder.create_get_issue_timetracking("KEY-1");
        assert_eq!(tt.query_param("fields"), Some("timetracking"));
    }

    #[test]
    fn test_issue_key_is_path_encoded() {
        let request = RestRequestBuilder.create_get_available_transitions("KEY 1/x");
        assert_eq!(request.path, "/rest/api/2/issue/KEY%201%2Fx/transitions");
    }

    #[test]
    fn test_worklog_request() {
        let started = Utc.with_ymd_and_hms(2016, 3, 1, 9, 30, 0).unwrap();
        let request = RestRequestBuilder.create_post_worklog(
            "KEY-1",
            started,
            Duration::minutes(90),
            "Did things",
            EstimateUpdateMethod::SetTo,
            "2h",
        );

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/rest/api/2/issue/KEY-1/worklog");
        assert_eq!(request.query_param("adjustEstimate"), Some("new"));
        assert_eq!(request.query_param("newEstimate"), Some("2h"));

        let body = request.body.unwrap();
        assert_eq!(body["started"], "2016-03-01T09:30:00.000+0000");
        assert_eq!(body["timeSpentSeconds"], 5400);
        assert_eq!(body["comment"], "Did things");
    }

    #[test]
    fn test_do_transition_request() {
        let request = RestRequestBuilder.create_do_transition("KEY-1", 31);
        assert_eq!(request.path, "/rest/api/2/issue/KEY-1/transitions");
        assert_eq!(request.body, Some(json!({ "transition": { "id": "31" } })));
    }

    #[test]
    fn test_find_users_request() {
        let request = RestRequestBuilder.create_find_users("ali");
        assert_eq!(request.path, "/rest/api/2/user/search");
        assert_eq!(request.query_param("username"), Some("ali"));
    }

    #[test]
    fn test_comment_request() {
        let request = RestRequestBuilder.create_post_comment("KEY-1", "hello");
        assert_eq!(request.path, "/rest/api/2/issue/KEY-1/comment");
        assert_eq!(request.body, Some(json!({ "body": "hello" })));
    }

    #[test]
    fn test_create_issue_request() {
        let issue = NewIssue {
            fields: NewIssueFields {
                issuetype: IdRef { id: 3 },
                project: IdRef { id: 10000 },
                summary: "New task".to_string(),
                description: String::new(),
                assignee: NameRef {
                    name: "alice".to_string(),
                },
            },
        };

        let request = RestRequestBuilder.create_create_issue(&issue);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/rest/api/2/issue");
        assert_eq!(
            request.body,
            Some(json!({
                "fields": {
                    "issuetype": { "id": 3 },
                    "project": { "id": 10000 },
                    "summary": "New task",
                    "description": "",
                    "assignee": { "name": "alice" }
                }
            }))
        );
    }
}
