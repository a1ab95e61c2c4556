//! Session-oriented facade over the JIRA REST API.
//!
//! [`JiraSession`] turns each domain intent into one request, runs it through
//! a [`Transport`], and normalizes the outcome. An access-denied response
//! never reaches the caller as an error: each operation returns its
//! documented stand-in value instead.
//!
//! | Operation                  | On access denied          |
//! |----------------------------|---------------------------|
//! | `authenticate`             | `false`, message recorded |
//! | `validate_session`         | `false`, message recorded |
//! | `get_favorite_filters`     | `None`                    |
//! | `get_issues_by_jql`        | `None`                    |
//! | `get_issue_summary`        | `""`                      |
//! | `get_issue_timetracking`   | `None`                    |
//! | `post_worklog`             | `false`                   |
//! | `post_comment`             | `false`                   |
//! | `get_available_transitions`| `None`                    |
//! | `do_transition`            | `false`                   |
//! | `get_create_issue_meta`    | `CreateIssueMeta::default()` |
//! | `find_users`               | empty `Vec`               |
//! | `get_myself`               | `User::default()`         |
//! | `create_issue`             | `None`                    |
//!
//! Every stand-in is the `Default` of the operation's return type, so the
//! whole policy is applied by [`settle`]. Any other failure (network,
//! decoding, server error) is returned as `Err` unchanged.
//!
//! Only `authenticate` and `validate_session` touch the session state. A
//! denial on any other call leaves `session_valid()` as it was; callers that
//! want an accurate answer must call `validate_session` again.

use std::path::Path;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::api::request::{RequestBuilder, RestRequestBuilder};
use crate::api::transport::{execute, Transport};
use crate::api::types::{
    AvailableTransitions, CreateIssueMeta, CreatedIssue, EstimateUpdateMethod, Filter, IdRef,
    Issue, NameRef, NewIssue, NewIssueFields, SearchResult, TimetrackingFields, User,
};
use crate::api::{ApiError, Result};

/// Page size used by [`JiraSession::get_issues_by_jql`] when none is given.
pub const DEFAULT_MAX_RESULTS: u32 = 200;

/// Session validity as last established by this facade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    valid: bool,
    error_message: String,
}

impl SessionState {
    /// Forget any previous validation before a new attempt.
    fn reset(&mut self) {
        self.valid = false;
        self.error_message.clear();
    }

    fn deny(&mut self, message: String) {
        self.valid = false;
        self.error_message = message;
    }
}

/// Split off an access denial from other failures.
///
/// Returns `Ok(Err(message))` for a denial and propagates every other error.
fn denial<T>(result: Result<T>) -> Result<std::result::Result<T, String>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(ApiError::AccessDenied(message)) => Ok(Err(message)),
        Err(e) => Err(e),
    }
}

/// Replace an access denial with the caller-facing stand-in value.
fn settle<T: Default>(operation: &'static str, result: Result<T>) -> Result<T> {
    match denial(result)? {
        Ok(value) => Ok(value),
        Err(message) => {
            warn!(operation, "Access denied: {}", message);
            Ok(T::default())
        }
    }
}

/// Round a duration up to whole seconds, the resolution JIRA logs work in.
fn round_up_to_seconds(duration: Duration) -> Option<Duration> {
    let whole = Duration::try_seconds(duration.num_seconds())?;
    if duration > whole {
        whole.checked_add(&Duration::seconds(1))
    } else {
        Some(whole)
    }
}

/// A JIRA session.
///
/// Not meant to be shared between tasks: session-establishing calls take
/// `&mut self`, so callers needing concurrency use one session per task.
#[derive(Debug)]
pub struct JiraSession<T, B = RestRequestBuilder> {
    builder: B,
    transport: T,
    state: SessionState,
}

impl<T: Transport> JiraSession<T, RestRequestBuilder> {
    /// Create a session that builds JIRA REST v2 requests.
    pub fn with_transport(transport: T) -> Self {
        Self::new(RestRequestBuilder::new(), transport)
    }
}

impl<T: Transport, B: RequestBuilder> JiraSession<T, B> {
    /// Create a session from a request builder and a transport.
    ///
    /// The session starts out unvalidated.
    pub fn new(builder: B, transport: T) -> Self {
        Self {
            builder,
            transport,
            state: SessionState::default(),
        }
    }

    /// Whether the last `validate_session` call succeeded.
    pub fn session_valid(&self) -> bool {
        self.state.valid
    }

    /// Message of the last denied `authenticate`/`validate_session` call.
    pub fn error_message(&self) -> &str {
        &self.state.error_message
    }

    /// Log in with a username and password.
    ///
    /// Success does not make the session valid; only `validate_session` does.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<bool> {
        self.state.reset();

        let request = self.builder.create_authenticate(username, password);
        match denial(execute::<Value, _>(&self.transport, request).await)? {
            Ok(_) => {
                debug!("Authenticated");
                Ok(true)
            }
            Err(message) => {
                warn!("Authentication denied: {}", message);
                self.state.deny(message);
                Ok(false)
            }
        }
    }

    /// Check that the current session is accepted by the server.
    #[instrument(skip(self))]
    pub async fn validate_session(&mut self) -> Result<bool> {
        self.state.reset();

        let request = self.builder.create_validate_session();
        match denial(execute::<Value, _>(&self.transport, request).await)? {
            Ok(_) => {
                debug!("Session validated");
                self.state.valid = true;
                Ok(true)
            }
            Err(message) => {
                warn!("Session validation denied: {}", message);
                self.state.deny(message);
                Ok(false)
            }
        }
    }

    /// Get the current user's favourite filters.
    #[instrument(skip(self))]
    pub async fn get_favorite_filters(&self) -> Result<Option<Vec<Filter>>> {
        let request = self.builder.create_get_favorite_filters();
        let result = execute::<Vec<Filter>, _>(&self.transport, request).await;
        settle("get_favorite_filters", result.map(Some))
    }

    /// Run a JQL search, returning a single page of at most `max_results`
    /// issues ([`DEFAULT_MAX_RESULTS`] if not given).
    #[instrument(skip(self))]
    pub async fn get_issues_by_jql(
        &self,
        jql: &str,
        max_results: Option<u32>,
    ) -> Result<Option<SearchResult>> {
        let max_results = max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let request = self.builder.create_get_issues_by_jql(jql, max_results);
        let result = execute::<SearchResult, _>(&self.transport, request).await;
        if let Ok(found) = &result {
            debug!("Found {} issues (total: {})", found.issues.len(), found.total);
        }
        settle("get_issues_by_jql", result.map(Some))
    }

    /// Get an issue's summary, or `""` if access is denied.
    #[instrument(skip(self))]
    pub async fn get_issue_summary(&self, key: &str) -> Result<String> {
        let request = self.builder.create_get_issue_summary(key);
        let result = execute::<Issue, _>(&self.transport, request).await;
        settle("get_issue_summary", result.map(|issue| issue.fields.summary))
    }

    /// Get an issue's time tracking fields.
    #[instrument(skip(self))]
    pub async fn get_issue_timetracking(&self, key: &str) -> Result<Option<TimetrackingFields>> {
        let request = self.builder.create_get_issue_timetracking(key);
        let result = execute::<Issue, _>(&self.transport, request).await;
        settle(
            "get_issue_timetracking",
            result.map(|issue| issue.fields.timetracking),
        )
    }

    /// Log `time_spent` on an issue, ending now.
    ///
    /// `time_spent` is rounded up to whole seconds and the worklog's start is
    /// `now - time_spent`. A duration reaching outside the representable
    /// date range is rejected with [`ApiError::InvalidRequest`] before
    /// anything is sent.
    #[instrument(skip(self, comment))]
    pub async fn post_worklog(
        &self,
        key: &str,
        time_spent: Duration,
        comment: &str,
        estimate_update_method: EstimateUpdateMethod,
        estimate_update_value: &str,
    ) -> Result<bool> {
        let too_long =
            || ApiError::InvalidRequest(format!("worklog of {} is too long", time_spent));
        let rounded = round_up_to_seconds(time_spent).ok_or_else(too_long)?;
        let started = Utc::now().checked_sub_signed(rounded).ok_or_else(too_long)?;
        let request = self.builder.create_post_worklog(
            key,
            started,
            rounded,
            comment,
            estimate_update_method,
            estimate_update_value,
        );
        let result = execute::<Value, _>(&self.transport, request).await;
        settle("post_worklog", result.map(|_| true))
    }

    /// Add a comment to an issue.
    #[instrument(skip(self, comment))]
    pub async fn post_comment(&self, key: &str, comment: &str) -> Result<bool> {
        let request = self.builder.create_post_comment(key, comment);
        let result = execute::<Value, _>(&self.transport, request).await;
        settle("post_comment", result.map(|_| true))
    }

    /// Get the transitions available for an issue.
    #[instrument(skip(self))]
    pub async fn get_available_transitions(
        &self,
        key: &str,
    ) -> Result<Option<AvailableTransitions>> {
        let request = self.builder.create_get_available_transitions(key);
        let result = execute::<AvailableTransitions, _>(&self.transport, request).await;
        settle("get_available_transitions", result.map(Some))
    }

    /// Move an issue through a workflow transition.
    #[instrument(skip(self))]
    pub async fn do_transition(&self, key: &str, transition_id: u32) -> Result<bool> {
        let request = self.builder.create_do_transition(key, transition_id);
        let result = execute::<Value, _>(&self.transport, request).await;
        settle("do_transition", result.map(|_| true))
    }

    /// Get the projects and issue types the user can create issues in.
    #[instrument(skip(self))]
    pub async fn get_create_issue_meta(&self) -> Result<CreateIssueMeta> {
        let request = self.builder.create_get_create_issue_meta();
        let result = execute::<CreateIssueMeta, _>(&self.transport, request).await;
        settle("get_create_issue_meta", result)
    }

    /// Search users by name, username or email.
    #[instrument(skip(self))]
    pub async fn find_users(&self, search_pattern: &str) -> Result<Vec<User>> {
        let request = self.builder.create_find_users(search_pattern);
        let result = execute::<Vec<User>, _>(&self.transport, request).await;
        settle("find_users", result)
    }

    /// Get the currently logged-in user.
    #[instrument(skip(self))]
    pub async fn get_myself(&self) -> Result<User> {
        let request = self.builder.create_get_myself();
        let result = execute::<User, _>(&self.transport, request).await;
        settle("get_myself", result)
    }

    /// Create an issue and return its key.
    #[instrument(skip(self, description))]
    pub async fn create_issue(
        &self,
        project_id: u64,
        issue_type_id: u64,
        summary: &str,
        description: &str,
        assignee: &str,
    ) -> Result<Option<String>> {
        let issue = NewIssue {
            fields: NewIssueFields {
                issuetype: IdRef { id: issue_type_id },
                project: IdRef { id: project_id },
                summary: summary.to_string(),
                description: description.to_string(),
                assignee: NameRef {
                    name: assignee.to_string(),
                },
            },
        };

        let request = self.builder.create_create_issue(&issue);
        let result = execute::<CreatedIssue, _>(&self.transport, request).await;
        if let Ok(created) = &result {
            debug!("Created issue {}", created.key);
        }
        settle("create_issue", result.map(|created| Some(created.key)))
    }

    /// Attach a file to an issue. Not supported.
    pub fn add_attachment(&self, _issue_key: &str, _file_path: &Path) -> Result<()> {
        Err(ApiError::NotSupported("add attachment"))
    }

    /// Link two issues. Not supported.
    pub fn link_issues(&self, _from_issue_key: &str, _to_issue_key: &str) -> Result<()> {
        Err(ApiError::NotSupported("link issues"))
    }
}
