//! JIRA REST API v2 request and response types.
//!
//! These are plain data carriers. The session layer passes them through
//! untouched, apart from the summary/timetracking projections and the key
//! of a freshly created issue.

use std::fmt;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A saved JIRA filter.
///
/// Returned by `GET /rest/api/2/filter/favourite`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// The filter ID.
    pub id: String,
    /// The filter name.
    pub name: String,
    /// The JQL query behind the filter.
    #[serde(default)]
    pub jql: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// URL to view the filter in JIRA.
    #[serde(default)]
    pub view_url: Option<String>,
    /// Whether the filter is a favourite of the current user.
    #[serde(default)]
    pub favourite: bool,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Search result from a JQL query.
///
/// Returned by `GET /rest/api/2/search`. Only a single bounded page is ever
/// requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The index of the first result.
    #[serde(default)]
    pub start_at: u32,
    /// Maximum results requested.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of matching issues.
    #[serde(default)]
    pub total: u32,
    /// The list of issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// A JIRA issue.
///
/// Depending on the `fields` parameter of the request, most of `fields` may
/// be absent, so every field there is optional or defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    /// The issue ID.
    #[serde(default)]
    pub id: String,
    /// The issue key (e.g., "PROJ-123").
    pub key: String,
    /// URL of the issue resource.
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
    /// The issue fields.
    #[serde(default)]
    pub fields: IssueFields,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.fields.summary)
    }
}

/// Issue fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueFields {
    /// The issue summary/title.
    #[serde(default)]
    pub summary: String,
    /// The plain-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Time tracking data, present when requested.
    #[serde(default)]
    pub timetracking: Option<TimetrackingFields>,
    /// The issue assignee.
    #[serde(default)]
    pub assignee: Option<User>,
}

/// Time tracking fields of an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimetrackingFields {
    /// Original estimate in JIRA notation (e.g. "1d 2h").
    #[serde(default)]
    pub original_estimate: Option<String>,
    /// Remaining estimate in JIRA notation.
    #[serde(default)]
    pub remaining_estimate: Option<String>,
    /// Time logged so far in JIRA notation.
    #[serde(default)]
    pub time_spent: Option<String>,
    #[serde(default)]
    pub original_estimate_seconds: Option<i64>,
    #[serde(default)]
    pub remaining_estimate_seconds: Option<i64>,
    #[serde(default)]
    pub time_spent_seconds: Option<i64>,
}

/// Transitions available for an issue in its current state.
///
/// Returned by `GET /rest/api/2/issue/{issueKey}/transitions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AvailableTransitions {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// A workflow transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    /// The transition ID.
    pub id: String,
    /// The transition name (e.g., "Start Progress").
    pub name: String,
    /// The status the issue moves to.
    #[serde(default)]
    pub to: Option<Status>,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Issue status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    /// The status ID.
    pub id: String,
    /// The status name (e.g., "To Do", "In Progress", "Done").
    pub name: String,
}

/// Metadata for creating issues: the projects and issue types the current
/// user may create issues in.
///
/// Returned by `GET /rest/api/2/issue/createmeta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateIssueMeta {
    #[serde(default)]
    pub projects: Vec<ProjectMeta>,
}

/// A project in the create-issue metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMeta {
    /// The project ID.
    pub id: String,
    /// The project key (e.g., "PROJ").
    pub key: String,
    /// The project name.
    pub name: String,
    /// Issue types that can be created in this project.
    #[serde(default)]
    pub issuetypes: Vec<IssueTypeMeta>,
}

/// An issue type in the create-issue metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueTypeMeta {
    /// The issue type ID.
    pub id: String,
    /// The issue type name.
    pub name: String,
    /// Whether this is a subtask type.
    #[serde(default)]
    pub subtask: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// A JIRA user.
///
/// Server deployments identify users by `name`/`key`, cloud deployments by
/// `accountId`; whichever the server sends is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The username.
    #[serde(default)]
    pub name: String,
    /// The user key.
    #[serde(default)]
    pub key: Option<String>,
    /// The account ID.
    #[serde(default)]
    pub account_id: Option<String>,
    /// The user's display name.
    #[serde(default)]
    pub display_name: String,
    /// The user's email address (may be hidden).
    #[serde(default)]
    pub email_address: Option<String>,
    /// Whether the user is active.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            name: String::new(),
            key: None,
            account_id: None,
            display_name: String::new(),
            email_address: None,
            active: true,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Response of `POST /rest/api/2/issue`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedIssue {
    /// The new issue ID.
    #[serde(default)]
    pub id: String,
    /// The new issue key.
    pub key: String,
    /// URL of the new issue resource.
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

/// Body of `POST /rest/api/2/issue`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewIssue {
    pub fields: NewIssueFields,
}

/// The fields set on a newly created issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewIssueFields {
    pub issuetype: IdRef,
    pub project: IdRef,
    pub summary: String,
    pub description: String,
    pub assignee: NameRef,
}

/// Reference to a resource by numeric ID.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdRef {
    pub id: u64,
}

/// Reference to a user by username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameRef {
    pub name: String,
}

/// How the remaining estimate is adjusted when a worklog is posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimateUpdateMethod {
    /// Let JIRA reduce the estimate by the logged time.
    #[default]
    Auto,
    /// Leave the estimate unchanged.
    Leave,
    /// Set the remaining estimate to the given value.
    SetTo,
    /// Reduce the remaining estimate by the given value.
    ManualDecrease,
}

impl EstimateUpdateMethod {
    /// The `adjustEstimate` query parameter value.
    pub fn as_param(&self) -> &'static str {
        match self {
            EstimateUpdateMethod::Auto => "auto",
            EstimateUpdateMethod::Leave => "leave",
            EstimateUpdateMethod::SetTo => "new",
            EstimateUpdateMethod::ManualDecrease => "manual",
        }
    }

    /// Query parameters for a worklog request.
    ///
    /// `value` is only sent for the two methods that take one.
    pub fn query_params(&self, value: &str) -> Vec<(String, String)> {
        let mut params = vec![("adjustEstimate".to_string(), self.as_param().to_string())];
        match self {
            EstimateUpdateMethod::SetTo => {
                params.push(("newEstimate".to_string(), value.to_string()));
            }
            EstimateUpdateMethod::ManualDecrease => {
                params.push(("reduceBy".to_string(), value.to_string()));
            }
            EstimateUpdateMethod::Auto | EstimateUpdateMethod::Leave => {}
        }
        params
    }
}
