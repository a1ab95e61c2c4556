//! jira-session - a session-oriented facade over the JIRA REST API.
//!
//! [`JiraSession`] exposes domain operations (log in, search issues, post a
//! worklog, transition an issue, ...) and hides request construction,
//! transport and access-denied handling behind a uniform contract.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use api::{ApiError, HttpTransport, RequestBuilder, RestRequestBuilder, Transport};
pub use session::{JiraSession, DEFAULT_MAX_RESULTS};
