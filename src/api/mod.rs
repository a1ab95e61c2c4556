//! JIRA API request building, transport and types.
//!
//! This module provides everything the session layer consumes: request
//! descriptors, the transport that executes them, and the response types.

pub mod auth;
pub mod error;
pub mod request;
pub mod transport;
pub mod types;

pub use auth::Auth;
pub use error::{ApiError, Result};
pub use request::{ApiRequest, RequestBuilder, RestRequestBuilder};
pub use transport::{HttpTransport, Transport};
pub use types::{
    AvailableTransitions, CreateIssueMeta, EstimateUpdateMethod, Filter, Issue, SearchResult,
    TimetrackingFields, User,
};
