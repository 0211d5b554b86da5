//! SonarQube API access: response types, the HTTP client and paginated fetch.

pub mod client;
pub mod fetch;
pub mod types;

pub use client::{lookup_project, validate_connection, SonarApi, SonarClient};
pub use fetch::{fetch_all_issues, FetchOptions};
pub use types::{Issue, IssueType, Paging, ProjectInfo, SearchPage, SearchRequest, Severity, Status};
