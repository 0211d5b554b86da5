//! SonarQube Web API response types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
    /// A severity this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Blocker,
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocker => "BLOCKER",
            Self::Critical => "CRITICAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Info => "INFO",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    Confirmed,
    Reopened,
    Resolved,
    Closed,
    #[serde(other)]
    Unknown,
}

impl Status {
    /// Statuses requested server-side unless resolved issues are included.
    pub const UNRESOLVED: [Status; 3] = [Status::Open, Status::Confirmed, Status::Reopened];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Confirmed => "CONFIRMED",
            Self::Reopened => "REOPENED",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Bug,
    Vulnerability,
    CodeSmell,
    SecurityHotspot,
    #[serde(other)]
    Unknown,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "BUG",
            Self::Vulnerability => "VULNERABILITY",
            Self::CodeSmell => "CODE_SMELL",
            Self::SecurityHotspot => "SECURITY_HOTSPOT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SonarQube issue from the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub key: String,
    pub rule: String,
    pub severity: Severity,
    /// `<projectKey>:<path>` of the file the issue is reported on.
    pub component: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub hash: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub resolution: Option<String>,
    pub message: String,
    #[serde(default)]
    pub effort: Option<String>,
    #[serde(default)]
    pub debt: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub creation_date: String,
    #[serde(default)]
    pub update_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
}

/// Paging block of a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page_index: usize,
    pub page_size: usize,
    pub total: usize,
}

/// One page of `/api/issues/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<Issue>,
    pub paging: Paging,
}

/// Query for one page of `/api/issues/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub component_keys: String,
    pub organization: Option<String>,
    /// `ps`
    pub page_size: usize,
    /// `p`, 1-indexed.
    pub page: usize,
    /// Server-side status restriction; `None` sends no `statuses` parameter.
    pub statuses: Option<Vec<Status>>,
}

impl SearchRequest {
    /// Query parameters in the order SonarQube documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("componentKeys", self.component_keys.clone())];
        if let Some(org) = &self.organization {
            pairs.push(("organization", org.clone()));
        }
        pairs.push(("ps", self.page_size.to_string()));
        pairs.push(("p", self.page.to_string()));
        if let Some(statuses) = &self.statuses {
            let joined = statuses
                .iter()
                .map(Status::as_str)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("statuses", joined));
        }
        pairs
    }
}

/// Project metadata from `/api/projects/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProjectSearchResponse {
    #[serde(default)]
    pub components: Vec<ProjectInfo>,
}
