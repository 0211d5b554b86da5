//! Issue-to-display-record transformation.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use serde::{Serialize, Serializer};

use crate::sonar::{Issue, IssueType, Severity, Status};

/// Output format for report timestamps, e.g. `01/15/2024, 10:30:00 AM`.
pub const DATE_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// Escape text for HTML: `&`, `<`, `>`, `"` and `'`.
///
/// Ampersands go first so the entities introduced afterwards survive.
/// Applying it twice escapes those ampersands again.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// File name from a component key such as `my-project:src/main/Foo.java`.
pub fn extract_filename(component: &str) -> String {
    let path = match component.split_once(':') {
        Some((_, rest)) => rest,
        None => component,
    };
    let name = path.rsplit('/').next().unwrap_or_default();

    if !name.is_empty() {
        name.to_string()
    } else if !path.is_empty() {
        path.to_string()
    } else {
        component.to_string()
    }
}

/// A value [`format_date`] can render.
pub trait Timestamp {
    /// Parsed instant, or the raw text when it cannot be parsed.
    fn to_timestamp(&self) -> Result<DateTime<FixedOffset>, String>;
}

impl Timestamp for str {
    fn to_timestamp(&self) -> Result<DateTime<FixedOffset>, String> {
        DateTime::parse_from_str(self, "%Y-%m-%dT%H:%M:%S%z")
            .or_else(|_| DateTime::parse_from_rfc3339(self))
            .map_err(|_| self.to_string())
    }
}

impl Timestamp for String {
    fn to_timestamp(&self) -> Result<DateTime<FixedOffset>, String> {
        self.as_str().to_timestamp()
    }
}

impl<Tz: TimeZone> Timestamp for DateTime<Tz> {
    fn to_timestamp(&self) -> Result<DateTime<FixedOffset>, String> {
        Ok(self.fixed_offset())
    }
}

/// Format a timestamp in the local timezone.
pub fn format_date<T: Timestamp + ?Sized>(value: &T) -> String {
    format_date_in(value, &Local)
}

/// Format a timestamp in `tz`. Unparseable text is returned unchanged.
pub fn format_date_in<T, Tz>(value: &T, tz: &Tz) -> String
where
    T: Timestamp + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match value.to_timestamp() {
        Ok(instant) => instant.with_timezone(tz).format(DATE_FORMAT).to_string(),
        Err(raw) => raw,
    }
}

/// Issue line: the number, or `"N/A"` for file-level issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineValue {
    Number(u32),
    NotAvailable,
}

impl From<Option<u32>> for LineValue {
    fn from(line: Option<u32>) -> Self {
        line.map_or(Self::NotAvailable, Self::Number)
    }
}

impl fmt::Display for LineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for LineValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_u32(*n),
            Self::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Issue as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayIssue {
    pub key: String,
    pub file: String,
    pub line: LineValue,
    /// Already HTML-escaped.
    pub message: String,
    pub severity: Severity,
    pub status: Status,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub rule: String,
    pub component: String,
    pub creation_date: String,
    pub update_date: Option<String>,
    pub assignee: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub effort: Option<String>,
    pub debt: Option<String>,
}

/// Project one issue into its display form.
pub fn process_issue(issue: &Issue) -> DisplayIssue {
    DisplayIssue {
        key: issue.key.clone(),
        file: extract_filename(&issue.component),
        line: issue.line.into(),
        message: escape_html(&issue.message),
        severity: issue.severity,
        status: issue.status,
        issue_type: issue.issue_type,
        rule: issue.rule.clone(),
        component: issue.component.clone(),
        creation_date: format_date(issue.creation_date.as_str()),
        update_date: issue.update_date.as_deref().map(format_date),
        assignee: issue.assignee.clone(),
        author: issue.author.clone(),
        tags: issue.tags.clone(),
        effort: issue.effort.clone(),
        debt: issue.debt.clone(),
    }
}

pub fn process_issues(issues: &[Issue]) -> Vec<DisplayIssue> {
    issues.iter().map(process_issue).collect()
}
