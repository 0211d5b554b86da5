//! Issue counts per dimension.

use std::collections::BTreeMap;

use serde::Serialize;

use super::transform::DisplayIssue;
use crate::sonar::{IssueType, Severity};

/// Category → count for one dimension.
pub type Counts = BTreeMap<String, usize>;

/// Dimension name → counts.
pub type Metrics = BTreeMap<String, Counts>;

/// A named dimension and the function that puts an item in a category.
pub type Extractor<'a, T> = (&'a str, &'a dyn Fn(&T) -> String);

/// Count `items` along every dimension in `extractors`.
///
/// Each item adds exactly one to one category per dimension, so every
/// dimension sums to `items.len()`.
pub fn calculate_metrics<T>(items: &[T], extractors: &[Extractor<'_, T>]) -> Metrics {
    let mut metrics: Metrics = extractors
        .iter()
        .map(|(name, _)| (name.to_string(), Counts::new()))
        .collect();

    for item in items {
        for (name, extract) in extractors {
            if let Some(counts) = metrics.get_mut(*name) {
                *counts.entry(extract(item)).or_insert(0) += 1;
            }
        }
    }

    metrics
}

/// Aggregates shown in the report header and charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportMetrics {
    pub total: usize,
    pub severities: Counts,
    pub types: Counts,
    pub statuses: Counts,
    /// Keyed by extracted file name.
    pub components: Counts,
    pub rules: Counts,
}

impl ReportMetrics {
    pub fn from_issues(issues: &[DisplayIssue]) -> Self {
        let extractors: [Extractor<'_, DisplayIssue>; 5] = [
            ("severities", &|i: &DisplayIssue| i.severity.to_string()),
            ("types", &|i: &DisplayIssue| i.issue_type.to_string()),
            ("statuses", &|i: &DisplayIssue| i.status.to_string()),
            ("components", &|i: &DisplayIssue| i.file.clone()),
            ("rules", &|i: &DisplayIssue| i.rule.clone()),
        ];
        let mut metrics = calculate_metrics(issues, &extractors);
        let mut take = |name: &str| metrics.remove(name).unwrap_or_default();

        Self {
            total: issues.len(),
            severities: take("severities"),
            types: take("types"),
            statuses: take("statuses"),
            components: take("components"),
            rules: take("rules"),
        }
    }

    pub fn severity_count(&self, severity: Severity) -> usize {
        self.severities.get(severity.as_str()).copied().unwrap_or(0)
    }

    pub fn type_count(&self, issue_type: IssueType) -> usize {
        self.types.get(issue_type.as_str()).copied().unwrap_or(0)
    }

    /// BLOCKER plus CRITICAL.
    pub fn critical_count(&self) -> usize {
        self.severity_count(Severity::Blocker) + self.severity_count(Severity::Critical)
    }
}
