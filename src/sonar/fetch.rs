//! Paginated issue retrieval.

use super::client::SonarApi;
use super::types::{Issue, SearchRequest, Status};
use crate::config::{ExportConfig, SonarQubeConfig};
use crate::core::{Error, Result};

/// Largest page SonarQube serves from `/api/issues/search`.
pub const DEFAULT_PAGE_SIZE: usize = 500;

pub const DEFAULT_MAX_ISSUES: usize = 10_000;

/// Knobs for [`fetch_all_issues`].
pub struct FetchOptions<'a> {
    pub page_size: usize,
    pub max_issues: usize,
    /// Statuses dropped client-side after each page arrives.
    pub exclude_statuses: Vec<String>,
    /// When false only OPEN, CONFIRMED and REOPENED are requested.
    pub include_resolved_issues: bool,
    /// Called after every page with `(fetched, min(total, max_issues))`.
    pub on_progress: Option<Box<dyn Fn(usize, usize) + 'a>>,
}

impl Default for FetchOptions<'_> {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_issues: DEFAULT_MAX_ISSUES,
            exclude_statuses: vec![Status::Closed.as_str().to_string()],
            include_resolved_issues: false,
            on_progress: None,
        }
    }
}

impl<'a> FetchOptions<'a> {
    /// Options taken from the `export` config section.
    pub fn from_export_config(config: &ExportConfig) -> Self {
        Self {
            max_issues: config.max_issues_limit(),
            exclude_statuses: config.exclude_statuses.clone(),
            include_resolved_issues: config.include_resolved_issues,
            ..Self::default()
        }
    }

    /// Set a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + 'a,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    fn is_excluded(&self, issue: &Issue) -> bool {
        let status = issue.status.as_str();
        self.exclude_statuses.iter().any(|s| s == status)
    }
}

/// Fetch every matching issue for the configured project, page by page.
///
/// Stops once `max_issues` issues are kept, the server reports no more
/// pages, or a page comes back empty. Any page failure aborts the fetch.
pub fn fetch_all_issues<A: SonarApi + ?Sized>(
    api: &A,
    connection: &SonarQubeConfig,
    options: &FetchOptions<'_>,
) -> Result<Vec<Issue>> {
    if options.max_issues == 0 {
        return Err(Error::InvalidArgument(
            "max issues must be a positive number".to_string(),
        ));
    }
    if options.page_size == 0 {
        return Err(Error::InvalidArgument(
            "page size must be a positive number".to_string(),
        ));
    }

    let statuses = (!options.include_resolved_issues).then(|| Status::UNRESOLVED.to_vec());
    let mut issues: Vec<Issue> = Vec::new();
    let mut page = 1;

    tracing::info!(
        "Starting to fetch issues for project: {}",
        connection.project_key
    );

    while issues.len() < options.max_issues {
        let remaining = options.max_issues - issues.len();
        let request = SearchRequest {
            component_keys: connection.project_key.clone(),
            organization: connection.organization.clone(),
            page_size: options.page_size.min(remaining),
            page,
            statuses: statuses.clone(),
        };

        let response = api.search_issues(&request).inspect_err(|e| {
            tracing::error!("Failed to fetch issues on page {page}: {e}");
        })?;

        let total = response.paging.total;
        let received = response.issues.len();
        let before = issues.len();
        issues.extend(
            response
                .issues
                .into_iter()
                .filter(|issue| !options.is_excluded(issue))
                .take(remaining),
        );

        tracing::debug!(
            "Fetched page {page}: {} issues (total: {})",
            issues.len() - before,
            issues.len()
        );

        if let Some(callback) = &options.on_progress {
            callback(issues.len(), total.min(options.max_issues));
        }

        if page * options.page_size >= total || received == 0 {
            break;
        }
        page += 1;
    }

    tracing::info!("Successfully fetched {} issues", issues.len());
    Ok(issues)
}
