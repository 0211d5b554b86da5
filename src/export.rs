//! End-to-end export: connect, fetch, render.

use crate::config::Config;
use crate::core::{Error, Result};
use crate::report::{ExportOptions, ExportResult, HtmlExporter};
use crate::sonar::{
    fetch_all_issues, lookup_project, validate_connection, FetchOptions, Issue, ProjectInfo,
    SonarApi, SonarClient,
};

/// Export all matching issues for the configured project to HTML.
///
/// The report is written even when no issue matches.
pub fn export_issues(config: &Config) -> Result<ExportResult> {
    let client = SonarClient::new(&config.sonarqube)?;
    let session = ExportSession::new(&client, config);

    let project = session.connect()?;
    let issues = session.fetch(&FetchOptions::from_export_config(&config.export))?;
    session.write(&issues, project.as_ref())
}

/// The steps of an export against one SonarQube server.
pub struct ExportSession<'a, A: SonarApi + ?Sized> {
    api: &'a A,
    config: &'a Config,
}

impl<'a, A: SonarApi + ?Sized> ExportSession<'a, A> {
    pub fn new(api: &'a A, config: &'a Config) -> Self {
        Self { api, config }
    }

    /// Probe the server and look up the project.
    ///
    /// Fails with [`Error::Connection`] when the server is unreachable; a
    /// failed project lookup only yields `None`.
    pub fn connect(&self) -> Result<Option<ProjectInfo>> {
        if !validate_connection(self.api) {
            return Err(Error::connection(format!(
                "unable to reach {}",
                self.config.sonarqube.url
            )));
        }

        let project = lookup_project(self.api, &self.config.sonarqube);
        match &project {
            Some(info) => tracing::info!("Project: {} ({})", info.name, info.key),
            None => tracing::warn!(
                "Project '{}' not found in project search",
                self.config.sonarqube.project_key
            ),
        }
        Ok(project)
    }

    pub fn fetch(&self, options: &FetchOptions<'_>) -> Result<Vec<Issue>> {
        fetch_all_issues(self.api, &self.config.sonarqube, options)
    }

    /// Render `issues` with the configured export settings.
    pub fn write(&self, issues: &[Issue], project: Option<&ProjectInfo>) -> Result<ExportResult> {
        let mut options = ExportOptions::from_config(self.config);
        options.project_name = project.map(|p| p.name.clone());
        HtmlExporter::new().export(issues, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SonarQubeConfig;
    use crate::sonar::{Paging, SearchPage, SearchRequest};
    use std::cell::Cell;
    use tempfile::TempDir;

    struct StubApi {
        reachable: bool,
        issues: Vec<Issue>,
        searches: Cell<usize>,
    }

    impl SonarApi for StubApi {
        fn search_issues(&self, _request: &SearchRequest) -> Result<SearchPage> {
            self.searches.set(self.searches.get() + 1);
            Ok(SearchPage {
                issues: self.issues.clone(),
                paging: Paging {
                    page_index: 1,
                    page_size: 500,
                    total: self.issues.len(),
                },
            })
        }

        fn system_status(&self) -> Result<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(Error::Network("connection refused".to_string()))
            }
        }

        fn project_info(&self, key: &str, _: Option<&str>) -> Result<Option<ProjectInfo>> {
            Ok(Some(ProjectInfo {
                key: key.to_string(),
                name: "Demo Project".to_string(),
            }))
        }
    }

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::for_connection(SonarQubeConfig {
            url: "http://sonar.local".to_string(),
            token: "t".to_string(),
            project_key: "demo".to_string(),
            organization: None,
        });
        config.export.output_path = dir.path().to_path_buf();
        config
    }

    fn issue() -> Issue {
        serde_json::from_value(serde_json::json!({
            "key": "I1",
            "rule": "py:S1192",
            "severity": "MINOR",
            "component": "demo:pkg/mod.py",
            "status": "OPEN",
            "message": "Define a constant",
            "creationDate": "2024-01-15T10:30:00+0000",
            "type": "CODE_SMELL"
        }))
        .unwrap()
    }

    #[test]
    fn test_session_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let api = StubApi {
            reachable: true,
            issues: vec![issue()],
            searches: Cell::new(0),
        };
        let session = ExportSession::new(&api, &config);

        let project = session.connect().unwrap();
        let issues = session.fetch(&FetchOptions::default()).unwrap();
        let result = session.write(&issues, project.as_ref()).unwrap();

        assert!(result.success);
        assert_eq!(result.issues_count, 1);
        let html = std::fs::read_to_string(&result.output_path).unwrap();
        assert!(html.contains("Demo Project"));
        assert!(html.contains("mod.py"));
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let api = StubApi {
            reachable: false,
            issues: Vec::new(),
            searches: Cell::new(0),
        };

        let err = ExportSession::new(&api, &config).connect().unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(api.searches.get(), 0);
    }
}
