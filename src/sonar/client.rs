//! SonarQube Web API client.
//!
//! [`SonarApi`] is the HTTP capability the fetch pipeline talks to;
//! [`SonarClient`] implements it over a blocking reqwest client.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{ProjectInfo, ProjectSearchResponse, SearchPage, SearchRequest};
use crate::config::SonarQubeConfig;
use crate::core::{Error, Result};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the exporter needs from a SonarQube server.
pub trait SonarApi {
    /// Fetch one page of `/api/issues/search`.
    fn search_issues(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// Probe `/api/system/status`; any success response means reachable.
    fn system_status(&self) -> Result<()>;

    /// Look up project metadata, `None` when the project is not visible.
    fn project_info(&self, project_key: &str, organization: Option<&str>)
        -> Result<Option<ProjectInfo>>;
}

/// Blocking HTTP client for one SonarQube server and project.
pub struct SonarClient {
    base_url: String,
    token: String,
    project_key: String,
    client: Client,
}

impl SonarClient {
    /// Create a client from connection settings.
    pub fn new(config: &SonarQubeConfig) -> Result<Self> {
        Url::parse(&config.url)
            .map_err(|e| Error::config(format!("invalid SonarQube URL '{}': {e}", config.url)))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sonarqube-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            project_key: config.project_key.clone(),
            client,
        })
    }

    /// Build an API URL, keeping any context path in the base URL.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::config(format!("invalid SonarQube URL: {e}")))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn send(&self, url: Url) -> Result<Response> {
        tracing::debug!("Making GET request to: {}", url.path());
        let response = self
            .client
            .get(url)
            .basic_auth(&self.token, Some(""))
            .send()
            .map_err(|e| {
                tracing::error!("API request failed: {e}");
                Error::Network(e.to_string())
            })?;
        self.check_status(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let path = url.path().to_string();
        self.send(url)?
            .json::<T>()
            .map_err(|e| Error::Network(format!("invalid response from {path}: {e}")))
    }

    /// Map non-success statuses to the exporter's error taxonomy.
    fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            401 => {
                tracing::error!("Authentication failed (401 Unauthorized)");
                tracing::error!("Possible causes:");
                tracing::error!("- Invalid or expired token");
                tracing::error!("- Insufficient permissions");
                tracing::error!("- Incorrect SonarQube URL");
                Err(Error::Unauthorized)
            }
            403 => {
                tracing::error!("Access forbidden (403 Forbidden)");
                tracing::error!("The token does not have sufficient permissions");
                Err(Error::Forbidden)
            }
            404 => {
                tracing::error!("Project not found (404 Not Found)");
                tracing::error!("Project key '{}' may be incorrect", self.project_key);
                Err(Error::ProjectNotFound {
                    project_key: self.project_key.clone(),
                })
            }
            code => {
                let body = response.text().unwrap_or_default();
                let message = api_error_message(&body);
                tracing::error!("API request failed: HTTP {code}: {message}");
                Err(Error::Http {
                    status: code,
                    message,
                })
            }
        }
    }
}

impl SonarApi for SonarClient {
    fn search_issues(&self, request: &SearchRequest) -> Result<SearchPage> {
        let url = self.endpoint("/api/issues/search", &request.query_pairs())?;
        self.get_json(url)
    }

    fn system_status(&self) -> Result<()> {
        let url = self.endpoint("/api/system/status", &[])?;
        self.send(url)?;
        Ok(())
    }

    fn project_info(
        &self,
        project_key: &str,
        organization: Option<&str>,
    ) -> Result<Option<ProjectInfo>> {
        let mut params = vec![("projects", project_key.to_string())];
        if let Some(org) = organization {
            params.push(("organization", org.to_string()));
        }
        let url = self.endpoint("/api/projects/search", &params)?;
        let response: ProjectSearchResponse = self.get_json(url)?;
        Ok(response.components.into_iter().next())
    }
}

/// Probe connectivity, logging instead of failing.
pub fn validate_connection<A: SonarApi + ?Sized>(api: &A) -> bool {
    match api.system_status() {
        Ok(()) => {
            tracing::info!("SonarQube connection validated successfully");
            true
        }
        Err(e) => {
            tracing::error!("Failed to validate SonarQube connection: {e}");
            false
        }
    }
}

/// Look up the project, logging and swallowing lookup failures.
pub fn lookup_project<A: SonarApi + ?Sized>(
    api: &A,
    connection: &SonarQubeConfig,
) -> Option<ProjectInfo> {
    match api.project_info(&connection.project_key, connection.organization.as_deref()) {
        Ok(info) => info,
        Err(e) => {
            tracing::error!("Failed to fetch project info: {e}");
            None
        }
    }
}

#[derive(Deserialize)]
struct ApiErrors {
    errors: Vec<ApiErrorItem>,
}

#[derive(Deserialize)]
struct ApiErrorItem {
    msg: String,
}

/// Extract `errors[].msg` from a SonarQube error body, else the raw body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrors>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .map(|e| e.msg)
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.chars().take(200).collect(),
    }
}
