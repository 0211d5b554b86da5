//! Error types for the sonarqube-exporter library.

use thiserror::Error;

/// Result type alias using the exporter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Hints appended to configuration validation failures.
const VALIDATION_HELP: &str = "\
To fix this, you can:
  1. Set SONARQUBE_URL, SONARQUBE_TOKEN and SONARQUBE_PROJECT_KEY in the environment
  2. Create a .sonarqube-exporter.json file in the current directory
  3. Pass --url, --token and --project on the command line
  4. Run `sonarqube-exporter setup` for guided configuration";

/// Errors that can occur while exporting SonarQube issues.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more configuration rules were violated.
    #[error(
        "Configuration validation failed:\n{}\n\n{}",
        format_errors(.errors),
        VALIDATION_HELP
    )]
    Validation { errors: Vec<String> },

    /// The SonarQube server could not be reached.
    #[error("Failed to connect to SonarQube: {0}")]
    Connection(String),

    /// HTTP 401 from the SonarQube API.
    #[error("Authentication failed (401 Unauthorized)")]
    Unauthorized,

    /// HTTP 403 from the SonarQube API.
    #[error("Access forbidden (403 Forbidden)")]
    Forbidden,

    /// HTTP 404 from the SonarQube API.
    #[error("Project not found (404 Not Found): {project_key}")]
    ProjectNotFound { project_key: String },

    /// Any other non-success HTTP status.
    #[error("API request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (DNS, TLS, timeout, malformed body).
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Named report template does not exist.
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(String),
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl Error {
    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Whether this error came from the SonarQube API boundary.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::Forbidden
                | Self::ProjectNotFound { .. }
                | Self::Http { .. }
                | Self::Network(_)
        )
    }
}

fn format_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
