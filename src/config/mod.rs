//! Configuration loading and management.
//!
//! Settings are merged, in increasing precedence, from built-in defaults,
//! environment variables (optionally seeded from a `.env` file), the first
//! config file found in the search list, and explicit overrides (usually CLI
//! flags).

use std::env;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Config file name looked up in the working and home directories.
pub const CONFIG_FILE_NAME: &str = ".sonarqube-exporter.json";

/// Alternate, non-hidden config file name in the working directory.
pub const ALT_CONFIG_FILE_NAME: &str = "sonarqube-exporter.config.json";

/// Dotenv file read from the working directory before the environment layer.
pub const DOTENV_FILE_NAME: &str = ".env";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SonarQube connection settings.
    pub sonarqube: SonarQubeConfig,
    /// Export settings.
    pub export: ExportConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load, merge and validate configuration.
    ///
    /// Every violated rule is reported at once in [`Error::Validation`].
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let config = Self::load_unvalidated(config_path, overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and merge configuration without validating it.
    pub fn load_unvalidated(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Serialized::defaults(ConfigOverrides::from_env()?));

        if let Some(path) = find_config_file(config_path) {
            tracing::debug!("Loading configuration from {}", path.display());
            figment = figment.merge(Json::file_exact(path));
        }

        let config: Self = figment.merge(Serialized::defaults(overrides)).extract()?;
        Ok(config)
    }

    /// Check every field-level rule and collect all violations.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.sonarqube.url.trim().is_empty() {
            errors.push("SonarQube URL is required".to_string());
        }
        if self.sonarqube.token.trim().is_empty() {
            errors.push("SonarQube token is required".to_string());
        }
        if self.sonarqube.project_key.trim().is_empty() {
            errors.push("SonarQube project key is required".to_string());
        }
        if reqwest::Url::parse(&self.sonarqube.url).is_err() {
            errors.push("Invalid SonarQube URL format".to_string());
        }
        if self.export.max_issues <= 0 {
            errors.push("Max issues must be a positive number".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors })
        }
    }

    /// Build the config written by `setup` for the given connection.
    pub fn for_connection(sonarqube: SonarQubeConfig) -> Self {
        Self {
            sonarqube,
            ..Self::default()
        }
    }

    /// Pretty-printed JSON in the on-disk config file layout.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Where `setup` writes the config file.
    pub fn setup_path(global: bool) -> Result<PathBuf> {
        if global {
            let home = dirs::home_dir()
                .ok_or_else(|| Error::config("could not determine the home directory"))?;
            Ok(home.join(CONFIG_FILE_NAME))
        } else {
            Ok(PathBuf::from(CONFIG_FILE_NAME))
        }
    }
}

/// Return the first existing config file in the search list.
///
/// The explicit path, when given, is checked first; a missing explicit path is
/// skipped like any other candidate.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    candidates.push(PathBuf::from(ALT_CONFIG_FILE_NAME));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(CONFIG_FILE_NAME));
    }

    candidates.into_iter().find(|p| p.is_file())
}

/// SonarQube connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SonarQubeConfig {
    /// Server base URL.
    pub url: String,
    /// User token, sent as the basic-auth username.
    pub token: String,
    /// Project key whose issues are exported.
    pub project_key: String,
    /// Organization key (SonarCloud).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl Default for SonarQubeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9000".to_string(),
            token: String::new(),
            project_key: String::new(),
            organization: None,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Directory the report is written to.
    pub output_path: PathBuf,
    /// Report file name.
    pub filename: String,
    /// Issue statuses dropped after each page is fetched.
    pub exclude_statuses: Vec<String>,
    /// Disable the server-side open-status restriction.
    pub include_resolved_issues: bool,
    /// Upper bound on fetched issues. Signed so that bad values reach validation.
    pub max_issues: i64,
    /// Template name (`default`, `enhanced`, or a file in `template_dir`).
    pub template: String,
    /// Directory searched for `<template>.html` before the built-in templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    /// Minify the rendered HTML.
    pub minify: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./reports"),
            filename: "sonarqube-issues-report.html".to_string(),
            exclude_statuses: vec!["CLOSED".to_string()],
            include_resolved_issues: false,
            max_issues: 10_000,
            template: "default".to_string(),
            template_dir: None,
            minify: false,
        }
    }
}

impl ExportConfig {
    /// `max_issues` as a count; non-positive values map to zero.
    pub fn max_issues_limit(&self) -> usize {
        usize::try_from(self.max_issues).unwrap_or(0)
    }

    /// Full path of the report file.
    pub fn output_file(&self) -> PathBuf {
        self.output_path.join(&self.filename)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level emitted.
    pub level: LogLevel,
    /// Optional log file, written without ANSI colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug' or 'trace'"
            )),
        }
    }
}

/// Partial configuration layered over defaults and files.
///
/// Unset fields are not serialized, so they never clobber lower layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    pub sonarqube: SonarQubeOverrides,
    pub export: ExportOverrides,
    pub logging: LoggingOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarQubeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_statuses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_resolved_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_issues: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Load `.env` from the working directory into the process environment.
///
/// Variables that are already set win over the file. A missing file is fine.
pub fn load_dotenv() -> Result<()> {
    match dotenvy::from_path(DOTENV_FILE_NAME) {
        Ok(()) => {
            tracing::debug!("Loaded environment from {DOTENV_FILE_NAME}");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::config(format!(
            "Failed to load {DOTENV_FILE_NAME}: {e}"
        ))),
    }
}

impl ConfigOverrides {
    /// Read the environment-variable layer, seeding it from `.env` first.
    pub fn from_env() -> Result<Self> {
        load_dotenv()?;
        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        let max_issues = match var("EXPORT_MAX_ISSUES") {
            Some(v) => Some(v.trim().parse::<i64>().map_err(|_| {
                Error::config(format!("EXPORT_MAX_ISSUES must be an integer, got '{v}'"))
            })?),
            None => None,
        };
        let level = match var("LOG_LEVEL") {
            Some(v) => Some(v.parse::<LogLevel>().map_err(Error::Config)?),
            None => None,
        };

        Ok(Self {
            sonarqube: SonarQubeOverrides {
                url: var("SONARQUBE_URL"),
                token: var("SONARQUBE_TOKEN"),
                project_key: var("SONARQUBE_PROJECT_KEY"),
                organization: var("SONARQUBE_ORGANIZATION"),
            },
            export: ExportOverrides {
                output_path: var("EXPORT_OUTPUT_PATH").map(PathBuf::from),
                filename: var("EXPORT_FILENAME"),
                exclude_statuses: var("EXPORT_EXCLUDE_STATUSES").map(|v| split_list(&v)),
                include_resolved_issues: var("EXPORT_INCLUDE_RESOLVED").map(|v| v == "true"),
                max_issues,
                template: var("EXPORT_TEMPLATE"),
                template_dir: None,
                minify: None,
            },
            logging: LoggingOverrides {
                level,
                file: var("LOG_FILE").map(PathBuf::from),
            },
        })
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
