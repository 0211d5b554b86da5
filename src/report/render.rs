//! HTML report rendering using minijinja templating.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use minijinja::{context, AutoEscape, Environment, Value};
use serde::Serialize;

use super::metrics::ReportMetrics;
use super::transform::{escape_html, format_date, process_issues, DisplayIssue};
use crate::config::Config;
use crate::core::{Error, Result};
use crate::sonar::Issue;

const DEFAULT_TEMPLATE: &str = include_str!("templates/default.html");
const ENHANCED_TEMPLATE: &str = include_str!("templates/enhanced.html");

/// Names of the templates compiled into the binary.
pub const BUILTIN_TEMPLATES: [&str; 2] = ["default", "enhanced"];

fn builtin_template(name: &str) -> Option<&'static str> {
    match name {
        "default" => Some(DEFAULT_TEMPLATE),
        "enhanced" => Some(ENHANCED_TEMPLATE),
        _ => None,
    }
}

/// Renderer handles HTML report generation.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Create a renderer. `<template_dir>/<name>.html` shadows the built-in `name`.
    pub fn new(template_dir: Option<&Path>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        env.add_filter("escape_html", |s: &str| Value::from_safe_string(escape_html(s)));
        env.add_filter("format_date", |s: &str| format_date(s));
        env.add_filter("severity_class", severity_class);
        env.add_filter("percent", percent);
        env.add_filter("tojson", tojson_filter);
        env.add_function("percent", percent);

        let dir = template_dir.map(Path::to_path_buf);
        env.set_loader(move |name| load_template(dir.as_deref(), name));

        Self { env }
    }

    /// Render the named template.
    pub fn render(&self, name: &str, data: &ReportData) -> Result<String> {
        let tmpl = self.env.get_template(name).map_err(|e| match e.kind() {
            minijinja::ErrorKind::TemplateNotFound => Error::TemplateNotFound {
                name: name.to_string(),
            },
            _ => Error::from(e),
        })?;

        let rendered = tmpl.render(context! {
            issues => &data.issues,
            metrics => &data.metrics,
            metadata => &data.metadata,
            severities => crate::sonar::Severity::ALL.map(|s| s.as_str()),
        })?;
        Ok(rendered)
    }
}

fn load_template(
    dir: Option<&Path>,
    name: &str,
) -> std::result::Result<Option<String>, minijinja::Error> {
    if let Some(dir) = dir {
        let path = dir.join(format!("{name}.html"));
        match fs::read_to_string(&path) {
            Ok(source) => {
                tracing::debug!("Using template from {}", path.display());
                return Ok(Some(source));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(minijinja::Error::new(
                    minijinja::ErrorKind::InvalidOperation,
                    format!("failed to read template {}", path.display()),
                )
                .with_source(e));
            }
        }
    }
    Ok(builtin_template(name).map(str::to_string))
}

/// Filters applied during the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    pub excluded_statuses: Vec<String>,
    pub include_resolved_issues: bool,
}

/// Report header information.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: String,
    pub project_key: String,
    pub project_name: Option<String>,
    pub sonar_qube_url: String,
    pub total_issues: usize,
    pub report_version: String,
    pub filters: ReportFilters,
}

impl ReportMetadata {
    pub fn new(options: &ExportOptions, total_issues: usize) -> Self {
        Self {
            generated_at: format_date(&Local::now()),
            project_key: options.project_key.clone(),
            project_name: options.project_name.clone(),
            sonar_qube_url: options.sonarqube_url.clone(),
            total_issues,
            report_version: env!("CARGO_PKG_VERSION").to_string(),
            filters: ReportFilters {
                excluded_statuses: options.exclude_statuses.clone(),
                include_resolved_issues: options.include_resolved_issues,
            },
        }
    }
}

/// Everything a template sees.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub issues: Vec<DisplayIssue>,
    pub metrics: ReportMetrics,
    pub metadata: ReportMetadata,
}

/// Where and how to write the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub output_path: PathBuf,
    pub filename: String,
    pub template: String,
    pub template_dir: Option<PathBuf>,
    pub minify: bool,
    pub project_key: String,
    pub project_name: Option<String>,
    pub sonarqube_url: String,
    pub exclude_statuses: Vec<String>,
    pub include_resolved_issues: bool,
}

impl ExportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_path: config.export.output_path.clone(),
            filename: config.export.filename.clone(),
            template: config.export.template.clone(),
            template_dir: config.export.template_dir.clone(),
            minify: config.export.minify,
            project_key: config.sonarqube.project_key.clone(),
            project_name: None,
            sonarqube_url: config.sonarqube.url.clone(),
            exclude_statuses: config.export.exclude_statuses.clone(),
            include_resolved_issues: config.export.include_resolved_issues,
        }
    }

    pub fn output_file(&self) -> PathBuf {
        self.output_path.join(&self.filename)
    }
}

/// Outcome of one export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    pub output_path: PathBuf,
    pub issues_count: usize,
    pub metrics: Option<ReportMetrics>,
    pub error: Option<String>,
}

/// Writes issues to a self-contained HTML file.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExporter;

impl HtmlExporter {
    pub fn new() -> Self {
        Self
    }

    /// Render `issues` and write the report.
    ///
    /// Template problems produce an unsuccessful [`ExportResult`]; filesystem
    /// failures are returned as errors.
    pub fn export(&self, issues: &[Issue], options: &ExportOptions) -> Result<ExportResult> {
        let output_file = options.output_file();
        tracing::info!("Starting HTML export for {} issues", issues.len());

        let display = process_issues(issues);
        let metrics = ReportMetrics::from_issues(&display);
        let data = ReportData {
            issues: display,
            metrics: metrics.clone(),
            metadata: ReportMetadata::new(options, issues.len()),
        };

        let renderer = Renderer::new(options.template_dir.as_deref());
        let html = match renderer.render(&options.template, &data) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to export HTML report: {e}");
                return Ok(ExportResult {
                    success: false,
                    output_path: output_file,
                    issues_count: issues.len(),
                    metrics: None,
                    error: Some(e.to_string()),
                });
            }
        };

        let bytes = if options.minify {
            minify_html_output(html.as_bytes())
        } else {
            html.into_bytes()
        };

        if !options.output_path.as_os_str().is_empty() {
            fs::create_dir_all(&options.output_path)?;
        }
        fs::write(&output_file, bytes)?;

        tracing::info!("HTML report exported successfully to: {}", output_file.display());
        Ok(ExportResult {
            success: true,
            output_path: output_file,
            issues_count: issues.len(),
            metrics: Some(metrics),
            error: None,
        })
    }
}

/// CSS class for a severity badge.
fn severity_class(severity: &str) -> &'static str {
    match severity {
        "BLOCKER" => "blocker",
        "CRITICAL" => "critical",
        "MAJOR" => "major",
        "MINOR" => "minor",
        "INFO" => "info",
        _ => "unknown",
    }
}

fn percent(a: usize, b: usize) -> f64 {
    if b == 0 {
        0.0
    } else {
        (a as f64) / (b as f64) * 100.0
    }
}

/// JSON for embedding in a `<script>` block.
fn tojson_filter(value: Value) -> Value {
    let json = serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string());
    Value::from_safe_string(json.replace('<', "\\u003c"))
}

fn minify_html_output(input: &[u8]) -> Vec<u8> {
    let cfg = minify_html::Cfg {
        minify_js: true,
        minify_css: true,
        ..Default::default()
    };
    minify_html::minify(input, &cfg)
}
