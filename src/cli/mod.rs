//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    ConfigOverrides, ExportOverrides, LogLevel, LoggingOverrides, SonarQubeOverrides,
};

/// Export SonarQube issues to HTML reports.
#[derive(Parser)]
#[command(name = "sonarqube-exporter")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export SonarQube issues to an HTML report
    Export(ExportArgs),

    /// Validate SonarQube connection and configuration
    Validate(ValidateArgs),

    /// Create a configuration file
    Setup(SetupArgs),
}

/// Connection flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// SonarQube server URL
    #[arg(long)]
    pub url: Option<String>,

    /// SonarQube authentication token
    #[arg(long)]
    pub token: Option<String>,

    /// SonarQube project key
    #[arg(long)]
    pub project: Option<String>,

    /// SonarQube organization (for SonarCloud)
    #[arg(long)]
    pub organization: Option<String>,
}

impl ConnectionArgs {
    pub fn to_overrides(&self) -> SonarQubeOverrides {
        SonarQubeOverrides {
            url: self.url.clone(),
            token: self.token.clone(),
            project_key: self.project.clone(),
            organization: self.organization.clone(),
        }
    }
}

#[derive(Args)]
pub struct ExportArgs {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output directory path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output filename
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Template: "default" (classic table view) or "enhanced" (interactive dashboard)
    #[arg(long)]
    pub template: Option<String>,

    /// Directory searched for <template>.html before the built-in templates
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Maximum number of issues to fetch
    #[arg(long)]
    pub max_issues: Option<i64>,

    /// Include resolved issues in the report
    #[arg(long)]
    pub include_resolved: bool,

    /// Comma-separated list of statuses to exclude
    #[arg(long, value_delimiter = ',')]
    pub exclude_statuses: Option<Vec<String>>,

    /// Minify the generated HTML
    #[arg(long)]
    pub minify: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ExportArgs {
    /// Overrides for every flag that was actually given.
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            sonarqube: self.connection.to_overrides(),
            export: ExportOverrides {
                output_path: self.output.clone(),
                filename: self.filename.clone(),
                exclude_statuses: self.exclude_statuses.as_ref().map(|statuses| {
                    statuses
                        .iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                }),
                include_resolved_issues: self.include_resolved.then_some(true),
                max_issues: self.max_issues,
                template: self.template.clone(),
                template_dir: self.template_dir.clone(),
                minify: self.minify.then_some(true),
            },
            logging: LoggingOverrides {
                level: self.verbose.then_some(LogLevel::Debug),
                file: None,
            },
        }
    }
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ValidateArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            sonarqube: self.connection.to_overrides(),
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Args)]
pub struct SetupArgs {
    /// Write the configuration to the home directory
    #[arg(long)]
    pub global: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl SetupArgs {
    /// True when every required connection value was given as a flag.
    pub fn is_complete(&self) -> bool {
        self.connection.url.is_some()
            && self.connection.token.is_some()
            && self.connection.project.is_some()
    }
}
