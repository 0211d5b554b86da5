//! sonarqube-exporter CLI - export SonarQube issues to HTML reports.

use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Password};

use sonarqube_exporter::cli::{Cli, Command, ExportArgs, SetupArgs, ValidateArgs};
use sonarqube_exporter::config::{Config, SonarQubeConfig};
use sonarqube_exporter::core::logging;
use sonarqube_exporter::core::progress::FetchProgress;
use sonarqube_exporter::export::ExportSession;
use sonarqube_exporter::report::ExportResult;
use sonarqube_exporter::sonar::{
    lookup_project, validate_connection, FetchOptions, IssueType, SonarClient,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Export(args) => run_export(&args),
        Command::Validate(args) => run_validate(&args),
        Command::Setup(args) => run_setup(&args),
    }
}

fn run_export(args: &ExportArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args.to_overrides())?;
    logging::init(&config.logging, args.verbose)?;

    tracing::info!("Starting SonarQube issues export...");
    tracing::debug!(
        "Exporting project {} from {} to {}",
        config.sonarqube.project_key,
        config.sonarqube.url,
        config.export.output_file().display()
    );

    let client = SonarClient::new(&config.sonarqube)?;
    let session = ExportSession::new(&client, &config);

    tracing::info!("Validating SonarQube connection...");
    let project = session.connect()?;

    tracing::info!("Fetching issues from SonarQube...");
    let progress = FetchProgress::new();
    let options = FetchOptions::from_export_config(&config.export)
        .with_progress(|current, total| progress.update(current, total));
    let issues = session.fetch(&options)?;
    progress.finish("done");

    if issues.is_empty() {
        tracing::warn!("No issues found. Check your project key or run a new analysis.");
        return Ok(());
    }

    tracing::info!("Generating HTML report...");
    let result = session.write(&issues, project.as_ref())?;
    if !result.success {
        bail!(
            "Failed to generate report: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &ExportResult) {
    println!("{}", "Report generated successfully!".green().bold());
    println!("  File:            {}", result.output_path.display());
    println!("  Issues:          {}", result.issues_count);
    if let Some(metrics) = &result.metrics {
        println!(
            "  Critical:        {}",
            metrics.critical_count().to_string().red()
        );
        println!("  Bugs:            {}", metrics.type_count(IssueType::Bug));
        println!(
            "  Vulnerabilities: {}",
            metrics.type_count(IssueType::Vulnerability)
        );
    }
}

fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args.to_overrides())?;
    logging::init(&config.logging, args.verbose)?;

    tracing::info!("Testing SonarQube connection...");
    let client = SonarClient::new(&config.sonarqube)?;
    if !validate_connection(&client) {
        bail!("SonarQube connection failed");
    }
    println!("{} SonarQube connection successful", "✓".green());

    match lookup_project(&client, &config.sonarqube) {
        Some(project) => println!(
            "{} Project found: {} ({})",
            "✓".green(),
            project.name,
            project.key
        ),
        None => println!("{} Project not found or no access", "!".yellow()),
    }
    Ok(())
}

fn run_setup(args: &SetupArgs) -> Result<()> {
    let connection = if args.is_complete() {
        SonarQubeConfig {
            url: args.connection.url.clone().unwrap_or_default(),
            token: args.connection.token.clone().unwrap_or_default(),
            project_key: args.connection.project.clone().unwrap_or_default(),
            organization: args.connection.organization.clone(),
        }
    } else {
        prompt_connection(args)?
    };

    let path = Config::setup_path(args.global)?;
    let content = Config::for_connection(connection).to_json_pretty()?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Configuration saved to: {}",
        "✓".green(),
        path.display()
    );
    println!("\nYou can now run:");
    println!("  sonarqube-exporter export");
    println!("  sonarqube-exporter validate");
    Ok(())
}

/// Ask for every connection value not given on the command line.
fn prompt_connection(args: &SetupArgs) -> Result<SonarQubeConfig> {
    let theme = ColorfulTheme::default();
    eprintln!();
    eprintln!("{}", "SonarQube Issues Exporter Setup".bold().cyan());
    eprintln!("This will help you create a configuration file.");
    eprintln!();

    let url = match &args.connection.url {
        Some(url) => url.clone(),
        None => Input::<String>::with_theme(&theme)
            .with_prompt("SonarQube Server URL (e.g., https://sonarcloud.io)")
            .default("http://localhost:9000".to_string())
            .interact_text()
            .context("Failed to read server URL")?,
    };
    let token = match &args.connection.token {
        Some(token) => token.clone(),
        None => Password::with_theme(&theme)
            .with_prompt("SonarQube Token")
            .interact()
            .context("Failed to read token")?,
    };
    let project_key = match &args.connection.project {
        Some(project) => project.clone(),
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Project Key")
            .interact_text()
            .context("Failed to read project key")?,
    };
    let organization = match &args.connection.organization {
        Some(org) => org.clone(),
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Organization (optional, for SonarCloud)")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read organization")?,
    };

    Ok(SonarQubeConfig {
        url: url.trim().to_string(),
        token: token.trim().to_string(),
        project_key: project_key.trim().to_string(),
        organization: Some(organization.trim().to_string()).filter(|o| !o.is_empty()),
    })
}
