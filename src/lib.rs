//! SonarQube issues exporter - fetch project issues and render HTML reports.
//!
//! Issues are pulled page by page from the SonarQube Web API, reduced to
//! display records and per-dimension counts, and written as a single
//! self-contained HTML file.
//!
//! # Example
//!
//! ```no_run
//! use sonarqube_exporter::config::{Config, ConfigOverrides};
//! use sonarqube_exporter::export::export_issues;
//!
//! let config = Config::load(None, &ConfigOverrides::default()).unwrap();
//! let result = export_issues(&config).unwrap();
//! println!("Wrote {} issues to {}", result.issues_count, result.output_path.display());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod report;
pub mod sonar;

pub use config::Config;
pub use core::{Error, Result};
pub use export::export_issues;
