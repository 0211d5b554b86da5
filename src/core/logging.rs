//! Tracing subscriber setup driven by the `logging` config section.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::{Error, Result};
use crate::config::{LogLevel, LoggingConfig};

/// Level directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &LoggingConfig, verbose: bool) -> &'static str {
    if verbose {
        LogLevel::Debug.as_str()
    } else {
        config.level.as_str()
    }
}

/// Install the global subscriber: stderr always, plus the log file if configured.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let directive = default_directive(config, verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let file_layer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| Error::config(format!("failed to initialise logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_config() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            file: None,
        };
        assert_eq!(default_directive(&config, false), "warn");
    }

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig::default();
        assert_eq!(default_directive(&config, true), "debug");
    }
}
