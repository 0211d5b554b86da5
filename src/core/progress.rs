//! Progress reporting for the issue fetch using indicatif.
//!
//! On a terminal the fetch drives a progress bar; otherwise each page is
//! reported as a plain log line with a text bar.

use indicatif::{ProgressBar, ProgressStyle};

/// Style templates for progress bars.
pub mod styles {
    use super::*;

    /// Progress bar style for paginated issue fetching.
    pub fn fetch_progress() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} issues {msg}")
            .expect("valid template")
            .progress_chars("#>-")
    }
}

/// Check if stderr is a TTY (for deciding whether to show progress bars).
pub fn is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

/// Receives `(current, total)` updates from the fetch loop.
pub struct FetchProgress {
    bar: ProgressBar,
    interactive: bool,
}

impl FetchProgress {
    /// Progress bar on a TTY, log lines otherwise.
    pub fn new() -> Self {
        if is_tty() {
            let bar = ProgressBar::new(0);
            bar.set_style(styles::fetch_progress());
            Self {
                bar,
                interactive: true,
            }
        } else {
            Self::hidden()
        }
    }

    /// Reporter that only logs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            interactive: false,
        }
    }

    /// Record that `current` of `total` issues have been fetched.
    pub fn update(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        if !self.interactive {
            tracing::info!(
                "Progress: {} ({}%)",
                text_bar(current, total, 30),
                percentage(current, total)
            );
        }
    }

    /// Finish the progress bar with a completion message.
    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Current length.
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounded completion percentage; zero when `total` is zero.
pub fn percentage(current: usize, total: usize) -> u64 {
    if total == 0 {
        0
    } else {
        ((current as f64 / total as f64) * 100.0).round() as u64
    }
}

/// Fixed-width text bar, e.g. `[=====     ] 5/10`.
pub fn text_bar(current: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((current.min(total) * width) / total).min(width)
    };
    format!(
        "[{}{}] {}/{}",
        "=".repeat(filled),
        " ".repeat(width - filled),
        current,
        total
    )
}
