//! Core types shared by the exporter: errors, logging and progress reporting.

mod error;
pub mod logging;
pub mod progress;

pub use error::{Error, Result};
