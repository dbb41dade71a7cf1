//! Alerting System
//!
//! Watches for frames without a usable face and escalates from a visual
//! warning to an audible alert.

mod monitor;
mod sink;

pub use monitor::{AlertConfig, DistractionMonitor, DistractionState, DistractionStatus, DriverPresence};
pub use sink::{AlertSink, LoggingAlertSink};

use std::path::PathBuf;
use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert sound not found: {0}")]
    SoundNotFound(PathBuf),

    #[error("Playback failed: {0}")]
    Playback(String),
}
