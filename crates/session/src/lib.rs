//! Driver Gaze Monitoring Session
//!
//! Owns the whole pipeline context for one driving session: the camera,
//! the gaze tracker, the calibration, the engagement scorer and the
//! distraction monitor.

pub mod config;
mod session;

pub use config::MonitorConfig;
pub use session::{FrameReport, Session, SessionSummary};

use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Camera error: {0}")]
    Camera(#[from] camera_capture::CameraError),

    #[error("DMS error: {0}")]
    Dms(#[from] dms::DmsError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Camera stopped delivering frames")]
    CameraEnded,

    #[error("Calibration cancelled by operator")]
    CalibrationCancelled,
}

/// Initialize logging at the given level ("trace" .. "error").
///
/// Unknown levels fall back to info. Only the first call installs a
/// subscriber.
pub fn init_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Tracing subscriber already installed");
    }
}
