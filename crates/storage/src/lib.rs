//! Storage Layer
//!
//! Gaze records produced by the session and calibration data files.

mod calibration_store;
mod repository;

pub use calibration_store::CalibrationStore;
pub use repository::{GazeRecord, Repository};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Lock error: {0}")]
    LockError(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid calibration data: {0}")]
    InvalidData(String),
}
