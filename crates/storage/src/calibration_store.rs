//! Calibration data files
//!
//! Feature rows and their labels are written as a single postcard blob so
//! that `(feature vector, label)` pairs round-trip exactly.

use std::fs;
use std::path::{Path, PathBuf};

use dms::{CalibrationDataset, CalibrationModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::StorageError;

/// Calibration files kept in one directory
pub struct CalibrationStore {
    dir: PathBuf,
}

impl CalibrationStore {
    const DATASET_FILE: &'static str = "calibration_dataset.bin";
    const MODEL_FILE: &'static str = "calibration_model.bin";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.dir.join(Self::DATASET_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(Self::MODEL_FILE)
    }

    pub fn save_dataset(&self, dataset: &CalibrationDataset) -> Result<(), StorageError> {
        dataset.validate().map_err(|e| StorageError::InvalidData(e.to_string()))?;
        write(&self.dataset_path(), dataset)?;
        info!("Saved {} calibration rows to {}", dataset.len(), self.dataset_path().display());
        Ok(())
    }

    pub fn load_dataset(&self) -> Result<CalibrationDataset, StorageError> {
        let dataset: CalibrationDataset = read(&self.dataset_path())?;
        dataset.validate().map_err(|e| StorageError::InvalidData(e.to_string()))?;
        Ok(dataset)
    }

    pub fn save_model(&self, model: &CalibrationModel) -> Result<(), StorageError> {
        write(&self.model_path(), model)?;
        info!("Saved calibration model to {}", self.model_path().display());
        Ok(())
    }

    /// Load a previously saved model; `None` when none was saved yet
    pub fn load_model(&self) -> Result<Option<CalibrationModel>, StorageError> {
        let path = self.model_path();
        if !path.exists() {
            return Ok(None);
        }
        read(&path).map(Some)
    }
}

fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = postcard::to_allocvec(value).map_err(|e| StorageError::SerializationError(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path)?;
    postcard::from_bytes(&bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
}
