//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// One persisted gaze observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GazeRecord {
    /// Gaze mapped inside the road region
    ScreenPosition {
        timestamp: DateTime<Utc>,
        screen_x: i32,
        screen_y: i32,
    },
    /// Gaze on a named fixed zone
    FixedPoint {
        timestamp: DateTime<Utc>,
        label: String,
    },
}

impl GazeRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GazeRecord::ScreenPosition { timestamp, .. } | GazeRecord::FixedPoint { timestamp, .. } => *timestamp,
        }
    }
}

/// Repository for gaze records (in-memory, bounded)
pub struct Repository {
    records: Mutex<VecDeque<GazeRecord>>,
    /// Oldest records are dropped beyond this count
    max_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_retention(100_000) // ~55 minutes at 30Hz
    }

    pub fn with_retention(max_records: usize) -> Self {
        info!("Creating in-memory gaze repository (retention: {})", max_records);
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records.min(10_000))),
            max_records: max_records.max(1),
        }
    }

    /// Insert a gaze record
    pub fn insert(&self, record: GazeRecord) -> Result<(), StorageError> {
        let mut records = self.records.lock().map_err(|e| StorageError::LockError(e.to_string()))?;

        // Enforce retention
        while records.len() >= self.max_records {
            records.pop_front();
        }

        debug!("Stored gaze record: {:?}", record);
        records.push_back(record);
        Ok(())
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<GazeRecord>, StorageError> {
        let records = self.records.lock().map_err(|e| StorageError::LockError(e.to_string()))?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    /// Records at or after `since`, oldest first
    pub fn records_since(&self, since: DateTime<Utc>) -> Result<Vec<GazeRecord>, StorageError> {
        let records = self.records.lock().map_err(|e| StorageError::LockError(e.to_string()))?;
        Ok(records.iter().filter(|r| r.timestamp() >= since).cloned().collect())
    }

    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
