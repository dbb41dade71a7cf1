//! DMS configuration

use serde::{Deserialize, Serialize};

/// Zone classification strategy used once calibration completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStrategyKind {
    /// Road polygon plus nearest fixed zone within tolerance
    #[default]
    Geometric,
    /// Nearest-neighbour vote over calibration feature vectors
    Knn,
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Neighbourhood size of the adaptive iris threshold (odd, pixels)
    pub threshold_block_size: u32,
    
    /// Constant subtracted from the local mean before thresholding
    pub threshold_offset: i16,
    
    /// EAR below which an eye counts as closed
    pub ear_closed_threshold: f64,
    
    /// Reference head-to-screen distance used during calibration
    pub standard_screen_distance: f64,
    
    /// Max distance (screen pixels) to snap a gaze point to a fixed zone
    pub zone_tolerance_px: f64,
    
    /// Zone classification strategy
    pub zone_strategy: ZoneStrategyKind,
    
    /// Neighbours consulted by the KNN strategy
    pub knn_neighbors: usize,
    
    /// Accepted outer-eye-corner distance during positioning (exclusive, pixels)
    pub min_eye_distance: f64,
    pub max_eye_distance: f64,
    
    /// Accepted jaw width during positioning (exclusive, pixels)
    pub min_face_width: i32,
    pub max_face_width: i32,
    
    /// How long a good position must be held before calibration starts
    pub position_hold_secs: f64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            threshold_block_size: 11,
            threshold_offset: 2,
            ear_closed_threshold: 0.2,
            standard_screen_distance: 50.0,
            zone_tolerance_px: 45.0,
            zone_strategy: ZoneStrategyKind::Geometric,
            knn_neighbors: 3,
            min_eye_distance: 40.0,
            max_eye_distance: 100.0,
            min_face_width: 100,
            max_face_width: 300,
            position_hold_secs: 5.0,
        }
    }
}

impl DmsConfig {
    /// Create strict config (tighter zones, earlier closed-eye detection)
    pub fn strict() -> Self {
        Self {
            ear_closed_threshold: 0.25,
            zone_tolerance_px: 30.0,
            ..Default::default()
        }
    }

    /// Create lenient config (wider zones, later closed-eye detection)
    pub fn lenient() -> Self {
        Self {
            ear_closed_threshold: 0.15,
            zone_tolerance_px: 60.0,
            ..Default::default()
        }
    }
}
