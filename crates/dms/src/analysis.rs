//! Per-frame analysis results

use serde::{Deserialize, Serialize};

use crate::gaze::GazeSample;
use crate::landmarks::Landmarks;

/// Everything the tracker extracted from one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Capture timestamp of the frame (nanoseconds)
    pub timestamp_ns: u64,
    
    /// Number of faces the detector reported
    pub faces_detected: usize,
    
    /// Landmarks of every detected face, in detector order
    pub landmarks: Vec<Landmarks>,
    
    /// Samples of faces where both irises were located
    pub samples: Vec<GazeSample>,
}

impl FrameAnalysis {
    /// At least one face produced a valid sample
    pub fn has_sample(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Sample of the first face that produced one
    pub fn primary_sample(&self) -> Option<&GazeSample> {
        self.samples.first()
    }

    /// Landmarks of the first detected face
    pub fn primary_landmarks(&self) -> Option<&Landmarks> {
        self.landmarks.first()
    }
}
