//! Camera Capture Library for the Driver Gaze Pipeline
//!
//! Provides the frame-source boundary of the pipeline:
//! - `VideoFrame` pixel buffers (BGR as delivered by cabin webcams)
//! - `FrameSource` trait mirroring open/read/close of a capture device
//! - `CameraHandle` which releases the source on every exit path
//! - `ImageSequenceSource` for replaying recorded frames

pub mod frame;
pub mod source;

pub use frame::{VideoFrame, PixelFormat};
pub use source::{CameraHandle, CameraOpener, FrameSource, ImageDirectoryCamera, ImageSequenceSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),
    
    #[error("Invalid format: {0}")]
    Format(String),
    
    #[error("Camera already closed")]
    Closed,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index (0 = first webcam)
    pub device_index: u32,
    /// Target frame rate of the processing loop
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            fps: 30,
        }
    }
}

impl CameraConfig {
    /// Interval between two frame reads at the target rate
    ///
    /// Never zero, even for rates above 1 MHz.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros((1_000_000 / u64::from(self.fps.max(1))).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_interval_at_30fps() {
        let config = CameraConfig::default();
        assert_eq!(config.frame_interval().as_micros(), 33_333);
    }

    #[test]
    fn test_zero_fps_does_not_divide_by_zero() {
        let config = CameraConfig { fps: 0, ..Default::default() };
        assert_eq!(config.frame_interval().as_secs(), 1);
    }

    #[test]
    fn test_absurd_fps_keeps_a_positive_interval() {
        let config = CameraConfig { fps: u32::MAX, ..Default::default() };
        assert_eq!(config.frame_interval().as_micros(), 1);
    }

    proptest! {
        #[test]
        fn frame_interval_is_positive_and_monotonic(fps in 0u32..=u32::MAX) {
            let slower = CameraConfig { fps: fps.saturating_sub(1), ..Default::default() };
            let config = CameraConfig { fps, ..Default::default() };
            prop_assert!(!config.frame_interval().is_zero());
            prop_assert!(config.frame_interval() <= slower.frame_interval());
        }
    }
}
