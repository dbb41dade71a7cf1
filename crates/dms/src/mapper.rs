//! Screen-space mapping of live gaze
//!
//! First-order proportional extrapolation: the iris-minus-eye-center vector
//! is stretched by the distance-compensated head-to-screen distance and added
//! to the iris position. This is a linear approximation, not a homography,
//! and is only accurate near the calibrated head pose and distance.

use crate::calibration::{CalibrationModel, DistanceBaseline};
use crate::gaze::EyeObservation;
use crate::geometry::Position;
use crate::DmsError;

/// `iris + (iris - eye_center) * distance`
pub fn map_to_screen(iris: Position, eye_center: Position, distance: f64) -> Position {
    let vector_x = iris.x - eye_center.x;
    let vector_y = iris.y - eye_center.y;
    Position::new(iris.x + vector_x * distance, iris.y + vector_y * distance)
}

/// Maps eye observations to screen coordinates using a calibration baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMapper {
    baseline: DistanceBaseline,
}

impl ScreenMapper {
    /// Build from a completed calibration; refuses to run without one
    pub fn new(model: Option<&CalibrationModel>) -> Result<Self, DmsError> {
        let model = model.ok_or(DmsError::NotCalibrated)?;
        Ok(Self::from_baseline(model.baseline))
    }

    pub fn from_baseline(baseline: DistanceBaseline) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> DistanceBaseline {
        self.baseline
    }

    /// Screen position the driver is looking at
    pub fn map(&self, observation: &EyeObservation) -> Position {
        let distance = self.baseline.adjusted_distance(observation.center_distance());
        map_to_screen(observation.avg_iris(), observation.avg_center(), distance)
    }
}
