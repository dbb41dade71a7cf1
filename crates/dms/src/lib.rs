//! Driver Monitoring System (DMS)
//!
//! Gaze estimation from a single cabin camera:
//! - Eye geometry from 68-point facial landmarks
//! - Iris localization by adaptive thresholding
//! - Eye aspect ratio (blink / closure)
//! - Gaze direction classification
//! - Calibration, screen mapping and zone classification

pub mod analysis;
pub mod blink;
pub mod calibration;
pub mod config;
pub mod gaze;
pub mod geometry;
pub mod iris;
pub mod knn;
pub mod landmarks;
pub mod mapper;
pub mod zone;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analysis::FrameAnalysis;
pub use calibration::{
    CalibrationDataset, CalibrationLabel, CalibrationModel, CalibrationPoint, CalibrationProcedure,
    CalibrationStage, CalibrationStep, DistanceBaseline, FixedZone, OperatorInput, PositionGate,
    RoadCorner,
};
pub use config::{DmsConfig, ZoneStrategyKind};
pub use gaze::{GazeFeatures, GazeSample, HorizontalGaze, VerticalGaze};
pub use geometry::{Point, Position};
pub use iris::IrisLocalizer;
pub use knn::KnnZoneClassifier;
pub use landmarks::{EyeRegion, FaceBbox, LandmarkSource, Landmarks};
pub use mapper::ScreenMapper;
pub use zone::{GeometricZoneClassifier, ZoneClassification, ZoneStrategy};

use camera_capture::frame::VideoFrame;
use image::GrayImage;
use thiserror::Error;
use tracing::{debug, trace};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Landmark detection failed: {0}")]
    Detector(String),
    
    #[error("Expected 68 landmarks, got {0}")]
    InvalidLandmarks(usize),
    
    #[error("No face detected")]
    NoFace,
    
    #[error("Calibration has not been completed")]
    NotCalibrated,

    #[error("Calibration error: {0}")]
    Calibration(String),
}

/// Build the zone strategy selected in the configuration
pub fn zone_strategy(
    config: &DmsConfig,
    model: Option<&CalibrationModel>,
) -> Result<Box<dyn ZoneStrategy>, DmsError> {
    let strategy: Box<dyn ZoneStrategy> = match config.zone_strategy {
        ZoneStrategyKind::Geometric => Box::new(GeometricZoneClassifier::new(model, config.zone_tolerance_px)?),
        ZoneStrategyKind::Knn => {
            let model = model.ok_or(DmsError::NotCalibrated)?;
            Box::new(KnnZoneClassifier::new(model.dataset(), config.knn_neighbors)?)
        }
    };
    Ok(strategy)
}

/// Per-frame gaze pipeline: landmarks, iris localization, EAR and direction
pub struct GazeTracker<L: LandmarkSource> {
    source: L,
    localizer: IrisLocalizer,
}

impl<L: LandmarkSource> GazeTracker<L> {
    /// Create a tracker around an external landmark source
    pub fn new(config: &DmsConfig, source: L) -> Self {
        Self {
            source,
            localizer: IrisLocalizer::new(config),
        }
    }

    /// Analyze a single camera frame
    pub fn analyze(&mut self, frame: &VideoFrame) -> Result<FrameAnalysis, DmsError> {
        let gray = frame.to_grayscale();
        self.analyze_gray(&gray, frame.timestamp_ns)
    }

    /// Analyze an already converted grayscale frame
    pub fn analyze_gray(&mut self, gray: &GrayImage, timestamp_ns: u64) -> Result<FrameAnalysis, DmsError> {
        let faces = self.source.detect_faces(gray)?;
        let mut analysis = FrameAnalysis {
            timestamp_ns,
            faces_detected: faces.len(),
            ..Default::default()
        };

        for face in &faces {
            let landmarks = self.source.predict_landmarks(gray, face)?;
            let left_eye = landmarks.left_eye();
            let right_eye = landmarks.right_eye();

            let left_iris = self.localizer.locate(gray, &left_eye);
            let right_iris = self.localizer.locate(gray, &right_eye);
            trace!("Iris left={:?} right={:?}", left_iris, right_iris);

            if let Some(sample) = GazeSample::from_eyes(left_eye, right_eye, left_iris, right_iris, timestamp_ns) {
                debug!(
                    "Gaze {:?}/{:?} ear=({:.2}, {:.2})",
                    sample.horizontal, sample.vertical, sample.ear_left, sample.ear_right
                );
                analysis.samples.push(sample);
            }
            analysis.landmarks.push(landmarks);
        }

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FaceFixture, ScriptedLandmarks};

    #[test]
    fn test_tracker_straight_gaze() {
        let fixture = FaceFixture::default();
        let mut tracker = GazeTracker::new(&DmsConfig::default(), ScriptedLandmarks::always(fixture.landmarks()));
        let frame = VideoFrame::from_gray(fixture.render(), 42, 0);

        let analysis = tracker.analyze(&frame).unwrap();
        assert_eq!(analysis.faces_detected, 1);
        assert_eq!(analysis.timestamp_ns, 42);

        let sample = analysis.primary_sample().unwrap();
        assert_eq!(sample.horizontal, HorizontalGaze::Straight);
        assert_eq!(sample.vertical, VerticalGaze::Straight);
        assert_eq!(sample.ear_left, 0.48);
    }

    #[test]
    fn test_tracker_looking_to_image_left() {
        let fixture = FaceFixture { iris_offset: (-5, 0), ..Default::default() };
        let mut tracker = GazeTracker::new(&DmsConfig::default(), ScriptedLandmarks::always(fixture.landmarks()));

        let analysis = tracker.analyze_gray(&fixture.render(), 0).unwrap();
        assert_eq!(analysis.primary_sample().unwrap().horizontal, HorizontalGaze::Right);
    }

    #[test]
    fn test_no_face_is_not_an_error() {
        let mut tracker = GazeTracker::new(&DmsConfig::default(), ScriptedLandmarks::never());
        let analysis = tracker.analyze_gray(&GrayImage::new(64, 48), 0).unwrap();
        assert_eq!(analysis.faces_detected, 0);
        assert!(!analysis.has_sample());
    }

    #[test]
    fn test_face_without_iris_yields_landmarks_only() {
        // Landmarks present but the frame is blank
        let fixture = FaceFixture::default();
        let mut tracker = GazeTracker::new(&DmsConfig::default(), ScriptedLandmarks::always(fixture.landmarks()));

        let blank = GrayImage::from_pixel(fixture.width, fixture.height, image::Luma([90]));
        let analysis = tracker.analyze_gray(&blank, 0).unwrap();
        assert_eq!(analysis.faces_detected, 1);
        assert_eq!(analysis.landmarks.len(), 1);
        assert!(!analysis.has_sample());
    }

    #[test]
    fn test_zone_strategy_requires_calibration() {
        let mut config = DmsConfig::default();
        assert!(matches!(zone_strategy(&config, None), Err(DmsError::NotCalibrated)));
        config.zone_strategy = ZoneStrategyKind::Knn;
        assert!(matches!(zone_strategy(&config, None), Err(DmsError::NotCalibrated)));
    }

    #[test]
    fn test_zone_strategy_from_model() {
        let point = |x: f64, label| CalibrationPoint { screen_x: x, screen_y: 0.0, label };
        let points = [
            point(0.0, CalibrationLabel::Road(RoadCorner::TopLeft)),
            point(10.0, CalibrationLabel::Road(RoadCorner::TopRight)),
            point(10.0, CalibrationLabel::Road(RoadCorner::BottomRight)),
            point(0.0, CalibrationLabel::Road(RoadCorner::BottomLeft)),
            point(-50.0, CalibrationLabel::Zone(FixedZone::LeftMirror)),
        ];
        let mut dataset = CalibrationDataset::default();
        dataset.push([0.3, 0.3, 0.0, 0.0], CalibrationLabel::Road(RoadCorner::TopLeft));
        dataset.push([0.3, 0.3, -0.4, 0.0], CalibrationLabel::Zone(FixedZone::LeftMirror));
        let baseline = DistanceBaseline {
            standard_distance_centers: 80.0,
            standard_screen_distance: 50.0,
        };
        let model = CalibrationModel::new(baseline, &points, dataset).unwrap();

        let mut config = DmsConfig::default();
        assert_eq!(zone_strategy(&config, Some(&model)).unwrap().name(), "geometric");

        config.zone_strategy = ZoneStrategyKind::Knn;
        let knn = zone_strategy(&config, Some(&model)).unwrap();
        assert_eq!(knn.name(), "knn");
        // Screen position is ignored by the nearest-neighbour vote
        assert_eq!(
            knn.classify(Position::new(5.0, 0.0), &[0.3, 0.3, -0.35, 0.0]),
            ZoneClassification::FixedZone(FixedZone::LeftMirror)
        );
        assert_eq!(
            knn.classify(Position::new(-50.0, 0.0), &[0.3, 0.3, 0.02, 0.0]),
            ZoneClassification::InsideRoad
        );
    }
}
