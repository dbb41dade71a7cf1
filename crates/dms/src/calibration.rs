//! Calibration model and the operator-paced calibration procedure
//!
//! Calibration runs once per session before continuous tracking:
//! 1. (optional) the driver holds a good head position for a few seconds
//! 2. on confirmation, the inter-eye-center distance is recorded as the
//!    distance baseline
//! 3. for each look-target, on confirmation, the current gaze is mapped to a
//!    screen position and stored under the target's label

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::FrameAnalysis;
use crate::gaze::GazeFeatures;
use crate::geometry::Position;
use crate::landmarks::Landmarks;
use crate::mapper::ScreenMapper;
use crate::{DmsConfig, DmsError};

/// Corner of the open-road quadrilateral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoadCorner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl RoadCorner {
    /// Polygon order (clockwise in screen coordinates)
    pub const ALL: [RoadCorner; 4] = [
        RoadCorner::TopLeft,
        RoadCorner::TopRight,
        RoadCorner::BottomRight,
        RoadCorner::BottomLeft,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Named look-target outside the road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedZone {
    LeftMirror,
    RightMirror,
    RearMirror,
    Dashboard,
}

impl FixedZone {
    pub const ALL: [FixedZone; 4] = [
        FixedZone::LeftMirror,
        FixedZone::RightMirror,
        FixedZone::RearMirror,
        FixedZone::Dashboard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FixedZone::LeftMirror => "left_mirror",
            FixedZone::RightMirror => "right_mirror",
            FixedZone::RearMirror => "rear_mirror",
            FixedZone::Dashboard => "dashboard",
        }
    }

    pub fn is_mirror(self) -> bool {
        !matches!(self, FixedZone::Dashboard)
    }
}

/// Label of a calibration target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CalibrationLabel {
    Road(RoadCorner),
    Zone(FixedZone),
}

impl CalibrationLabel {
    /// Road corners in polygon order, then mirrors and dashboard
    pub fn default_targets() -> Vec<CalibrationLabel> {
        RoadCorner::ALL
            .into_iter()
            .map(CalibrationLabel::Road)
            .chain(FixedZone::ALL.into_iter().map(CalibrationLabel::Zone))
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationLabel::Road(RoadCorner::TopLeft) => "top_left",
            CalibrationLabel::Road(RoadCorner::TopRight) => "top_right",
            CalibrationLabel::Road(RoadCorner::BottomRight) => "bottom_right",
            CalibrationLabel::Road(RoadCorner::BottomLeft) => "bottom_left",
            CalibrationLabel::Zone(zone) => zone.as_str(),
        }
    }
}

impl fmt::Display for CalibrationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalibrationLabel {
    type Err = DmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::default_targets()
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| DmsError::Calibration(format!("unknown calibration label '{}'", s)))
    }
}

impl From<CalibrationLabel> for String {
    fn from(label: CalibrationLabel) -> Self {
        label.as_str().to_string()
    }
}

impl TryFrom<String> for CalibrationLabel {
    type Error = DmsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Screen position recorded for one calibration target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub screen_x: f64,
    pub screen_y: f64,
    pub label: CalibrationLabel,
}

impl CalibrationPoint {
    pub fn position(&self) -> Position {
        Position::new(self.screen_x, self.screen_y)
    }
}

/// Inter-eye pixel distance recorded at a known head-to-screen distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBaseline {
    pub standard_distance_centers: f64,
    pub standard_screen_distance: f64,
}

impl DistanceBaseline {
    /// Ratio of the baseline to the current eye-center distance.
    ///
    /// Coinciding eye centers leave the scale untouched.
    pub fn scale(&self, current_centers_distance: f64) -> f64 {
        if current_centers_distance == 0.0 {
            return 1.0;
        }
        self.standard_distance_centers / current_centers_distance
    }

    /// Head-to-screen distance compensated for the current eye spacing
    pub fn adjusted_distance(&self, current_centers_distance: f64) -> f64 {
        self.scale(current_centers_distance) * self.standard_screen_distance
    }
}

/// Feature vectors with their stimulus labels, row-aligned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationDataset {
    pub features: Vec<GazeFeatures>,
    pub labels: Vec<CalibrationLabel>,
}

impl CalibrationDataset {
    pub fn push(&mut self, features: GazeFeatures, label: CalibrationLabel) {
        self.features.push(features);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.features.len().min(self.labels.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject datasets whose arrays disagree in length
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.features.len() != self.labels.len() {
            return Err(DmsError::Calibration(format!(
                "{} feature rows but {} labels",
                self.features.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = (&GazeFeatures, &CalibrationLabel)> {
        self.features.iter().zip(self.labels.iter())
    }
}

/// Result of a completed calibration, read-only for the rest of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub baseline: DistanceBaseline,
    road: [CalibrationPoint; 4],
    zones: Vec<CalibrationPoint>,
    dataset: CalibrationDataset,
}

impl CalibrationModel {
    /// Assemble a model from captured points.
    ///
    /// All four road corners are required. A label captured twice keeps its
    /// latest position.
    pub fn new(
        baseline: DistanceBaseline,
        points: &[CalibrationPoint],
        dataset: CalibrationDataset,
    ) -> Result<Self, DmsError> {
        let mut road: [Option<CalibrationPoint>; 4] = [None; 4];
        let mut zones: Vec<CalibrationPoint> = Vec::new();

        for point in points {
            match point.label {
                CalibrationLabel::Road(corner) => road[corner.index()] = Some(*point),
                CalibrationLabel::Zone(_) => {
                    zones.retain(|z| z.label != point.label);
                    zones.push(*point);
                }
            }
        }

        let mut corners = Vec::with_capacity(4);
        for (corner, point) in RoadCorner::ALL.iter().zip(road) {
            let point = point.ok_or_else(|| {
                DmsError::Calibration(format!(
                    "missing road corner '{}'",
                    CalibrationLabel::Road(*corner)
                ))
            })?;
            corners.push(point);
        }
        let road = [corners[0], corners[1], corners[2], corners[3]];

        dataset.validate()?;
        Ok(Self {
            baseline,
            road,
            zones,
            dataset,
        })
    }

    /// Road corners in polygon order
    pub fn road_corners(&self) -> &[CalibrationPoint; 4] {
        &self.road
    }

    pub fn road_polygon(&self) -> [Position; 4] {
        self.road.map(|p| p.position())
    }

    pub fn fixed_zones(&self) -> &[CalibrationPoint] {
        &self.zones
    }

    pub fn dataset(&self) -> &CalibrationDataset {
        &self.dataset
    }
}

/// Head position verdict for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionQuality {
    Good,
    Bad,
}

/// Progress of the positioning phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionStatus {
    pub quality: PositionQuality,
    /// Fraction of the hold time already spent in a good position
    pub progress: f64,
    pub complete: bool,
}

/// Requires the driver to hold a usable head position before calibrating
#[derive(Debug, Clone)]
pub struct PositionGate {
    eye_distance: (f64, f64),
    face_width: (i32, i32),
    hold: Duration,
    good_since: Option<Instant>,
}

impl PositionGate {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            eye_distance: (config.min_eye_distance, config.max_eye_distance),
            face_width: (config.min_face_width, config.max_face_width),
            hold: Duration::from_secs_f64(config.position_hold_secs.max(0.0)),
            good_since: None,
        }
    }

    /// Judge a single frame; no face is a bad position
    pub fn check(&self, landmarks: Option<&Landmarks>) -> PositionQuality {
        let Some(landmarks) = landmarks else {
            return PositionQuality::Bad;
        };

        let eye_distance = landmarks.outer_eye_distance();
        let face_width = landmarks.face_width();
        let eyes_ok = self.eye_distance.0 < eye_distance && eye_distance < self.eye_distance.1;
        let face_ok = self.face_width.0 < face_width && face_width < self.face_width.1;

        if eyes_ok && face_ok {
            PositionQuality::Good
        } else {
            PositionQuality::Bad
        }
    }

    /// Advance the hold timer with one frame
    pub fn observe(&mut self, landmarks: Option<&Landmarks>, now: Instant) -> PositionStatus {
        let quality = self.check(landmarks);
        if quality == PositionQuality::Bad {
            self.good_since = None;
            return PositionStatus {
                quality,
                progress: 0.0,
                complete: false,
            };
        }

        let since = *self.good_since.get_or_insert(now);
        let held = now.saturating_duration_since(since);
        let progress = if self.hold.is_zero() {
            1.0
        } else {
            (held.as_secs_f64() / self.hold.as_secs_f64()).min(1.0)
        };

        PositionStatus {
            quality,
            progress,
            complete: held >= self.hold,
        }
    }

    pub fn reset(&mut self) {
        self.good_since = None;
    }
}

/// Input from the operator driving the procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorInput {
    /// The driver is looking at the requested target
    Confirm,
    Cancel,
}

/// Where the procedure currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStage {
    Positioning,
    Baseline,
    Target(usize),
    Complete,
    Cancelled,
}

/// Outcome of feeding one frame to the procedure
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationStep {
    Positioning(PositionStatus),
    AwaitingBaseline,
    AwaitingTarget(CalibrationLabel),
    BaselineCaptured { distance_centers: f64 },
    Captured(CalibrationPoint),
    /// Confirmation arrived but the frame had no usable gaze sample
    NoObservation,
    Complete(CalibrationModel),
    Cancelled,
}

/// Operator-paced calibration state machine
#[derive(Debug, Clone)]
pub struct CalibrationProcedure {
    stage: CalibrationStage,
    targets: Vec<CalibrationLabel>,
    gate: Option<PositionGate>,
    standard_screen_distance: f64,
    baseline: Option<DistanceBaseline>,
    points: Vec<CalibrationPoint>,
    dataset: CalibrationDataset,
}

impl CalibrationProcedure {
    /// Procedure over the default targets, starting at the baseline stage
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            stage: CalibrationStage::Baseline,
            targets: CalibrationLabel::default_targets(),
            gate: None,
            standard_screen_distance: config.standard_screen_distance,
            baseline: None,
            points: Vec::new(),
            dataset: CalibrationDataset::default(),
        }
    }

    /// Replace the target list; all four road corners must be present
    pub fn with_targets(mut self, targets: Vec<CalibrationLabel>) -> Result<Self, DmsError> {
        for corner in RoadCorner::ALL {
            if !targets.contains(&CalibrationLabel::Road(corner)) {
                return Err(DmsError::Calibration(format!(
                    "target list lacks road corner '{}'",
                    CalibrationLabel::Road(corner)
                )));
            }
        }
        self.targets = targets;
        Ok(self)
    }

    /// Start with a positioning phase
    pub fn with_position_gate(mut self, gate: PositionGate) -> Self {
        self.gate = Some(gate);
        self.stage = CalibrationStage::Positioning;
        self
    }

    pub fn stage(&self) -> CalibrationStage {
        self.stage
    }

    pub fn targets(&self) -> &[CalibrationLabel] {
        &self.targets
    }

    /// Target the driver should be looking at now
    pub fn current_target(&self) -> Option<CalibrationLabel> {
        match self.stage {
            CalibrationStage::Target(i) => self.targets.get(i).copied(),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, CalibrationStage::Complete | CalibrationStage::Cancelled)
    }

    /// Feed one analysed frame and the operator input received with it
    pub fn step(
        &mut self,
        analysis: &FrameAnalysis,
        now: Instant,
        input: Option<OperatorInput>,
    ) -> Result<CalibrationStep, DmsError> {
        if self.is_finished() {
            return Err(DmsError::Calibration("procedure already finished".into()));
        }

        if input == Some(OperatorInput::Cancel) {
            info!("Calibration cancelled at {:?}", self.stage);
            self.stage = CalibrationStage::Cancelled;
            return Ok(CalibrationStep::Cancelled);
        }

        match self.stage {
            CalibrationStage::Positioning => Ok(self.step_positioning(analysis, now)),
            CalibrationStage::Baseline => Ok(self.step_baseline(analysis, input)),
            CalibrationStage::Target(index) => self.step_target(index, analysis, input),
            CalibrationStage::Complete | CalibrationStage::Cancelled => {
                Err(DmsError::Calibration("procedure already finished".into()))
            }
        }
    }

    fn step_positioning(&mut self, analysis: &FrameAnalysis, now: Instant) -> CalibrationStep {
        let Some(gate) = self.gate.as_mut() else {
            self.stage = CalibrationStage::Baseline;
            return CalibrationStep::AwaitingBaseline;
        };

        let status = gate.observe(analysis.primary_landmarks(), now);
        if status.complete {
            info!("Driver positioned, awaiting baseline confirmation");
            self.stage = CalibrationStage::Baseline;
        }
        CalibrationStep::Positioning(status)
    }

    fn step_baseline(&mut self, analysis: &FrameAnalysis, input: Option<OperatorInput>) -> CalibrationStep {
        if input != Some(OperatorInput::Confirm) {
            return CalibrationStep::AwaitingBaseline;
        }

        let distance = analysis
            .primary_sample()
            .map(|s| s.observation.center_distance())
            .unwrap_or(0.0);
        if distance == 0.0 {
            warn!("Baseline confirmation without a usable gaze sample");
            return CalibrationStep::NoObservation;
        }

        self.baseline = Some(DistanceBaseline {
            standard_distance_centers: distance,
            standard_screen_distance: self.standard_screen_distance,
        });
        self.stage = CalibrationStage::Target(0);
        info!("Calibration baseline: {:.1} px between eye centers", distance);
        CalibrationStep::BaselineCaptured { distance_centers: distance }
    }

    fn step_target(
        &mut self,
        index: usize,
        analysis: &FrameAnalysis,
        input: Option<OperatorInput>,
    ) -> Result<CalibrationStep, DmsError> {
        let label = self.targets[index];
        if input != Some(OperatorInput::Confirm) {
            return Ok(CalibrationStep::AwaitingTarget(label));
        }

        let (Some(sample), Some(baseline)) = (analysis.primary_sample(), self.baseline) else {
            warn!("Confirmation for '{}' without a usable gaze sample", label);
            return Ok(CalibrationStep::NoObservation);
        };

        let screen = ScreenMapper::from_baseline(baseline).map(&sample.observation);
        let point = CalibrationPoint {
            screen_x: screen.x,
            screen_y: screen.y,
            label,
        };
        self.points.push(point);
        self.dataset.push(sample.features(), label);
        info!("Captured '{}' at ({:.1}, {:.1})", label, screen.x, screen.y);

        if index + 1 < self.targets.len() {
            self.stage = CalibrationStage::Target(index + 1);
            return Ok(CalibrationStep::Captured(point));
        }

        let model = CalibrationModel::new(baseline, &self.points, std::mem::take(&mut self.dataset))?;
        self.stage = CalibrationStage::Complete;
        info!("Calibration complete with {} points", self.points.len());
        Ok(CalibrationStep::Complete(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::GazeSample;
    use crate::geometry::Point;
    use crate::testing::{eye_region_at, FaceFixture};

    fn analysis_with_offset(dx: i32, dy: i32) -> FrameAnalysis {
        let left = eye_region_at(Point::new(100, 100));
        let right = eye_region_at(Point::new(180, 100));
        let sample = GazeSample::from_eyes(
            left,
            right,
            Some(Point::new(100 + dx, 100 + dy)),
            Some(Point::new(180 + dx, 100 + dy)),
            0,
        )
        .unwrap();
        FrameAnalysis {
            faces_detected: 1,
            samples: vec![sample],
            ..Default::default()
        }
    }

    fn corner_point(corner: RoadCorner, x: f64, y: f64) -> CalibrationPoint {
        CalibrationPoint {
            screen_x: x,
            screen_y: y,
            label: CalibrationLabel::Road(corner),
        }
    }

    #[test]
    fn test_label_names_round_trip() {
        for label in CalibrationLabel::default_targets() {
            assert_eq!(label.as_str().parse::<CalibrationLabel>().unwrap(), label);
        }
        assert!("glovebox".parse::<CalibrationLabel>().is_err());
    }

    #[test]
    fn test_distance_scale() {
        let baseline = DistanceBaseline {
            standard_distance_centers: 80.0,
            standard_screen_distance: 50.0,
        };
        assert_eq!(baseline.scale(100.0), 0.8);
        assert_eq!(baseline.adjusted_distance(100.0), 40.0);
        // Coinciding centers are a no-op
        assert_eq!(baseline.scale(0.0), 1.0);
        assert_eq!(baseline.adjusted_distance(0.0), 50.0);
    }

    #[test]
    fn test_model_orders_corners_and_requires_all() {
        let baseline = DistanceBaseline {
            standard_distance_centers: 80.0,
            standard_screen_distance: 50.0,
        };
        let points = [
            corner_point(RoadCorner::BottomLeft, 0.0, 10.0),
            corner_point(RoadCorner::TopLeft, 0.0, 0.0),
            corner_point(RoadCorner::BottomRight, 10.0, 10.0),
            corner_point(RoadCorner::TopRight, 10.0, 0.0),
        ];
        let model = CalibrationModel::new(baseline, &points, CalibrationDataset::default()).unwrap();
        let polygon = model.road_polygon();
        assert_eq!(polygon[0], Position::new(0.0, 0.0));
        assert_eq!(polygon[1], Position::new(10.0, 0.0));
        assert_eq!(polygon[2], Position::new(10.0, 10.0));
        assert_eq!(polygon[3], Position::new(0.0, 10.0));

        let err = CalibrationModel::new(baseline, &points[..3], CalibrationDataset::default());
        assert!(matches!(err, Err(DmsError::Calibration(_))));
    }

    #[test]
    fn test_position_gate_needs_continuous_hold() {
        let fixture = FaceFixture {
            left_center: Point::new(100, 70),
            right_center: Point::new(140, 70),
            ..Default::default()
        };
        let mut landmarks = fixture.landmarks();
        let config = DmsConfig::default();
        let mut gate = PositionGate::new(&config);

        // Outer corners 90 px apart, jaw 220 px wide
        assert_eq!(gate.check(Some(&landmarks)), PositionQuality::Good);
        assert_eq!(gate.check(None), PositionQuality::Bad);

        let t0 = Instant::now();
        assert!(!gate.observe(Some(&landmarks), t0).complete);
        let status = gate.observe(Some(&landmarks), t0 + Duration::from_millis(2500));
        assert_eq!(status.progress, 0.5);

        // A bad frame restarts the hold
        assert_eq!(gate.observe(None, t0 + Duration::from_secs(3)).progress, 0.0);
        assert!(!gate.observe(Some(&landmarks), t0 + Duration::from_secs(4)).complete);
        assert!(gate.observe(Some(&landmarks), t0 + Duration::from_secs(9)).complete);

        // Face too wide
        landmarks = FaceFixture { scale: 1.5, ..fixture }.landmarks();
        assert_eq!(gate.check(Some(&landmarks)), PositionQuality::Bad);
    }

    #[test]
    fn test_procedure_walks_all_targets() {
        let config = DmsConfig::default();
        let mut procedure = CalibrationProcedure::new(&config);
        let now = Instant::now();
        let confirm = Some(OperatorInput::Confirm);

        assert_eq!(
            procedure.step(&analysis_with_offset(0, 0), now, None).unwrap(),
            CalibrationStep::AwaitingBaseline
        );
        assert_eq!(
            procedure.step(&analysis_with_offset(0, 0), now, confirm).unwrap(),
            CalibrationStep::BaselineCaptured { distance_centers: 80.0 }
        );
        assert_eq!(procedure.current_target(), Some(CalibrationLabel::Road(RoadCorner::TopLeft)));

        // Confirmation without a face does not advance
        assert_eq!(
            procedure.step(&FrameAnalysis::default(), now, confirm).unwrap(),
            CalibrationStep::NoObservation
        );
        assert_eq!(procedure.stage(), CalibrationStage::Target(0));

        let offsets = [(-2, -2), (2, -2), (2, 2), (-2, 2), (-4, 0), (4, 0), (0, -4), (0, 4)];
        let mut model = None;
        for (i, (dx, dy)) in offsets.into_iter().enumerate() {
            match procedure.step(&analysis_with_offset(dx, dy), now, confirm).unwrap() {
                CalibrationStep::Captured(point) => assert_eq!(point.label, procedure.targets()[i]),
                CalibrationStep::Complete(m) => model = Some(m),
                other => panic!("unexpected step {:?}", other),
            }
        }

        let model = model.expect("calibration should complete");
        assert!(procedure.is_finished());
        assert_eq!(model.fixed_zones().len(), 4);
        assert_eq!(model.dataset().len(), 8);
        assert_eq!(model.baseline.standard_distance_centers, 80.0);

        // Top-left: avg iris (138, 98), avg center (140, 100), adjusted distance 50
        let top_left = model.road_corners()[0];
        assert_eq!((top_left.screen_x, top_left.screen_y), (38.0, -2.0));

        assert!(procedure.step(&FrameAnalysis::default(), now, None).is_err());
    }

    #[test]
    fn test_procedure_cancel() {
        let mut procedure = CalibrationProcedure::new(&DmsConfig::default())
            .with_position_gate(PositionGate::new(&DmsConfig::default()));
        assert_eq!(procedure.stage(), CalibrationStage::Positioning);

        let step = procedure
            .step(&FrameAnalysis::default(), Instant::now(), Some(OperatorInput::Cancel))
            .unwrap();
        assert_eq!(step, CalibrationStep::Cancelled);
        assert!(procedure.is_finished());
    }

    #[test]
    fn test_positioning_hands_over_to_baseline() {
        let fixture = FaceFixture {
            left_center: Point::new(100, 70),
            right_center: Point::new(140, 70),
            ..Default::default()
        };
        let positioned = FrameAnalysis {
            faces_detected: 1,
            landmarks: vec![fixture.landmarks()],
            ..Default::default()
        };
        let config = DmsConfig::default();
        let mut procedure = CalibrationProcedure::new(&config).with_position_gate(PositionGate::new(&config));
        let t0 = Instant::now();

        let progress = |step: CalibrationStep| match step {
            CalibrationStep::Positioning(status) => status.progress,
            other => panic!("unexpected step {:?}", other),
        };

        // Confirmation is ignored while positioning
        let step = procedure.step(&positioned, t0, Some(OperatorInput::Confirm)).unwrap();
        assert_eq!(progress(step), 0.0);
        let step = procedure.step(&positioned, t0 + Duration::from_secs(4), None).unwrap();
        assert_eq!(progress(step), 0.8);

        // Losing the face resets progress
        let step = procedure.step(&FrameAnalysis::default(), t0 + Duration::from_millis(4500), None).unwrap();
        assert_eq!(progress(step), 0.0);
        assert_eq!(procedure.stage(), CalibrationStage::Positioning);

        procedure.step(&positioned, t0 + Duration::from_secs(5), None).unwrap();
        let step = procedure.step(&positioned, t0 + Duration::from_secs(9), None).unwrap();
        assert_eq!(progress(step), 0.8);
        assert_eq!(procedure.stage(), CalibrationStage::Positioning);

        match procedure.step(&positioned, t0 + Duration::from_secs(10), None).unwrap() {
            CalibrationStep::Positioning(status) => {
                assert!(status.complete);
                assert_eq!(status.progress, 1.0);
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(procedure.stage(), CalibrationStage::Baseline);
        assert_eq!(
            procedure.step(&positioned, t0 + Duration::from_secs(11), None).unwrap(),
            CalibrationStep::AwaitingBaseline
        );
    }

    #[test]
    fn test_targets_must_include_road() {
        let result = CalibrationProcedure::new(&DmsConfig::default())
            .with_targets(vec![CalibrationLabel::Zone(FixedZone::Dashboard)]);
        assert!(result.is_err());
    }
}
