//! Zone classification of mapped gaze

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationModel, FixedZone};
use crate::gaze::GazeFeatures;
use crate::geometry::Position;
use crate::DmsError;

/// Where a gaze sample landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneClassification {
    InsideRoad,
    FixedZone(FixedZone),
    Unclassified,
}

/// Interchangeable zone classifiers
pub trait ZoneStrategy: Send {
    fn classify(&self, screen: Position, features: &GazeFeatures) -> ZoneClassification;

    fn name(&self) -> &'static str;
}

/// Even-odd point-in-polygon test; points on an edge count as inside
pub fn point_in_polygon(polygon: &[Position], point: Position) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];

        if on_segment(a, b, point) {
            return true;
        }

        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(a: Position, b: Position, p: Position) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > 1e-9 {
        return false;
    }
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Road quadrilateral test, then nearest fixed zone within a tolerance
#[derive(Debug, Clone)]
pub struct GeometricZoneClassifier {
    road: Vec<Position>,
    zones: Vec<(FixedZone, Position)>,
    tolerance: f64,
}

impl GeometricZoneClassifier {
    /// Build from a completed calibration; refuses to run without one
    pub fn new(model: Option<&CalibrationModel>, tolerance: f64) -> Result<Self, DmsError> {
        let model = model.ok_or(DmsError::NotCalibrated)?;
        let zones = model
            .fixed_zones()
            .iter()
            .filter_map(|p| match p.label {
                crate::CalibrationLabel::Zone(zone) => Some((zone, p.position())),
                crate::CalibrationLabel::Road(_) => None,
            })
            .collect();
        Ok(Self::from_parts(model.road_polygon().to_vec(), zones, tolerance))
    }

    pub fn from_parts(road: Vec<Position>, zones: Vec<(FixedZone, Position)>, tolerance: f64) -> Self {
        Self { road, zones, tolerance }
    }

    /// Nearest fixed zone and its distance
    fn nearest_zone(&self, screen: Position) -> Option<(FixedZone, f64)> {
        self.zones
            .iter()
            .map(|(zone, p)| (*zone, p.distance(&screen)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn classify_position(&self, screen: Position) -> ZoneClassification {
        if point_in_polygon(&self.road, screen) {
            return ZoneClassification::InsideRoad;
        }

        match self.nearest_zone(screen) {
            Some((zone, distance)) if distance <= self.tolerance => ZoneClassification::FixedZone(zone),
            _ => ZoneClassification::Unclassified,
        }
    }
}

impl ZoneStrategy for GeometricZoneClassifier {
    fn classify(&self, screen: Position, _features: &GazeFeatures) -> ZoneClassification {
        self.classify_position(screen)
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}
