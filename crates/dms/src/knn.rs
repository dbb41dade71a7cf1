//! Nearest-neighbour zone strategy trained on calibration feature vectors

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use crate::calibration::{CalibrationDataset, CalibrationLabel};
use crate::gaze::GazeFeatures;
use crate::geometry::Position;
use crate::zone::{ZoneClassification, ZoneStrategy};
use crate::DmsError;

/// Majority vote over the `k` closest calibration rows (Euclidean).
/// Ties go to the label of the closest row among the tied labels.
#[derive(Debug, Clone)]
pub struct KnnZoneClassifier {
    features: Array2<f64>,
    labels: Vec<CalibrationLabel>,
    k: usize,
}

impl KnnZoneClassifier {
    pub fn new(dataset: &CalibrationDataset, k: usize) -> Result<Self, DmsError> {
        dataset.validate()?;
        if dataset.is_empty() {
            return Err(DmsError::NotCalibrated);
        }

        let flat: Vec<f64> = dataset.features.iter().flatten().copied().collect();
        let features = Array2::from_shape_vec((dataset.len(), 4), flat)
            .map_err(|e| DmsError::Calibration(e.to_string()))?;

        Ok(Self {
            features,
            labels: dataset.labels.clone(),
            k: k.clamp(1, dataset.len()),
        })
    }

    /// Label voted for by the nearest calibration rows
    pub fn predict(&self, query: &GazeFeatures) -> CalibrationLabel {
        let query = ArrayView1::from(&query[..]);
        let mut ranked: Vec<(usize, f64)> = self
            .features
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i, (&row - &query).mapv(|d| d * d).sum()))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let neighbours = &ranked[..self.k];
        let mut votes: HashMap<CalibrationLabel, usize> = HashMap::new();
        for (i, _) in neighbours {
            *votes.entry(self.labels[*i]).or_insert(0) += 1;
        }
        let best = votes.values().copied().max().unwrap_or(0);

        // Neighbours are sorted, so the first label reaching `best` is the closest
        let label = neighbours
            .iter()
            .map(|(i, _)| self.labels[*i])
            .find(|label| votes.get(label) == Some(&best))
            .unwrap_or(self.labels[ranked[0].0]);

        debug!("KNN vote {:?} -> {}", votes, label);
        label
    }
}

impl ZoneStrategy for KnnZoneClassifier {
    fn classify(&self, _screen: Position, features: &GazeFeatures) -> ZoneClassification {
        match self.predict(features) {
            CalibrationLabel::Road(_) => ZoneClassification::InsideRoad,
            CalibrationLabel::Zone(zone) => ZoneClassification::FixedZone(zone),
        }
    }

    fn name(&self) -> &'static str {
        "knn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{FixedZone, RoadCorner};

    fn dataset() -> CalibrationDataset {
        let mut data = CalibrationDataset::default();
        data.push([0.3, 0.3, 0.0, 0.0], CalibrationLabel::Road(RoadCorner::TopLeft));
        data.push([0.3, 0.3, 0.02, 0.0], CalibrationLabel::Road(RoadCorner::TopRight));
        data.push([0.3, 0.3, -0.4, 0.0], CalibrationLabel::Zone(FixedZone::LeftMirror));
        data.push([0.3, 0.3, -0.42, 0.01], CalibrationLabel::Zone(FixedZone::LeftMirror));
        data.push([0.3, 0.3, 0.0, 0.35], CalibrationLabel::Zone(FixedZone::Dashboard));
        data
    }

    #[test]
    fn test_road_labels_map_to_inside_road() {
        let knn = KnnZoneClassifier::new(&dataset(), 1).unwrap();
        let zone = knn.classify(Position::default(), &[0.3, 0.3, 0.01, 0.0]);
        assert_eq!(zone, ZoneClassification::InsideRoad);
    }

    #[test]
    fn test_majority_vote() {
        let knn = KnnZoneClassifier::new(&dataset(), 3).unwrap();
        // Two mirror rows outvote the nearest road row
        let zone = knn.classify(Position::default(), &[0.3, 0.3, -0.3, 0.0]);
        assert_eq!(zone, ZoneClassification::FixedZone(FixedZone::LeftMirror));
    }

    #[test]
    fn test_tie_goes_to_nearest() {
        let knn = KnnZoneClassifier::new(&dataset(), 2).unwrap();
        // One vote each for top_left and top_right
        assert_eq!(
            knn.predict(&[0.3, 0.3, 0.015, 0.0]),
            CalibrationLabel::Road(RoadCorner::TopRight)
        );
    }

    #[test]
    fn test_k_is_clamped() {
        let knn = KnnZoneClassifier::new(&dataset(), 50).unwrap();
        assert_eq!(knn.k, 5);
    }

    #[test]
    fn test_empty_dataset_is_not_calibrated() {
        let result = KnnZoneClassifier::new(&CalibrationDataset::default(), 3);
        assert!(matches!(result, Err(DmsError::NotCalibrated)));
    }

    #[test]
    fn test_mismatched_arrays_rejected() {
        let mut data = dataset();
        data.labels.pop();
        assert!(matches!(KnnZoneClassifier::new(&data, 3), Err(DmsError::Calibration(_))));
    }
}
