//! Gaze direction classification
//!
//! Labels are mirrored relative to the driver: screen x grows to the right
//! while the driver faces the camera, so an iris left of the eye center (in
//! image coordinates) reads as `Right`.

use serde::{Deserialize, Serialize};

use crate::blink::eye_aspect_ratio;
use crate::geometry::{Point, Position};
use crate::landmarks::EyeRegion;

/// Horizontal gaze label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalGaze {
    Left,
    Right,
    Straight,
}

/// Vertical gaze label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalGaze {
    Up,
    Down,
    Straight,
}

/// `[ear_left, ear_right, horizontal_ratio, vertical_ratio]`
pub type GazeFeatures = [f64; 4];

/// Both iris centroids with the eye contours they were found in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeObservation {
    pub left_iris: Point,
    pub right_iris: Point,
    pub left_eye: EyeRegion,
    pub right_eye: EyeRegion,
}

impl EyeObservation {
    /// Mean iris position across both eyes
    pub fn avg_iris(&self) -> Position {
        Position::average(self.left_iris, self.right_iris)
    }

    /// Mean eye-region center across both eyes
    pub fn avg_center(&self) -> Position {
        Position::average(self.left_eye.center(), self.right_eye.center())
    }

    /// Pixel distance between the two eye-region centers
    pub fn center_distance(&self) -> f64 {
        self.left_eye.center().distance(&self.right_eye.center())
    }

    /// Iris offset normalized by eye size, averaged over both eyes
    pub fn gaze_ratios(&self) -> (f64, f64) {
        fn ratio(offset: i32, extent: f64) -> f64 {
            if extent == 0.0 {
                0.0
            } else {
                f64::from(offset) / extent
            }
        }

        let eyes = [(self.left_iris, &self.left_eye), (self.right_iris, &self.right_eye)];
        let (mut h, mut v) = (0.0, 0.0);
        for (iris, eye) in eyes {
            let center = eye.center();
            h += ratio(iris.x - center.x, eye.width());
            v += ratio(iris.y - center.y, eye.height());
        }
        (h / 2.0, v / 2.0)
    }
}

/// Direction labels from the averaged iris and eye-center positions
pub fn classify_direction(iris: Position, center: Position) -> (HorizontalGaze, VerticalGaze) {
    let horizontal = if iris.x < center.x {
        HorizontalGaze::Right
    } else if iris.x > center.x {
        HorizontalGaze::Left
    } else {
        HorizontalGaze::Straight
    };

    let vertical = if iris.y < center.y {
        VerticalGaze::Up
    } else if iris.y > center.y {
        VerticalGaze::Down
    } else {
        VerticalGaze::Straight
    };

    (horizontal, vertical)
}

/// One classified observation of a face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub ear_left: f64,
    pub ear_right: f64,
    pub horizontal: HorizontalGaze,
    pub vertical: VerticalGaze,
    /// Capture timestamp of the source frame (nanoseconds)
    pub timestamp_ns: u64,
    pub observation: EyeObservation,
}

impl GazeSample {
    /// Build a sample once both irises were located.
    ///
    /// Returns `None` when either iris is missing; no default direction is
    /// substituted.
    pub fn from_eyes(
        left_eye: EyeRegion,
        right_eye: EyeRegion,
        left_iris: Option<Point>,
        right_iris: Option<Point>,
        timestamp_ns: u64,
    ) -> Option<Self> {
        let observation = EyeObservation {
            left_iris: left_iris?,
            right_iris: right_iris?,
            left_eye,
            right_eye,
        };
        let (horizontal, vertical) = classify_direction(observation.avg_iris(), observation.avg_center());

        Some(Self {
            ear_left: eye_aspect_ratio(&left_eye),
            ear_right: eye_aspect_ratio(&right_eye),
            horizontal,
            vertical,
            timestamp_ns,
            observation,
        })
    }

    /// Looking straight ahead on both axes
    pub fn is_straight(&self) -> bool {
        self.horizontal == HorizontalGaze::Straight && self.vertical == VerticalGaze::Straight
    }

    /// Feature vector used by the nearest-neighbour zone strategy
    pub fn features(&self) -> GazeFeatures {
        let (h, v) = self.observation.gaze_ratios();
        [self.ear_left, self.ear_right, h, v]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::eye_region_at;

    fn sample_with_offset(dx: i32, dy: i32) -> Option<GazeSample> {
        let left = eye_region_at(Point::new(50, 50));
        let right = eye_region_at(Point::new(150, 50));
        GazeSample::from_eyes(
            left,
            right,
            Some(Point::new(50 + dx, 50 + dy)),
            Some(Point::new(150 + dx, 50 + dy)),
            7,
        )
    }

    #[test]
    fn test_centered_iris_is_straight() {
        let sample = sample_with_offset(0, 0).unwrap();
        assert_eq!(sample.horizontal, HorizontalGaze::Straight);
        assert_eq!(sample.vertical, VerticalGaze::Straight);
        assert!(sample.is_straight());
        assert_eq!(sample.timestamp_ns, 7);
    }

    #[test]
    fn test_labels_are_mirrored() {
        let sample = sample_with_offset(-3, 0).unwrap();
        assert_eq!(sample.horizontal, HorizontalGaze::Right);

        let sample = sample_with_offset(3, 0).unwrap();
        assert_eq!(sample.horizontal, HorizontalGaze::Left);
    }

    #[test]
    fn test_vertical_labels() {
        assert_eq!(sample_with_offset(0, -2).unwrap().vertical, VerticalGaze::Up);
        assert_eq!(sample_with_offset(0, 2).unwrap().vertical, VerticalGaze::Down);
    }

    #[test]
    fn test_missing_iris_yields_no_sample() {
        let left = eye_region_at(Point::new(50, 50));
        let right = eye_region_at(Point::new(150, 50));
        assert!(GazeSample::from_eyes(left, right, Some(Point::new(50, 50)), None, 0).is_none());
        assert!(GazeSample::from_eyes(left, right, None, Some(Point::new(150, 50)), 0).is_none());
    }

    #[test]
    fn test_opposite_offsets_average_out() {
        let left = eye_region_at(Point::new(50, 50));
        let right = eye_region_at(Point::new(150, 50));
        let sample =
            GazeSample::from_eyes(left, right, Some(Point::new(46, 50)), Some(Point::new(154, 50)), 0).unwrap();
        assert!(sample.is_straight());
    }

    #[test]
    fn test_features() {
        let sample = sample_with_offset(5, -6).unwrap();
        let [ear_l, ear_r, h, v] = sample.features();
        assert_eq!(ear_l, 0.48);
        assert_eq!(ear_r, 0.48);
        assert_eq!(h, 0.1);
        assert_eq!(v, -0.25);
        assert_eq!(sample.observation.center_distance(), 100.0);
    }
}
