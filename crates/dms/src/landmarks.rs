//! Facial landmarks and eye geometry
//!
//! Landmarks follow the 68-point anatomical indexing convention: 0 and 16 are
//! the jaw-line endpoints, 36..=41 the left eye contour and 42..=47 the right
//! eye contour.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::DmsError;

/// Number of points produced by the landmark predictor
pub const LANDMARK_COUNT: usize = 68;

/// Landmark indices of the left eye contour
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];

/// Landmark indices of the right eye contour
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

const JAW_LEFT: usize = 0;
const JAW_RIGHT: usize = 16;
const LEFT_EYE_OUTER: usize = 36;
const RIGHT_EYE_OUTER: usize = 45;

/// Face bounding box from the face detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBbox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// External face detector and landmark predictor
pub trait LandmarkSource {
    /// Detect faces in a grayscale frame
    fn detect_faces(&mut self, gray: &GrayImage) -> Result<Vec<FaceBbox>, DmsError>;

    /// Predict the 68 landmark points of a detected face
    fn predict_landmarks(&mut self, gray: &GrayImage, face: &FaceBbox) -> Result<Landmarks, DmsError>;
}

/// The 68 landmark points of one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Landmarks {
    points: Vec<Point>,
}

impl TryFrom<Vec<Point>> for Landmarks {
    type Error = DmsError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Landmarks::new(points)
    }
}

impl From<Landmarks> for Vec<Point> {
    fn from(landmarks: Landmarks) -> Self {
        landmarks.points
    }
}

impl Landmarks {
    /// Wrap a predictor output, which must carry exactly 68 points
    pub fn new(points: Vec<Point>) -> Result<Self, DmsError> {
        if points.len() != LANDMARK_COUNT {
            return Err(DmsError::InvalidLandmarks(points.len()));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    fn region(&self, indices: [usize; 6]) -> EyeRegion {
        EyeRegion::new(indices.map(|i| self.points[i]))
    }

    pub fn left_eye(&self) -> EyeRegion {
        self.region(LEFT_EYE)
    }

    pub fn right_eye(&self) -> EyeRegion {
        self.region(RIGHT_EYE)
    }

    /// Horizontal span of the jaw line (x[16] - x[0])
    pub fn face_width(&self) -> i32 {
        self.points[JAW_RIGHT].x - self.points[JAW_LEFT].x
    }

    /// Distance between the two outer eye corners
    pub fn outer_eye_distance(&self) -> f64 {
        self.points[LEFT_EYE_OUTER].distance(&self.points[RIGHT_EYE_OUTER])
    }
}

/// Six-point eye contour
///
/// Order: outer corner, two upper lid points, inner corner, two lower lid
/// points. The EAR formula relies on 1<->5 and 2<->4 being vertical pairs and
/// 0<->3 the horizontal span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeRegion {
    pub points: [Point; 6],
}

/// Axis-aligned pixel box, max bounds exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelBox {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Intersect with an image of the given size
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelBox {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        PixelBox {
            min_x: self.min_x.clamp(0, w),
            min_y: self.min_y.clamp(0, h),
            max_x: self.max_x.clamp(0, w),
            max_y: self.max_y.clamp(0, h),
        }
    }
}

impl EyeRegion {
    pub fn new(points: [Point; 6]) -> Self {
        Self { points }
    }

    /// Midpoint of the two eye corners
    pub fn center(&self) -> Point {
        self.points[0].midpoint(&self.points[3])
    }

    /// Corner-to-corner distance
    pub fn width(&self) -> f64 {
        self.points[0].distance(&self.points[3])
    }

    /// Mean lid opening over the two vertical pairs
    pub fn height(&self) -> f64 {
        (self.points[1].distance(&self.points[5]) + self.points[2].distance(&self.points[4])) / 2.0
    }

    /// Bounding box with exclusive max, matching a `[min, max)` crop
    pub fn bounding_box(&self) -> PixelBox {
        let xs = self.points.iter().map(|p| p.x);
        let ys = self.points.iter().map(|p| p.y);
        PixelBox {
            min_x: xs.clone().min().unwrap_or(0),
            min_y: ys.clone().min().unwrap_or(0),
            max_x: xs.max().unwrap_or(0),
            max_y: ys.max().unwrap_or(0),
        }
    }
}
