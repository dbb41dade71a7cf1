//! Synthetic face fixtures
//!
//! Renders two almond-shaped eyes with a dark iris disk on a skin-toned
//! background together with the matching 68-point landmark set.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as ImPoint;

use crate::geometry::Point;
use crate::landmarks::{EyeRegion, FaceBbox, LandmarkSource, Landmarks, LEFT_EYE, RIGHT_EYE};
use crate::DmsError;

pub const SKIN: u8 = 120;
pub const SCLERA: u8 = 220;
pub const IRIS: u8 = 30;
pub const IRIS_RADIUS: i32 = 4;

/// Eye contour centered on `center`: 50 px wide, 24 px tall
pub fn eye_region_at(center: Point) -> EyeRegion {
    let Point { x, y } = center;
    EyeRegion::new([
        Point::new(x - 25, y),
        Point::new(x - 10, y - 12),
        Point::new(x + 10, y - 12),
        Point::new(x + 25, y),
        Point::new(x + 10, y + 12),
        Point::new(x - 10, y + 12),
    ])
}

/// Paint the sclera polygon and optionally an iris disk
pub fn draw_eye(image: &mut GrayImage, eye: &EyeRegion, iris: Option<Point>) {
    let polygon: Vec<ImPoint<i32>> = eye.points.iter().map(|p| ImPoint::new(p.x, p.y)).collect();
    draw_polygon_mut(image, &polygon, Luma([SCLERA]));
    if let Some(iris) = iris {
        draw_filled_circle_mut(image, (iris.x, iris.y), IRIS_RADIUS, Luma([IRIS]));
    }
}

/// A frontal face with both eyes open
#[derive(Debug, Clone)]
pub struct FaceFixture {
    pub width: u32,
    pub height: u32,
    pub left_center: Point,
    pub right_center: Point,
    /// Iris displacement from each eye center, applied to both eyes
    pub iris_offset: (i32, i32),
    /// Horizontal scale of the whole face around the frame center
    pub scale: f64,
}

impl Default for FaceFixture {
    fn default() -> Self {
        Self {
            width: 240,
            height: 140,
            left_center: Point::new(80, 70),
            right_center: Point::new(160, 70),
            iris_offset: (0, 0),
            scale: 1.0,
        }
    }
}

impl FaceFixture {
    fn scaled(&self, p: Point) -> Point {
        let mid = self.width as f64 / 2.0;
        Point::new((mid + (p.x as f64 - mid) * self.scale).round() as i32, p.y)
    }

    pub fn left_eye_center(&self) -> Point {
        self.scaled(self.left_center)
    }

    pub fn right_eye_center(&self) -> Point {
        self.scaled(self.right_center)
    }

    pub fn left_iris(&self) -> Point {
        let c = self.left_eye_center();
        Point::new(c.x + self.iris_offset.0, c.y + self.iris_offset.1)
    }

    pub fn right_iris(&self) -> Point {
        let c = self.right_eye_center();
        Point::new(c.x + self.iris_offset.0, c.y + self.iris_offset.1)
    }

    pub fn render(&self) -> GrayImage {
        let mut image = GrayImage::from_pixel(self.width, self.height, Luma([SKIN]));
        draw_eye(&mut image, &eye_region_at(self.left_eye_center()), Some(self.left_iris()));
        draw_eye(&mut image, &eye_region_at(self.right_eye_center()), Some(self.right_iris()));
        image
    }

    pub fn landmarks(&self) -> Landmarks {
        let left = eye_region_at(self.left_eye_center());
        let right = eye_region_at(self.right_eye_center());
        let jaw_y = self.height as i32 - 10;

        let mut points = vec![Point::new(self.width as i32 / 2, jaw_y); 68];
        points[0] = self.scaled(Point::new(10, 40));
        points[16] = self.scaled(Point::new(self.width as i32 - 10, 40));
        for (slot, p) in LEFT_EYE.iter().zip(left.points) {
            points[*slot] = p;
        }
        for (slot, p) in RIGHT_EYE.iter().zip(right.points) {
            points[*slot] = p;
        }
        // Fixture always carries 68 points
        Landmarks::new(points).unwrap_or_else(|_| unreachable!())
    }
}

/// Landmark source that replays a fixed script, one entry per frame
#[derive(Debug, Default)]
pub struct ScriptedLandmarks {
    script: std::collections::VecDeque<Option<Landmarks>>,
    fallback: Option<Landmarks>,
    current: Option<Landmarks>,
}

impl ScriptedLandmarks {
    /// Every frame yields the same face
    pub fn always(landmarks: Landmarks) -> Self {
        Self {
            fallback: Some(landmarks),
            ..Default::default()
        }
    }

    /// No frame ever contains a face
    pub fn never() -> Self {
        Self::default()
    }

    /// Play `script` frame by frame, then fall back to `fallback`
    pub fn scripted(script: Vec<Option<Landmarks>>, fallback: Option<Landmarks>) -> Self {
        Self {
            script: script.into(),
            fallback,
            current: None,
        }
    }
}

impl LandmarkSource for ScriptedLandmarks {
    fn detect_faces(&mut self, _gray: &GrayImage) -> Result<Vec<FaceBbox>, DmsError> {
        self.current = match self.script.pop_front() {
            Some(entry) => entry,
            None => self.fallback.clone(),
        };
        Ok(self
            .current
            .iter()
            .map(|_| FaceBbox { x: 0, y: 0, width: 1, height: 1 })
            .collect())
    }

    fn predict_landmarks(&mut self, _gray: &GrayImage, _face: &FaceBbox) -> Result<Landmarks, DmsError> {
        self.current.clone().ok_or(DmsError::NoFace)
    }
}
