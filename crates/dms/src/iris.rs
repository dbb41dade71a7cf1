//! Iris localization inside an eye region
//!
//! Heuristic segmentation: mask the eye polygon, equalize, apply an inverted
//! adaptive Gaussian threshold so the dark iris stands out against the sclera,
//! re-mask to drop eyelid and skin, and take the bounding-box center of the
//! largest contour. Reflections, heavy eyelids and strong side lighting are
//! known to pull the centroid off the true pupil.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};
use imageproc::contrast::equalize_histogram;
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point as ImPoint;
use tracing::trace;

use crate::geometry::Point;
use crate::landmarks::EyeRegion;
use crate::DmsConfig;

const FOREGROUND: Luma<u8> = Luma([255]);

/// Estimates iris centroids from a grayscale frame
#[derive(Debug, Clone)]
pub struct IrisLocalizer {
    block_size: u32,
    offset: i16,
}

impl IrisLocalizer {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            // Gaussian neighbourhoods need an odd size of at least 3
            block_size: config.threshold_block_size.max(3) | 1,
            offset: config.threshold_offset,
        }
    }

    /// Locate the iris centroid in full-frame pixel coordinates.
    ///
    /// Returns `None` when the region is degenerate or no dark blob survives
    /// the threshold.
    pub fn locate(&self, gray: &GrayImage, eye: &EyeRegion) -> Option<Point> {
        let bbox = eye.bounding_box().clamp_to(gray.width(), gray.height());
        if bbox.is_empty() {
            trace!("Eye region outside frame or collapsed");
            return None;
        }

        let (x0, y0) = (bbox.min_x, bbox.min_y);
        let (w, h) = (bbox.width() as u32, bbox.height() as u32);

        let polygon = local_polygon(eye, x0, y0)?;
        let mut mask = GrayImage::new(w, h);
        draw_polygon_mut(&mut mask, &polygon, FOREGROUND);

        let crop = image::imageops::crop_imm(gray, x0 as u32, y0 as u32, w, h).to_image();
        let eye_img = apply_mask(&crop, &mask);
        let equalized = equalize_histogram(&eye_img);
        let thresholded = self.adaptive_threshold_inv(&equalized);
        let iris_mask = apply_mask(&thresholded, &mask);

        let contours = find_contours::<i32>(&iris_mask);
        let largest = largest_contour(&contours)?;
        let (cx, cy) = bounding_rect_center(largest)?;

        Some(Point::new(cx + x0, cy + y0))
    }

    /// Inverted binary adaptive threshold against a Gaussian-weighted local mean
    fn adaptive_threshold_inv(&self, image: &GrayImage) -> GrayImage {
        let sigma = 0.3 * ((self.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
        let local_mean = gaussian_blur_f32(image, sigma);

        let mut out = GrayImage::new(image.width(), image.height());
        for (x, y, px) in image.enumerate_pixels() {
            let threshold = i16::from(local_mean.get_pixel(x, y)[0]) - self.offset;
            if i16::from(px[0]) <= threshold {
                out.put_pixel(x, y, FOREGROUND);
            }
        }
        out
    }
}

/// Eye polygon shifted into crop coordinates, without repeated vertices.
fn local_polygon(eye: &EyeRegion, x0: i32, y0: i32) -> Option<Vec<ImPoint<i32>>> {
    let mut polygon: Vec<ImPoint<i32>> = Vec::with_capacity(6);
    for p in &eye.points {
        let local = ImPoint::new(p.x - x0, p.y - y0);
        if polygon.last() != Some(&local) {
            polygon.push(local);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    if polygon.len() < 3 {
        return None;
    }
    Some(polygon)
}

fn apply_mask(image: &GrayImage, mask: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    for (px, m) in out.pixels_mut().zip(mask.pixels()) {
        if m[0] == 0 {
            px[0] = 0;
        }
    }
    out
}

/// Shoelace area of a closed contour
fn contour_area(points: &[ImPoint<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    (twice as f64 / 2.0).abs()
}

/// First contour with the greatest area
fn largest_contour(contours: &[Contour<i32>]) -> Option<&Contour<i32>> {
    let mut best: Option<(&Contour<i32>, f64)> = None;
    for contour in contours {
        let area = contour_area(&contour.points);
        if best.map_or(true, |(_, a)| area > a) {
            best = Some((contour, area));
        }
    }
    best.map(|(c, _)| c)
}

/// Center of the inclusive bounding rectangle, truncated
fn bounding_rect_center(contour: &Contour<i32>) -> Option<(i32, i32)> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;

    let w = max_x - min_x + 1;
    let h = max_y - min_y + 1;
    Some((min_x + w / 2, min_y + h / 2))
}
