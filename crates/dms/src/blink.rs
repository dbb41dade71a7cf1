//! Eye aspect ratio (EAR)

use crate::landmarks::EyeRegion;

/// Reported when the eye has no horizontal extent; treated as a closed eye
pub const CLOSED_EAR: f64 = 0.0;

/// `EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|)` over the six contour points.
///
/// Low values indicate a closing or blinking eye. A zero-width contour
/// yields [`CLOSED_EAR`].
pub fn eye_aspect_ratio(eye: &EyeRegion) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = eye.points;

    let horizontal = p1.distance(&p4);
    if horizontal == 0.0 {
        return CLOSED_EAR;
    }

    (p2.distance(&p6) + p3.distance(&p5)) / (2.0 * horizontal)
}

/// Both eyes below `threshold`
pub fn eyes_closed(ear_left: f64, ear_right: f64, threshold: f64) -> bool {
    ear_left < threshold && ear_right < threshold
}
