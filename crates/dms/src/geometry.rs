//! Pixel and screen-space points

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate (landmarks, iris centroids)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Integer midpoint, truncating toward zero
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2, (self.y + other.y) / 2)
    }

    pub fn to_position(self) -> Position {
        Position::new(f64::from(self.x), f64::from(self.y))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

/// Sub-pixel position (averaged pixel positions, mapped screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Drop the fractional part of both coordinates (toward zero)
    pub fn trunc(self) -> Position {
        Position::new(self.x.trunc(), self.y.trunc())
    }

    /// Average of two pixel points
    pub fn average(a: Point, b: Point) -> Position {
        Position::new(
            f64::from(a.x + b.x) / 2.0,
            f64::from(a.y + b.y) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(Point::new(0, 0).distance(&Point::new(3, 4)), 5.0);
    }

    #[test]
    fn test_midpoint_truncates() {
        assert_eq!(Point::new(1, 2).midpoint(&Point::new(4, 5)), Point::new(2, 3));
    }

    #[test]
    fn test_average_keeps_fraction() {
        let avg = Position::average(Point::new(1, 2), Point::new(4, 5));
        assert_eq!(avg, Position::new(2.5, 3.5));
    }

    #[test]
    fn test_trunc_rounds_toward_zero() {
        assert_eq!(Position::new(12.9, -3.7).trunc(), Position::new(12.0, -3.0));
        assert_eq!(Position::new(-0.5, 0.5).trunc(), Position::new(0.0, 0.0));
    }
}
