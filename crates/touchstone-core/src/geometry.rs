//! Geometric primitives for pointer coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A 2D point in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Origin point (0, 0)
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle in degrees of the vector from `self` to `other`.
    ///
    /// Zero points right, positive angles go clockwise in screen space
    /// (y grows downwards).
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dy.atan2(dx).to_degrees()
    }

    /// Round both coordinates to the nearest integer.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    /// Linear interpolation between two points.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Rounded arithmetic mean of a set of points.
    ///
    /// Returns `None` for an empty set.
    #[must_use]
    pub fn centroid(points: &[Self]) -> Option<Self> {
        match points {
            [] => None,
            [only] => Some(only.rounded()),
            _ => {
                let (sx, sy) = points
                    .iter()
                    .fold((0.0_f32, 0.0_f32), |(sx, sy), p| (sx + p.x, sy + p.y));
                let n = points.len() as f32;
                Some(Self::new(sx / n, sy / n).rounded())
            }
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}
