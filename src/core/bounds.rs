//! Axis-Aligned Rectangles
//!
//! Every entity footprint, detection zone and magic area is a `Bounds`.
//! Edges are inclusive: rectangles that merely touch still intersect.

use serde::{Serialize, Deserialize};

/// Axis-aligned rectangle anchored at its minimum corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Extent along +X.
    pub width: f64,
    /// Extent along +Y.
    pub height: f64,
}

impl Bounds {
    /// Create a rectangle from its minimum corner and size.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the given size with its origin at zero.
    #[inline]
    pub const fn sized(width: f64, height: f64) -> Self {
        Self { x: 0.0, y: 0.0, width, height }
    }

    /// Right edge.
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive overlap test.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.max_x() < self.x
            || other.x > self.max_x()
            || other.max_y() < self.y
            || other.y > self.max_y())
    }

    /// Squared distance between the centres of two rectangles.
    pub fn center_distance_squared(&self, other: &Bounds) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).powi(2) + (ay - by).powi(2)
    }

    /// Shift by a delta.
    #[inline]
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}
