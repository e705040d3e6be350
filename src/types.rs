//! Small shared value types: bounds, orientation, finiteness checks.

use std::fmt;

use glam::{DVec2, dvec2};

/// Check that both components of a point are finite (not NaN or infinite)
#[inline]
pub fn is_finite_point(p: DVec2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Axis preference for orthogonal projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    /// Create a rectangle from two opposite corners (any order)
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Rect {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a rectangle from origin and size
    pub fn from_origin_size(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect::new(dvec2(x, y), dvec2(x + w, y + h))
    }

    /// Create an empty rectangle (will expand on first point)
    pub fn empty() -> Self {
        Rect {
            min: DVec2::splat(f64::MAX),
            max: DVec2::splat(f64::MIN),
        }
    }

    /// Smallest rectangle containing all points
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Self {
        let mut r = Rect::empty();
        for p in points {
            r.expand_point(p);
        }
        r
    }

    /// Check if the rectangle is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand to include another rectangle
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Closed containment test (boundary counts as inside)
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Containment test with the boundary pushed outwards by `margin`
    pub fn contains_with_margin(&self, p: DVec2, margin: f64) -> bool {
        p.x >= self.min.x - margin
            && p.x <= self.max.x + margin
            && p.y >= self.min.y - margin
            && p.y <= self.max.y + margin
    }

    /// Corners in outline order: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            dvec2(self.max.x, self.min.y),
            self.max,
            dvec2(self.min.x, self.max.y),
        ]
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::empty()
    }
}
