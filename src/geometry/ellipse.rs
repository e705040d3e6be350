//! Axis-aligned ellipse with a closed-form line intersection

use glam::{DVec2, dvec2};

use crate::defaults::{KAPPA, ON_CURVE_TOLERANCE};
use crate::types::Rect;

use super::curve::{CubicBezier, Segment};
use super::roots::solve_quadratic;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: DVec2,
    pub radii: DVec2,
}

impl Ellipse {
    pub fn new(center: DVec2, rx: f64, ry: f64) -> Self {
        Ellipse {
            center,
            radii: dvec2(rx.abs(), ry.abs()),
        }
    }

    pub fn circle(center: DVec2, r: f64) -> Self {
        Ellipse::new(center, r, r)
    }

    /// Ellipse inscribed in the given bounds
    pub fn from_bounds(bounds: Rect) -> Self {
        Ellipse::new(bounds.center(), bounds.width() / 2.0, bounds.height() / 2.0)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.center - self.radii, self.center + self.radii)
    }

    pub fn is_degenerate(&self) -> bool {
        self.radii.x <= 0.0 || self.radii.y <= 0.0
    }

    /// Closed containment test (boundary counts as inside)
    pub fn contains(&self, p: DVec2) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let q = (p - self.center) / self.radii;
        q.length() <= 1.0 + ON_CURVE_TOLERANCE
    }

    /// Points where `line` crosses the ellipse outline.
    ///
    /// Substituting the segment `p0 + s * d` into the unit-circle form of the
    /// ellipse gives a quadratic in `s`; roots within `[0, 1]` are kept.
    pub fn intersect_segment(&self, line: &Segment) -> Vec<DVec2> {
        if self.is_degenerate() || line.is_degenerate() {
            return Vec::new();
        }
        let a = (line.p0 - self.center) / self.radii;
        let d = line.direction() / self.radii;

        let mut hits: Vec<DVec2> = Vec::new();
        for s in solve_quadratic(a.dot(a) - 1.0, 2.0 * a.dot(d), d.dot(d)) {
            if !(-1e-9..=1.0 + 1e-9).contains(&s) {
                continue;
            }
            let p = line.eval(s.clamp(0.0, 1.0));
            if !hits.iter().any(|h| h.distance(p) <= ON_CURVE_TOLERANCE) {
                hits.push(p);
            }
        }
        hits
    }

    /// Outline as four cubic beziers, clockwise (y down) from the east point
    pub fn to_cubics(&self) -> [CubicBezier; 4] {
        let c = self.center;
        let (rx, ry) = (self.radii.x, self.radii.y);
        let (kx, ky) = (KAPPA * rx, KAPPA * ry);

        let east = c + dvec2(rx, 0.0);
        let south = c + dvec2(0.0, ry);
        let west = c - dvec2(rx, 0.0);
        let north = c - dvec2(0.0, ry);

        [
            CubicBezier::new(east, east + dvec2(0.0, ky), south + dvec2(kx, 0.0), south),
            CubicBezier::new(south, south - dvec2(kx, 0.0), west + dvec2(0.0, ky), west),
            CubicBezier::new(west, west - dvec2(0.0, ky), north - dvec2(kx, 0.0), north),
            CubicBezier::new(north, north + dvec2(kx, 0.0), east - dvec2(0.0, ky), east),
        ]
    }
}
