//! Outline curves: line segments and quadratic/cubic beziers.
//!
//! Every outline a strategy works with is decomposed into these. All curves
//! expose the same small set of queries: evaluation, nearest point, on-curve
//! test, and intersection with a line segment.

use glam::{DAffine2, DVec2};

use crate::defaults::{BEZIER_SAMPLES, EPSILON, NEAREST_REFINE_STEPS, ON_CURVE_TOLERANCE};
use crate::types::Rect;

use super::roots::solve_cubic;

/// Parameter slack when accepting roots at the ends of `[0, 1]`
const PARAM_SLACK: f64 = 1e-9;

/// 2D cross product (z component)
#[inline]
fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Pick the point closest to `reference`; the first minimal candidate wins
pub fn nearest_of(candidates: impl IntoIterator<Item = DVec2>, reference: DVec2) -> Option<DVec2> {
    let mut best: Option<(DVec2, f64)> = None;
    for c in candidates {
        let d = c.distance_squared(reference);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((c, d)),
        }
    }
    best.map(|(p, _)| p)
}

// ============================================================================
// Segment
// ============================================================================

/// A straight line segment from `p0` to `p1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p0: DVec2,
    pub p1: DVec2,
}

impl Segment {
    pub fn new(p0: DVec2, p1: DVec2) -> Self {
        Segment { p0, p1 }
    }

    pub fn direction(&self) -> DVec2 {
        self.p1 - self.p0
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction().length_squared() < EPSILON * EPSILON
    }

    pub fn eval(&self, t: f64) -> DVec2 {
        self.p0.lerp(self.p1, t)
    }

    pub fn nearest_point(&self, p: DVec2) -> DVec2 {
        let d = self.direction();
        let len2 = d.length_squared();
        if len2 < EPSILON * EPSILON {
            return self.p0;
        }
        let t = ((p - self.p0).dot(d) / len2).clamp(0.0, 1.0);
        self.eval(t)
    }

    pub fn contains(&self, p: DVec2) -> bool {
        self.nearest_point(p).distance(p) <= ON_CURVE_TOLERANCE
    }

    /// Parameter of `p` projected onto the infinite carrier line
    fn param_of(&self, p: DVec2) -> f64 {
        let d = self.direction();
        (p - self.p0).dot(d) / d.length_squared()
    }

    /// Whether both segments lie on the same carrier line
    fn is_collinear_with(&self, other: &Segment) -> bool {
        let d = self.direction();
        let len = d.length();
        if len < EPSILON {
            return false;
        }
        let dist0 = cross(d, other.p0 - self.p0).abs() / len;
        let dist1 = cross(d, other.p1 - self.p0).abs() / len;
        dist0 <= ON_CURVE_TOLERANCE && dist1 <= ON_CURVE_TOLERANCE
    }

    /// The shared piece of two collinear segments, if they overlap
    pub fn overlap(&self, other: &Segment) -> Option<Segment> {
        if self.is_degenerate() || other.is_degenerate() || !self.is_collinear_with(other) {
            return None;
        }
        let a = self.param_of(other.p0);
        let b = self.param_of(other.p1);
        let lo = a.min(b).max(0.0);
        let hi = a.max(b).min(1.0);
        if lo > hi + PARAM_SLACK {
            return None;
        }
        Some(Segment::new(self.eval(lo), self.eval(hi.max(lo))))
    }

    /// Intersection points with another segment.
    ///
    /// Collinear overlapping segments report the endpoints of their overlap.
    pub fn intersect_segment(&self, other: &Segment) -> Vec<DVec2> {
        if self.is_degenerate() || other.is_degenerate() {
            return Vec::new();
        }
        let r = self.direction();
        let s = other.direction();
        let denom = cross(r, s);
        if denom.abs() < EPSILON * r.length() * s.length() {
            return match self.overlap(other) {
                Some(ov) if ov.is_degenerate() => vec![ov.p0],
                Some(ov) => vec![ov.p0, ov.p1],
                None => Vec::new(),
            };
        }
        let qp = other.p0 - self.p0;
        let t = cross(qp, s) / denom;
        let u = cross(qp, r) / denom;
        if (-PARAM_SLACK..=1.0 + PARAM_SLACK).contains(&t)
            && (-PARAM_SLACK..=1.0 + PARAM_SLACK).contains(&u)
        {
            vec![self.eval(t.clamp(0.0, 1.0))]
        } else {
            Vec::new()
        }
    }

    pub fn transformed(&self, t: &DAffine2) -> Segment {
        Segment::new(t.transform_point2(self.p0), t.transform_point2(self.p1))
    }
}

// ============================================================================
// Beziers
// ============================================================================

/// Quadratic bezier with one control point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadBezier {
    pub p0: DVec2,
    pub p1: DVec2,
    pub p2: DVec2,
}

impl QuadBezier {
    pub fn new(p0: DVec2, p1: DVec2, p2: DVec2) -> Self {
        QuadBezier { p0, p1, p2 }
    }

    pub fn eval(&self, t: f64) -> DVec2 {
        let mt = 1.0 - t;
        self.p0 * (mt * mt) + self.p1 * (2.0 * mt * t) + self.p2 * (t * t)
    }

    /// Power-basis coefficients: B(t) = c0 + c1 t + c2 t^2
    fn power_basis(&self) -> [DVec2; 4] {
        [
            self.p0,
            (self.p1 - self.p0) * 2.0,
            self.p0 - self.p1 * 2.0 + self.p2,
            DVec2::ZERO,
        ]
    }
}

/// Cubic bezier with two control points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: DVec2,
    pub p1: DVec2,
    pub p2: DVec2,
    pub p3: DVec2,
}

impl CubicBezier {
    pub fn new(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2) -> Self {
        CubicBezier { p0, p1, p2, p3 }
    }

    pub fn eval(&self, t: f64) -> DVec2 {
        let mt = 1.0 - t;
        self.p0 * (mt * mt * mt)
            + self.p1 * (3.0 * mt * mt * t)
            + self.p2 * (3.0 * mt * t * t)
            + self.p3 * (t * t * t)
    }

    /// Power-basis coefficients: B(t) = c0 + c1 t + c2 t^2 + c3 t^3
    fn power_basis(&self) -> [DVec2; 4] {
        [
            self.p0,
            (self.p1 - self.p0) * 3.0,
            (self.p0 - self.p1 * 2.0 + self.p2) * 3.0,
            self.p3 - self.p0 + (self.p1 - self.p2) * 3.0,
        ]
    }
}

// ============================================================================
// Curve
// ============================================================================

/// One piece of an outline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Segment(Segment),
    Quad(QuadBezier),
    Cubic(CubicBezier),
}

impl From<Segment> for Curve {
    fn from(s: Segment) -> Self {
        Curve::Segment(s)
    }
}

impl From<QuadBezier> for Curve {
    fn from(q: QuadBezier) -> Self {
        Curve::Quad(q)
    }
}

impl From<CubicBezier> for Curve {
    fn from(c: CubicBezier) -> Self {
        Curve::Cubic(c)
    }
}

impl Curve {
    pub fn start(&self) -> DVec2 {
        match self {
            Curve::Segment(s) => s.p0,
            Curve::Quad(q) => q.p0,
            Curve::Cubic(c) => c.p0,
        }
    }

    pub fn end(&self) -> DVec2 {
        match self {
            Curve::Segment(s) => s.p1,
            Curve::Quad(q) => q.p2,
            Curve::Cubic(c) => c.p3,
        }
    }

    pub fn eval(&self, t: f64) -> DVec2 {
        match self {
            Curve::Segment(s) => s.eval(t),
            Curve::Quad(q) => q.eval(t),
            Curve::Cubic(c) => c.eval(t),
        }
    }

    fn control_points(&self) -> Vec<DVec2> {
        match *self {
            Curve::Segment(s) => vec![s.p0, s.p1],
            Curve::Quad(q) => vec![q.p0, q.p1, q.p2],
            Curve::Cubic(c) => vec![c.p0, c.p1, c.p2, c.p3],
        }
    }

    /// Bounds of the control polygon (always contains the curve)
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.control_points())
    }

    /// Closest point on the curve to `p`
    pub fn nearest_point(&self, p: DVec2) -> DVec2 {
        match self {
            Curve::Segment(s) => s.nearest_point(p),
            _ => self.nearest_point_sampled(p),
        }
    }

    /// Coarse uniform sampling followed by golden-section refinement around
    /// the best sample.
    fn nearest_point_sampled(&self, p: DVec2) -> DVec2 {
        let n = BEZIER_SAMPLES;
        let dist = |t: f64| self.eval(t).distance_squared(p);

        let mut best_i = 0;
        let mut best_d = f64::INFINITY;
        for i in 0..=n {
            let d = dist(i as f64 / n as f64);
            if d < best_d {
                best_d = d;
                best_i = i;
            }
        }

        let step = 1.0 / n as f64;
        let mut lo = (best_i as f64 - 1.0).max(0.0) * step;
        let mut hi = (best_i as f64 + 1.0).min(n as f64) * step;
        let ratio = 0.5 * (5.0_f64.sqrt() - 1.0);
        let mut a = hi - ratio * (hi - lo);
        let mut b = lo + ratio * (hi - lo);
        let mut fa = dist(a);
        let mut fb = dist(b);
        for _ in 0..NEAREST_REFINE_STEPS {
            if fa < fb {
                hi = b;
                b = a;
                fb = fa;
                a = hi - ratio * (hi - lo);
                fa = dist(a);
            } else {
                lo = a;
                a = b;
                fa = fb;
                b = lo + ratio * (hi - lo);
                fb = dist(b);
            }
        }
        let refined = self.eval(0.5 * (lo + hi));
        let sampled = self.eval(best_i as f64 * step);
        if refined.distance_squared(p) <= sampled.distance_squared(p) {
            refined
        } else {
            sampled
        }
    }

    /// Whether `p` lies on the curve (within tolerance)
    pub fn contains(&self, p: DVec2) -> bool {
        if !self.bounds().contains_with_margin(p, ON_CURVE_TOLERANCE) {
            return false;
        }
        self.nearest_point(p).distance(p) <= ON_CURVE_TOLERANCE
    }

    /// Intersection points with a line segment.
    ///
    /// Beziers are intersected exactly: the signed distance of the curve to
    /// the segment's carrier line is a polynomial in t whose roots in `[0, 1]`
    /// are the crossings; each is kept if it falls within the segment.
    pub fn intersect_segment(&self, line: &Segment) -> Vec<DVec2> {
        let basis = match self {
            Curve::Segment(s) => return s.intersect_segment(line),
            Curve::Quad(q) => q.power_basis(),
            Curve::Cubic(c) => c.power_basis(),
        };
        if line.is_degenerate() {
            return Vec::new();
        }

        let d = line.direction();
        let n = d.perp();
        let coeff = |i: usize| {
            let c = if i == 0 { basis[0] - line.p0 } else { basis[i] };
            c.dot(n)
        };

        let (c0, c1, c2, c3) = (coeff(0), coeff(1), coeff(2), coeff(3));
        let len2 = d.length_squared();
        let mut hits = Vec::new();

        if c0.abs().max(c1.abs()).max(c2.abs()).max(c3.abs()) < EPSILON * len2 {
            // The whole curve lies on the carrier line
            for p in [self.start(), self.end(), line.p0, line.p1] {
                if line.contains(p) && self.contains(p) {
                    hits.push(p);
                }
            }
            return hits;
        }

        for t in solve_cubic(c0, c1, c2, c3) {
            if !(-PARAM_SLACK..=1.0 + PARAM_SLACK).contains(&t) {
                continue;
            }
            let p = self.eval(t.clamp(0.0, 1.0));
            let s = (p - line.p0).dot(d) / len2;
            if (-PARAM_SLACK..=1.0 + PARAM_SLACK).contains(&s) {
                if !hits.iter().any(|h: &DVec2| h.distance(p) <= ON_CURVE_TOLERANCE) {
                    hits.push(p);
                }
            }
        }
        hits
    }

    /// Points along the curve, `segments` pieces per bezier
    pub fn flatten(&self, segments: usize) -> Vec<DVec2> {
        match self {
            Curve::Segment(s) => vec![s.p0, s.p1],
            _ => (0..=segments)
                .map(|i| self.eval(i as f64 / segments as f64))
                .collect(),
        }
    }

    pub fn transformed(&self, t: &DAffine2) -> Curve {
        let m = |p: DVec2| t.transform_point2(p);
        match *self {
            Curve::Segment(s) => Curve::Segment(s.transformed(t)),
            Curve::Quad(q) => Curve::Quad(QuadBezier::new(m(q.p0), m(q.p1), m(q.p2))),
            Curve::Cubic(c) => Curve::Cubic(CubicBezier::new(m(c.p0), m(c.p1), m(c.p2), m(c.p3))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn assert_close(a: DVec2, b: DVec2) {
        assert!(a.distance(b) < 1e-6, "expected {b}, got {a}");
    }

    #[test]
    fn segment_nearest_clamps_to_ends() {
        let s = Segment::new(dvec2(0.0, 0.0), dvec2(10.0, 0.0));
        assert_close(s.nearest_point(dvec2(5.0, 3.0)), dvec2(5.0, 0.0));
        assert_close(s.nearest_point(dvec2(-4.0, 1.0)), dvec2(0.0, 0.0));
        assert_close(s.nearest_point(dvec2(14.0, -1.0)), dvec2(10.0, 0.0));
    }

    #[test]
    fn segments_cross() {
        let a = Segment::new(dvec2(0.0, 0.0), dvec2(10.0, 10.0));
        let b = Segment::new(dvec2(0.0, 10.0), dvec2(10.0, 0.0));
        let hits = a.intersect_segment(&b);
        assert_eq!(hits.len(), 1);
        assert_close(hits[0], dvec2(5.0, 5.0));
    }

    #[test]
    fn segments_miss() {
        let a = Segment::new(dvec2(0.0, 0.0), dvec2(1.0, 0.0));
        let b = Segment::new(dvec2(2.0, -1.0), dvec2(2.0, 1.0));
        assert!(a.intersect_segment(&b).is_empty());
    }

    #[test]
    fn collinear_overlap_reports_endpoints() {
        let a = Segment::new(dvec2(0.0, 0.0), dvec2(10.0, 0.0));
        let b = Segment::new(dvec2(5.0, 0.0), dvec2(20.0, 0.0));
        let ov = a.overlap(&b).unwrap();
        assert_close(ov.p0, dvec2(5.0, 0.0));
        assert_close(ov.p1, dvec2(10.0, 0.0));
        assert_eq!(a.intersect_segment(&b).len(), 2);
    }

    #[test]
    fn parallel_disjoint_do_not_overlap() {
        let a = Segment::new(dvec2(0.0, 0.0), dvec2(10.0, 0.0));
        let b = Segment::new(dvec2(0.0, 1.0), dvec2(10.0, 1.0));
        assert!(a.overlap(&b).is_none());
        assert!(a.intersect_segment(&b).is_empty());
    }

    #[test]
    fn quad_intersects_vertical_line_at_apex() {
        // Parabola through (0,0), apex (5,5), (10,0)
        let q = Curve::Quad(QuadBezier::new(dvec2(0.0, 0.0), dvec2(5.0, 10.0), dvec2(10.0, 0.0)));
        let line = Segment::new(dvec2(5.0, -10.0), dvec2(5.0, 20.0));
        let hits = q.intersect_segment(&line);
        assert_eq!(hits.len(), 1);
        assert_close(hits[0], dvec2(5.0, 5.0));
    }

    #[test]
    fn cubic_intersects_horizontal_line_twice() {
        let c = Curve::Cubic(CubicBezier::new(
            dvec2(0.0, 0.0),
            dvec2(0.0, 10.0),
            dvec2(10.0, 10.0),
            dvec2(10.0, 0.0),
        ));
        let line = Segment::new(dvec2(-5.0, 3.0), dvec2(15.0, 3.0));
        let hits = c.intersect_segment(&line);
        assert_eq!(hits.len(), 2);
        for h in hits {
            assert!((h.y - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cubic_nearest_point_matches_apex() {
        let c = Curve::Cubic(CubicBezier::new(
            dvec2(0.0, 0.0),
            dvec2(0.0, 10.0),
            dvec2(10.0, 10.0),
            dvec2(10.0, 0.0),
        ));
        // Symmetric curve: apex at t = 0.5 is (5, 7.5)
        let p = c.nearest_point(dvec2(5.0, 20.0));
        assert!(p.distance(dvec2(5.0, 7.5)) < 1e-6, "got {p}");
        assert!(c.contains(dvec2(5.0, 7.5)));
    }

    #[test]
    fn nearest_of_prefers_first_tie() {
        let r = dvec2(0.0, 0.0);
        let picked = nearest_of([dvec2(1.0, 0.0), dvec2(0.0, 1.0)], r).unwrap();
        assert_eq!(picked, dvec2(1.0, 0.0));
    }
}
