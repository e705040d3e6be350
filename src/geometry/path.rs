//! Multi-contour paths built with a fluent API

use glam::{DAffine2, DVec2};

use crate::defaults::FLATTEN_SEGMENTS;
use crate::types::Rect;

use super::curve::{CubicBezier, Curve, QuadBezier, Segment};

/// One connected run of curves
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub curves: Vec<Curve>,
    pub closed: bool,
}

impl Contour {
    /// Vertices of the flattened contour (first point not repeated)
    pub fn flatten(&self) -> Vec<DVec2> {
        let mut points: Vec<DVec2> = Vec::new();
        for curve in &self.curves {
            let pts = curve.flatten(FLATTEN_SEGMENTS);
            let skip = usize::from(!points.is_empty());
            points.extend(pts.into_iter().skip(skip));
        }
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points
    }
}

/// A path made of one or more contours.
///
/// ```
/// use diagram_anchors::geometry::Path;
/// use glam::dvec2;
///
/// let triangle = Path::new()
///     .move_to(dvec2(0.0, 0.0))
///     .line_to(dvec2(10.0, 0.0))
///     .line_to(dvec2(5.0, 8.0))
///     .close();
/// assert_eq!(triangle.contours().len(), 1);
/// assert_eq!(triangle.curves().count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    contours: Vec<Contour>,
    start: DVec2,
    current: DVec2,
    open: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new contour at `p`
    pub fn move_to(mut self, p: DVec2) -> Self {
        self.contours.push(Contour::default());
        self.start = p;
        self.current = p;
        self.open = true;
        self
    }

    fn push(mut self, curve: Curve) -> Self {
        if !self.open {
            self = self.move_to(curve.start());
        }
        self.current = curve.end();
        if let Some(contour) = self.contours.last_mut() {
            contour.curves.push(curve);
        }
        self
    }

    pub fn line_to(self, p: DVec2) -> Self {
        let from = self.current;
        self.push(Curve::Segment(Segment::new(from, p)))
    }

    pub fn quad_to(self, c: DVec2, p: DVec2) -> Self {
        let from = self.current;
        self.push(Curve::Quad(QuadBezier::new(from, c, p)))
    }

    pub fn cubic_to(self, c1: DVec2, c2: DVec2, p: DVec2) -> Self {
        let from = self.current;
        self.push(Curve::Cubic(CubicBezier::new(from, c1, c2, p)))
    }

    /// Close the current contour, adding a closing line if needed
    pub fn close(mut self) -> Self {
        if !self.open {
            return self;
        }
        if self.current != self.start {
            let (from, to) = (self.current, self.start);
            self = self.push(Curve::Segment(Segment::new(from, to)));
        }
        if let Some(contour) = self.contours.last_mut() {
            contour.closed = true;
        }
        self.current = self.start;
        self.open = false;
        self
    }

    pub fn from_contours(contours: Vec<Contour>) -> Self {
        Path {
            contours,
            ..Self::default()
        }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// All curves of all contours in order
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.contours.iter().flat_map(|c| c.curves.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.curves().next().is_none()
    }

    pub fn bounds(&self) -> Rect {
        self.curves()
            .fold(Rect::empty(), |acc, c| acc.union(&c.bounds()))
    }

    /// Even-odd fill test; open contours are treated as implicitly closed
    pub fn contains(&self, p: DVec2) -> bool {
        if self.curves().any(|c| c.contains(p)) {
            return true;
        }
        let crossings = self
            .contours
            .iter()
            .filter(|c| even_odd(&c.flatten(), p))
            .count();
        crossings % 2 == 1
    }

    pub fn transformed(&self, t: &DAffine2) -> Path {
        Path::from_contours(
            self.contours
                .iter()
                .map(|c| Contour {
                    curves: c.curves.iter().map(|curve| curve.transformed(t)).collect(),
                    closed: c.closed,
                })
                .collect(),
        )
    }
}

/// Ray-casting parity test against a closed polygon
pub(crate) fn even_odd(points: &[DVec2], p: DVec2) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn square(origin: DVec2, size: f64) -> Path {
        Path::new()
            .move_to(origin)
            .line_to(origin + dvec2(size, 0.0))
            .line_to(origin + dvec2(size, size))
            .line_to(origin + dvec2(0.0, size))
            .close()
    }

    #[test]
    fn close_adds_closing_segment() {
        let p = square(dvec2(0.0, 0.0), 10.0);
        assert_eq!(p.curves().count(), 4);
        assert!(p.contours()[0].closed);
    }

    #[test]
    fn close_is_idempotent() {
        let p = square(dvec2(0.0, 0.0), 10.0).close();
        assert_eq!(p.curves().count(), 4);
    }

    #[test]
    fn hole_is_outside_under_even_odd() {
        let outer = square(dvec2(0.0, 0.0), 10.0);
        let inner = square(dvec2(3.0, 3.0), 4.0);
        let mut contours = outer.contours().to_vec();
        contours.extend_from_slice(inner.contours());
        let donut = Path::from_contours(contours);

        assert!(donut.contains(dvec2(1.0, 1.0)));
        assert!(!donut.contains(dvec2(5.0, 5.0)));
        assert!(!donut.contains(dvec2(20.0, 5.0)));
    }

    #[test]
    fn line_to_without_move_starts_at_origin() {
        let p = Path::new().line_to(dvec2(5.0, 0.0));
        assert_eq!(p.curves().count(), 1);
        assert_eq!(p.curves().next().map(|c| c.start()), Some(DVec2::ZERO));
    }

    #[test]
    fn bounds_cover_all_contours() {
        let p = square(dvec2(0.0, 0.0), 2.0).move_to(dvec2(5.0, 5.0)).line_to(dvec2(8.0, 9.0));
        let b = p.bounds();
        assert_eq!(b.min, dvec2(0.0, 0.0));
        assert_eq!(b.max, dvec2(8.0, 9.0));
    }
}
