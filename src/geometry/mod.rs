//! Outline geometry used as anchorage reference shapes.
//!
//! This module is organized into submodules:
//! - `curve`: segments and beziers, the pieces every outline decomposes into
//! - `ellipse`: axis-aligned ellipse with closed-form line intersection
//! - `path`: multi-contour paths
//! - `roots`: polynomial root finding for curve/line intersection

pub mod curve;
pub mod ellipse;
pub mod path;
pub mod roots;

pub use curve::{CubicBezier, Curve, QuadBezier, Segment, nearest_of};
pub use ellipse::Ellipse;
pub use path::{Contour, Path};

use glam::{DAffine2, DVec2};

use crate::defaults::EPSILON;
use crate::types::Rect;

use path::even_odd;

/// A shape or curve in some node's local coordinate space
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Segment(Segment),
    Polyline(Vec<DVec2>),
    Polygon(Vec<DVec2>),
    Rect(Rect),
    Ellipse(Ellipse),
    Curve(Curve),
    Path(Path),
}

impl From<Rect> for Geometry {
    fn from(r: Rect) -> Self {
        Geometry::Rect(r)
    }
}

impl From<Ellipse> for Geometry {
    fn from(e: Ellipse) -> Self {
        Geometry::Ellipse(e)
    }
}

impl From<Path> for Geometry {
    fn from(p: Path) -> Self {
        Geometry::Path(p)
    }
}

impl From<Segment> for Geometry {
    fn from(s: Segment) -> Self {
        Geometry::Segment(s)
    }
}

impl From<Curve> for Geometry {
    fn from(c: Curve) -> Self {
        Geometry::Curve(c)
    }
}

/// Segments joining consecutive points, skipping zero-length ones
fn polyline_segments(points: &[DVec2], closed: bool) -> Vec<Curve> {
    let mut out: Vec<Curve> = points
        .windows(2)
        .map(|w| Segment::new(w[0], w[1]))
        .filter(|s| !s.is_degenerate())
        .map(Curve::Segment)
        .collect();
    if closed && points.len() > 2 {
        let closing = Segment::new(points[points.len() - 1], points[0]);
        if !closing.is_degenerate() {
            out.push(Curve::Segment(closing));
        }
    }
    out
}

/// True when the linear part of `t` has no rotation or shear
fn is_axis_aligned(t: &DAffine2) -> bool {
    t.matrix2.x_axis.y.abs() < EPSILON && t.matrix2.y_axis.x.abs() < EPSILON
}

impl Geometry {
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        Geometry::Rect(Rect::from_origin_size(x, y, w, h))
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Geometry::Segment(s) => Rect::new(s.p0, s.p1),
            Geometry::Polyline(pts) | Geometry::Polygon(pts) => Rect::from_points(pts.iter().copied()),
            Geometry::Rect(r) => *r,
            Geometry::Ellipse(e) => e.bounds(),
            Geometry::Curve(c) => c.bounds(),
            Geometry::Path(p) => p.bounds(),
        }
    }

    /// Whether the geometry encloses an area (closed shapes and paths)
    pub fn is_area(&self) -> bool {
        matches!(
            self,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Ellipse(_) | Geometry::Path(_)
        )
    }

    /// Decompose into outline curves.
    ///
    /// Closed shapes yield their boundary, open curves yield themselves and
    /// paths yield the curves of every contour.
    pub fn outline(&self) -> Vec<Curve> {
        match self {
            Geometry::Segment(s) => vec![Curve::Segment(*s)],
            Geometry::Polyline(pts) => polyline_segments(pts, false),
            Geometry::Polygon(pts) => polyline_segments(pts, true),
            Geometry::Rect(r) => polyline_segments(&r.corners(), true),
            Geometry::Ellipse(e) => e.to_cubics().into_iter().map(Curve::Cubic).collect(),
            Geometry::Curve(c) => vec![*c],
            Geometry::Path(p) => p.curves().copied().collect(),
        }
    }

    /// Outline curves grouped by contour. Only paths have more than one.
    pub fn outline_contours(&self) -> Vec<Vec<Curve>> {
        match self {
            Geometry::Path(p) => p
                .contours()
                .iter()
                .filter(|c| !c.curves.is_empty())
                .map(|c| c.curves.clone())
                .collect(),
            _ => vec![self.outline()],
        }
    }

    /// Containment test. Areas count their boundary as inside; open
    /// geometries contain only the points lying on them.
    pub fn contains(&self, p: DVec2) -> bool {
        match self {
            Geometry::Rect(r) => r.contains(p),
            Geometry::Ellipse(e) => e.contains(p),
            Geometry::Polygon(pts) => {
                self.outline().iter().any(|c| c.contains(p)) || even_odd(pts, p)
            }
            Geometry::Path(path) => path.contains(p),
            Geometry::Segment(_) | Geometry::Polyline(_) | Geometry::Curve(_) => {
                self.outline().iter().any(|c| c.contains(p))
            }
        }
    }

    /// Map the geometry through an affine transform.
    ///
    /// Rectangles and ellipses keep their kind under scale and translation;
    /// with rotation or shear they become a polygon and a bezier path.
    pub fn transformed(&self, t: &DAffine2) -> Geometry {
        let m = |p: DVec2| t.transform_point2(p);
        match self {
            Geometry::Segment(s) => Geometry::Segment(s.transformed(t)),
            Geometry::Polyline(pts) => Geometry::Polyline(pts.iter().map(|p| m(*p)).collect()),
            Geometry::Polygon(pts) => Geometry::Polygon(pts.iter().map(|p| m(*p)).collect()),
            Geometry::Rect(r) if is_axis_aligned(t) => Geometry::Rect(Rect::new(m(r.min), m(r.max))),
            Geometry::Rect(r) => Geometry::Polygon(r.corners().into_iter().map(m).collect()),
            Geometry::Ellipse(e) if is_axis_aligned(t) => Geometry::Ellipse(Ellipse::new(
                m(e.center),
                e.radii.x * t.matrix2.x_axis.x,
                e.radii.y * t.matrix2.y_axis.y,
            )),
            Geometry::Ellipse(e) => {
                let mut path = Path::new();
                for (i, c) in e.to_cubics().iter().enumerate() {
                    if i == 0 {
                        path = path.move_to(m(c.p0));
                    }
                    path = path.cubic_to(m(c.p1), m(c.p2), m(c.p3));
                }
                Geometry::Path(path.close())
            }
            Geometry::Curve(c) => Geometry::Curve(c.transformed(t)),
            Geometry::Path(p) => Geometry::Path(p.transformed(t)),
        }
    }
}
