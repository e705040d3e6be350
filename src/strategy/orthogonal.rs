//! Axis-aligned projection.
//!
//! For every outline curve the anchored reference point is projected along
//! both axes: horizontally onto points sharing its y coordinate and
//! vertically onto points sharing its x coordinate. Within one contour the
//! nearest candidate of each axis is kept, and an orientation hint makes its
//! axis win whenever that axis has any candidate on the contour. The nearest
//! pick over all contours is the result.

use glam::{DVec2, dvec2};

use super::{ComputationStrategy, SceneInputs, project_nearest, projection_factory};
use crate::anchor::parameter::{
    ParameterFactory, ParameterSet, ParameterSpec, ParameterType, PreferredOrientation,
};
use crate::geometry::{Curve, Segment, nearest_of};
use crate::log::trace;
use crate::scene::{NodeId, Scene};
use crate::types::Orientation;

const REQUIRED: &[ParameterType] = &[
    ParameterType::AnchorageReferenceGeometry,
    ParameterType::AnchoredReferencePoint,
    ParameterType::PreferredOrientation,
];

/// How far the probe line extends past the curve bounds
const PROBE_MARGIN: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrthogonalProjection;

impl ComputationStrategy for OrthogonalProjection {
    fn name(&self) -> &'static str {
        "orthogonal-projection"
    }

    fn required_parameters(&self) -> &'static [ParameterType] {
        REQUIRED
    }

    fn parameter_factory(&self, ty: ParameterType) -> Option<ParameterFactory> {
        match ty {
            ParameterType::PreferredOrientation => Some(PreferredOrientation::create),
            _ => projection_factory(ty),
        }
    }

    fn compute_position(
        &self,
        scene: &dyn Scene,
        anchorage: NodeId,
        anchored: NodeId,
        params: &ParameterSet<'_>,
    ) -> Option<DVec2> {
        let inputs = SceneInputs::resolve(scene, anchorage, anchored, params)?;
        let hint = params.value::<PreferredOrientation>().copied();
        let reference = inputs.reference;

        let candidates = inputs.geometry.outline_contours().into_iter().filter_map(|contour| {
            let horizontal = nearest_of(
                contour
                    .iter()
                    .flat_map(|c| axis_projection(c, reference, Orientation::Horizontal)),
                reference,
            );
            let vertical = nearest_of(
                contour
                    .iter()
                    .flat_map(|c| axis_projection(c, reference, Orientation::Vertical)),
                reference,
            );
            choose(horizontal, vertical, reference, hint)
        });

        match nearest_of(candidates, reference) {
            Some(p) => Some(p),
            None => {
                trace!(?reference, "no axis-aligned projection, projecting onto nearest point");
                project_nearest(&inputs.geometry, reference)
            }
        }
    }
}

/// Points of `curve` reachable from `reference` along one axis.
///
/// A segment lying on the probe line contributes the endpoints of the
/// overlap; any other curve contributes its crossings with the probe.
fn axis_projection(curve: &Curve, reference: DVec2, axis: Orientation) -> Vec<DVec2> {
    let bounds = curve.bounds();
    let probe = match axis {
        Orientation::Horizontal => Segment::new(
            dvec2(bounds.min.x - PROBE_MARGIN, reference.y),
            dvec2(bounds.max.x + PROBE_MARGIN, reference.y),
        ),
        Orientation::Vertical => Segment::new(
            dvec2(reference.x, bounds.min.y - PROBE_MARGIN),
            dvec2(reference.x, bounds.max.y + PROBE_MARGIN),
        ),
    };
    if let Curve::Segment(s) = curve {
        if let Some(overlap) = s.overlap(&probe) {
            return vec![overlap.p0, overlap.p1];
        }
    }
    curve.intersect_segment(&probe)
}

/// Pick between the best candidate of each axis.
///
/// A hinted axis with a candidate wins outright. Otherwise the nearer
/// candidate wins and an exact tie goes to the vertical one.
fn choose(
    horizontal: Option<DVec2>,
    vertical: Option<DVec2>,
    reference: DVec2,
    hint: Option<Orientation>,
) -> Option<DVec2> {
    match (hint, horizontal, vertical) {
        (Some(Orientation::Horizontal), Some(h), _) => Some(h),
        (Some(Orientation::Vertical), _, Some(v)) => Some(v),
        (_, Some(h), Some(v)) => {
            if h.distance_squared(reference) < v.distance_squared(reference) {
                Some(h)
            } else {
                Some(v)
            }
        }
        (_, h, v) => h.or(v),
    }
}
