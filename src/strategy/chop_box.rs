//! Center-seeking projection.
//!
//! When the anchorage encloses its own bounding-box center, the connection
//! is cut where the line from that center to the anchored reference point
//! leaves the outline. Everything else falls back to nearest projection.

use glam::DVec2;

use super::{ComputationStrategy, SceneInputs, project_nearest, projection_factory};
use crate::anchor::parameter::{ParameterFactory, ParameterSet, ParameterType};
use crate::geometry::{Geometry, Segment, nearest_of};
use crate::log::trace;
use crate::scene::{NodeId, Scene};

const REQUIRED: &[ParameterType] = &[
    ParameterType::AnchorageReferenceGeometry,
    ParameterType::AnchoredReferencePoint,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChopBox;

impl ComputationStrategy for ChopBox {
    fn name(&self) -> &'static str {
        "chop-box"
    }

    fn required_parameters(&self) -> &'static [ParameterType] {
        REQUIRED
    }

    fn parameter_factory(&self, ty: ParameterType) -> Option<ParameterFactory> {
        projection_factory(ty)
    }

    fn compute_position(
        &self,
        scene: &dyn Scene,
        anchorage: NodeId,
        anchored: NodeId,
        params: &ParameterSet<'_>,
    ) -> Option<DVec2> {
        let inputs = SceneInputs::resolve(scene, anchorage, anchored, params)?;
        let reference = inputs.reference;

        let center = inputs.local.bounds().center();
        if inputs.local.is_area() && inputs.local.contains(center) {
            let center = inputs.to_scene.transform_point2(center);
            if let Some(p) = chop(&inputs.geometry, center, reference) {
                return Some(p);
            }
        }

        trace!(?reference, "chop found no cut, projecting onto nearest point");
        project_nearest(&inputs.geometry, reference)
    }
}

/// Cut the line from `center` to `reference` at the outline.
///
/// Ellipses are intersected in closed form. A reference already on the
/// outline is returned as is.
fn chop(geometry: &Geometry, center: DVec2, reference: DVec2) -> Option<DVec2> {
    let line = Segment::new(center, reference);

    if let Geometry::Ellipse(ellipse) = geometry {
        if let Some(p) = nearest_of(ellipse.intersect_segment(&line), reference) {
            return Some(p);
        }
    }

    let outline = geometry.outline();
    if outline.iter().any(|c| c.contains(reference)) {
        return Some(reference);
    }
    nearest_of(
        outline.iter().flat_map(|c| c.intersect_segment(&line)),
        reference,
    )
}
