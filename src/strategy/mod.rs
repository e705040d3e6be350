//! Computation strategies.
//!
//! A strategy turns the anchorage reference geometry and one anchored
//! reference point into a scene-space position. The set of strategies is
//! closed:
//! - `NearestProjection`: closest point on the outline
//! - `OrthogonalProjection`: axis-aligned projection with an orientation hint
//! - `ChopBox`: line from the shape's center, cut at the outline
//!
//! The last two fall back to nearest projection when their own construction
//! yields nothing.

mod chop_box;
mod orthogonal;
mod projection;

pub use chop_box::ChopBox;
pub use orthogonal::OrthogonalProjection;
pub use projection::NearestProjection;

use enum_dispatch::enum_dispatch;
use glam::{DAffine2, DVec2};

use crate::anchor::parameter::{
    AnchorageReferenceGeometry, AnchoredReferencePoint, ParameterFactory, ParameterSet,
    ParameterType,
};
use crate::geometry::{Geometry, nearest_of};
use crate::scene::{NodeId, Scene};

/// Contract every strategy fulfils
#[enum_dispatch]
pub trait ComputationStrategy {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Parameter types this strategy reads. The anchor seeds missing ones
    /// and drops the rest when strategies are swapped.
    fn required_parameters(&self) -> &'static [ParameterType];

    /// Default constructor for a parameter type this strategy requires
    fn parameter_factory(&self, ty: ParameterType) -> Option<ParameterFactory>;

    /// Compute the position in scene coordinates.
    ///
    /// Mandatory parameters are guaranteed present. `None` means the
    /// geometry yields no position right now.
    fn compute_position(
        &self,
        scene: &dyn Scene,
        anchorage: NodeId,
        anchored: NodeId,
        params: &ParameterSet<'_>,
    ) -> Option<DVec2>;
}

/// The closed set of strategies an anchor can use
#[enum_dispatch(ComputationStrategy)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NearestProjection,
    OrthogonalProjection,
    ChopBox,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::NearestProjection(NearestProjection)
    }
}

/// Factories for the two parameters every projection strategy shares
fn projection_factory(ty: ParameterType) -> Option<ParameterFactory> {
    use crate::anchor::parameter::ParameterSpec;

    match ty {
        ParameterType::AnchorageReferenceGeometry => Some(AnchorageReferenceGeometry::create),
        ParameterType::AnchoredReferencePoint => Some(AnchoredReferencePoint::create),
        ParameterType::PreferredOrientation => None,
    }
}

// ============================================================================
// Shared inputs
// ============================================================================

/// Strategy inputs resolved into scene space
struct SceneInputs<'a> {
    /// Reference geometry in anchorage-local space
    local: &'a Geometry,
    /// Anchorage local-to-scene transform
    to_scene: DAffine2,
    /// Reference geometry in scene space
    geometry: Geometry,
    /// Anchored reference point in scene space
    reference: DVec2,
}

impl<'a> SceneInputs<'a> {
    fn resolve(
        scene: &dyn Scene,
        anchorage: NodeId,
        anchored: NodeId,
        params: &ParameterSet<'a>,
    ) -> Option<Self> {
        let local = params.value::<AnchorageReferenceGeometry>()?;
        let point = params.value::<AnchoredReferencePoint>()?;
        let to_scene = scene.local_to_scene(anchorage)?;
        let reference = scene.local_to_scene(anchored)?.transform_point2(*point);
        Some(SceneInputs {
            local,
            to_scene,
            geometry: local.transformed(&to_scene),
            reference,
        })
    }
}

/// Closest point over all outline curves; the first minimal candidate wins
pub fn project_nearest(geometry: &Geometry, reference: DVec2) -> Option<DVec2> {
    nearest_of(
        geometry.outline().iter().map(|c| c.nearest_point(reference)),
        reference,
    )
}
