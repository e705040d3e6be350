use glam::DVec2;

use super::{ComputationStrategy, SceneInputs, project_nearest, projection_factory};
use crate::anchor::parameter::{ParameterFactory, ParameterSet, ParameterType};
use crate::scene::{NodeId, Scene};

const REQUIRED: &[ParameterType] = &[
    ParameterType::AnchorageReferenceGeometry,
    ParameterType::AnchoredReferencePoint,
];

/// Projects the anchored reference point onto the nearest point of the
/// anchorage outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NearestProjection;

impl ComputationStrategy for NearestProjection {
    fn name(&self) -> &'static str {
        "nearest-projection"
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
        project_nearest(&inputs.geometry, inputs.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Ellipse, Geometry};
    use crate::strategy::test_support::{assert_close, scene_with, stores};
    use glam::{DAffine2, dvec2};

    fn compute(geometry: Geometry, point: DVec2) -> Option<DVec2> {
        let (scene, a, b) = scene_with(geometry.clone());
        let (shared, own) = stores(geometry, point, None);
        NearestProjection.compute_position(&scene, a, b, &ParameterSet::new(&shared, Some(&own)))
    }

    #[test]
    fn outside_point_projects_onto_edge() {
        let p = compute(Geometry::rect(0.0, 0.0, 100.0, 100.0), dvec2(150.0, 50.0)).unwrap();
        assert_close(p, dvec2(100.0, 50.0));
    }

    #[test]
    fn inside_point_projects_onto_nearest_edge() {
        let p = compute(Geometry::rect(0.0, 0.0, 100.0, 100.0), dvec2(90.0, 30.0)).unwrap();
        assert_close(p, dvec2(100.0, 30.0));
    }

    #[test]
    fn circle_projection_is_radial() {
        let circle = Geometry::Ellipse(Ellipse::circle(DVec2::ZERO, 10.0));
        let p = compute(circle, dvec2(30.0, 40.0)).unwrap();
        assert!((p.length() - 10.0).abs() < 1e-2);
        assert!((p.normalize() - dvec2(0.6, 0.8)).length() < 1e-2);
    }

    #[test]
    fn transforms_of_both_nodes_apply() {
        let geometry = Geometry::rect(0.0, 0.0, 10.0, 10.0);
        let (mut scene, a, b) = scene_with(geometry.clone());
        scene.set_transform(a, DAffine2::from_translation(dvec2(100.0, 0.0))).unwrap();
        scene.set_transform(b, DAffine2::from_translation(dvec2(0.0, 5.0))).unwrap();
        let (shared, own) = stores(geometry, dvec2(0.0, 0.0), None);
        let p = NearestProjection
            .compute_position(&scene, a, b, &ParameterSet::new(&shared, Some(&own)))
            .unwrap();
        assert_close(p, dvec2(100.0, 5.0));
    }

    #[test]
    fn empty_outline_yields_nothing() {
        assert_eq!(compute(Geometry::Polygon(Vec::new()), dvec2(1.0, 1.0)), None);
    }
}
