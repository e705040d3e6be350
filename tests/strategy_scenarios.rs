mod common;

use common::{assert_close, world};
use diagram_anchors::geometry::Path;
use diagram_anchors::parameter::{AnchoredReferencePoint, ParameterType, PreferredOrientation};
use diagram_anchors::{ChopBox, Geometry, NearestProjection, Orientation, OrthogonalProjection};
use glam::{DAffine2, dvec2};

#[test]
fn chop_box_cuts_at_right_edge() {
    let mut w = world(ChopBox);
    let key = w.attach_at("end", dvec2(150.0, 50.0));
    assert_eq!(w.position(&key), dvec2(100.0, 50.0));
}

#[test]
fn chop_box_keeps_points_on_the_outline() {
    let mut w = world(ChopBox);
    let points = [
        dvec2(100.0, 12.345),
        dvec2(0.0, 99.5),
        dvec2(33.25, 0.0),
        dvec2(100.0, 100.0),
    ];
    for (i, point) in points.into_iter().enumerate() {
        let key = w.attach_at(&format!("k{i}"), point);
        assert_eq!(w.position(&key), point);
    }
}

#[test]
fn chop_box_with_ellipse_anchorage() {
    let mut w = world(ChopBox);
    w.scene
        .set_geometry(
            w.shape,
            Some(Geometry::Ellipse(diagram_anchors::geometry::Ellipse::new(
                dvec2(50.0, 50.0),
                50.0,
                25.0,
            ))),
        )
        .unwrap();
    w.pump();
    let key = w.attach_at("end", dvec2(50.0, -100.0));
    assert_close(w.position(&key), dvec2(50.0, 25.0));
}

#[test]
fn orthogonal_above_top_edge_projects_vertically() {
    let mut w = world(OrthogonalProjection);
    let key = w.attach_at("end", dvec2(50.0, -30.0));
    assert_close(w.position(&key), dvec2(50.0, 0.0));
}

#[test]
fn orthogonal_horizontal_hint_without_candidate() {
    let mut w = world(OrthogonalProjection);
    let key = w.key("end");
    w.anchor
        .set_parameter::<PreferredOrientation>(&w.scene, Some(&key), Some(Orientation::Horizontal))
        .unwrap();
    w.anchor
        .set_parameter::<AnchoredReferencePoint>(&w.scene, Some(&key), Some(dvec2(50.0, 200.0)))
        .unwrap();
    w.anchor.attach(&mut w.scene, key.clone()).unwrap();
    assert_close(w.position(&key), dvec2(50.0, 100.0));
}

#[test]
fn orthogonal_hint_is_decided_per_contour() {
    let mut w = world(OrthogonalProjection);
    // A rail along y = 0 and a far post at x = 500
    let rails = Path::new()
        .move_to(dvec2(0.0, 0.0))
        .line_to(dvec2(100.0, 0.0))
        .move_to(dvec2(500.0, 0.0))
        .line_to(dvec2(500.0, 100.0));
    w.scene.set_geometry(w.shape, Some(Geometry::Path(rails))).unwrap();
    w.pump();

    let key = w.key("end");
    w.anchor
        .set_parameter::<PreferredOrientation>(&w.scene, Some(&key), Some(Orientation::Horizontal))
        .unwrap();
    w.anchor
        .set_parameter::<AnchoredReferencePoint>(&w.scene, Some(&key), Some(dvec2(50.0, 10.0)))
        .unwrap();
    w.anchor.attach(&mut w.scene, key.clone()).unwrap();
    // The post's horizontal hit (500, 10) loses to the rail's (50, 0)
    assert_close(w.position(&key), dvec2(50.0, 0.0));
}

#[test]
fn orthogonal_on_rotated_anchorage() {
    let mut w = world(OrthogonalProjection);
    // Rotated a quarter turn about its center
    let rotate = DAffine2::from_translation(dvec2(50.0, 50.0))
        * DAffine2::from_angle(std::f64::consts::FRAC_PI_2)
        * DAffine2::from_translation(dvec2(-50.0, -50.0));
    w.scene.set_transform(w.shape, rotate).unwrap();
    w.pump();
    let key = w.attach_at("end", dvec2(50.0, -30.0));
    assert_close(w.position(&key), dvec2(50.0, 0.0));
}

#[test]
fn strategy_swap_recomputes_each_key_once() {
    let mut w = world(OrthogonalProjection);
    let keys: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .enumerate()
        .map(|(i, role)| w.attach_at(role, dvec2(150.0, 20.0 * i as f64)))
        .collect();
    for key in &keys {
        w.anchor
            .set_parameter::<PreferredOrientation>(&w.scene, Some(key), Some(Orientation::Vertical))
            .unwrap();
    }

    let before = w.anchor.stats().recomputations;
    w.anchor.set_strategy(&w.scene, NearestProjection).unwrap();
    assert_eq!(w.anchor.stats().recomputations - before, 3);

    let shared: Vec<_> = w.anchor.parameter_store(None).unwrap().types().collect();
    assert_eq!(shared, vec![ParameterType::AnchorageReferenceGeometry]);
    for key in &keys {
        let own: Vec<_> = w.anchor.parameter_store(Some(key)).unwrap().types().collect();
        assert_eq!(own, vec![ParameterType::AnchoredReferencePoint]);
    }
}

#[test]
fn strategy_swap_back_seeds_orientation_again() {
    let mut w = world(NearestProjection);
    let key = w.attach_at("end", dvec2(30.0, 10.0));
    assert_close(w.position(&key), dvec2(30.0, 0.0));

    w.anchor.set_strategy(&w.scene, OrthogonalProjection).unwrap();
    let own = w.anchor.parameter_store(Some(&key)).unwrap();
    assert!(own.contains(ParameterType::PreferredOrientation));

    w.anchor
        .set_parameter::<PreferredOrientation>(&w.scene, Some(&key), Some(Orientation::Horizontal))
        .unwrap();
    assert_close(w.position(&key), dvec2(0.0, 10.0));
}
