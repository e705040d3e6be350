#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use diagram_anchors::parameter::AnchoredReferencePoint;
use diagram_anchors::{Anchor, AnchorKey, Geometry, NodeId, PositionChange, SceneGraph, Strategy};
use glam::DVec2;

/// Install a subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct World {
    pub scene: SceneGraph,
    pub root: NodeId,
    pub shape: NodeId,
    pub wire: NodeId,
    pub anchor: Anchor,
}

/// A realized tree holding a 100x100 square at the origin and an empty
/// sibling node carrying the anchored keys
pub fn world(strategy: impl Into<Strategy>) -> World {
    init_tracing();
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    scene.set_realized(root, true).unwrap();
    let shape = scene
        .add_shape(root, Geometry::rect(0.0, 0.0, 100.0, 100.0))
        .unwrap();
    let wire = scene.add_child(root).unwrap();
    let anchor = Anchor::with_anchorage(&mut scene, strategy, Some(shape)).unwrap();
    scene.take_changes();
    World {
        scene,
        root,
        shape,
        wire,
        anchor,
    }
}

impl World {
    pub fn key(&self, role: &str) -> AnchorKey {
        AnchorKey::new(self.wire, role).unwrap()
    }

    /// Attach `role` with a fixed reference point
    pub fn attach_at(&mut self, role: &str, point: DVec2) -> AnchorKey {
        let key = self.key(role);
        self.anchor
            .set_parameter::<AnchoredReferencePoint>(&self.scene, Some(&key), Some(point))
            .unwrap();
        self.anchor.attach(&mut self.scene, key.clone()).unwrap();
        key
    }

    /// Hand pending scene changes to the anchor
    pub fn pump(&mut self) {
        let changes = self.scene.take_changes();
        self.anchor.process(&mut self.scene, &changes);
    }

    pub fn position(&self, key: &AnchorKey) -> DVec2 {
        self.anchor
            .position(key)
            .unwrap()
            .unwrap_or_else(|| panic!("{key} has no position"))
    }

    /// Record every change published by the anchor's position map
    pub fn record(&mut self) -> Rc<RefCell<Vec<PositionChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        self.anchor
            .subscribe_positions(move |change| sink.borrow_mut().push(change.clone()));
        log
    }
}

pub fn assert_close(actual: DVec2, expected: DVec2) {
    assert!(
        actual.distance(expected) < 1e-9,
        "expected {expected}, got {actual}"
    );
}
