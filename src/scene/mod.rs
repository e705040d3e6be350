//! Host scene boundary.
//!
//! The anchor engine does not own the render tree. It consumes these
//! services from whatever hosts it:
//! - local geometry of a node
//! - node-to-scene transforms
//! - common ancestor lookup and realized-tree membership
//! - change subscriptions (watches)
//!
//! [`SceneGraph`] is an arena-backed implementation of the boundary that
//! hosts (and the tests) can use directly.

mod graph;

pub use graph::SceneGraph;

use std::fmt;

use glam::DAffine2;

use crate::geometry::Geometry;

slotmap::new_key_type! {
    /// Stable identity of a node in the render tree
    pub struct NodeId;
}

/// Handle of a registered watch. Handles are issued in increasing order, so
/// sorting by handle gives registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(pub(crate) u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// What a watch observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchScope {
    /// Reparenting of the node or any ancestor, and realized-state flips
    /// of the tree the node lives in
    Membership,
    /// Local geometry changes of the node, and transform changes of the node
    /// and its ancestors strictly below `ancestor` (the whole chain if none)
    Geometry { ancestor: Option<NodeId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Geometry,
    Transform,
    Membership,
}

/// A queued notification for one watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneChange {
    pub watch: WatchId,
    /// The watched node (not necessarily the node that was mutated)
    pub node: NodeId,
    pub kind: ChangeKind,
}

/// Services the anchor engine needs from its host render tree
pub trait Scene {
    /// Geometry of `node` in its own local coordinate space
    fn geometry(&self, node: NodeId) -> Option<&Geometry>;

    /// Transform from `node`'s local space to the space of its tree root
    fn local_to_scene(&self, node: NodeId) -> Option<DAffine2>;

    /// Nearest node that is an ancestor of (or equal to) both nodes
    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId>;

    /// Whether `node` lives in a tree whose root is realized
    fn is_realized(&self, node: NodeId) -> bool;

    /// Register a watch on `node`
    fn watch(&mut self, node: NodeId, scope: WatchScope) -> WatchId;

    /// Remove a watch; unknown handles are ignored
    fn unwatch(&mut self, watch: WatchId);
}
