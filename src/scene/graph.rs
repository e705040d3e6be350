//! Arena-backed render tree with watch notifications

use std::collections::BTreeMap;

use glam::DAffine2;
use slotmap::SlotMap;

use crate::errors::{AnchorError, Result};
use crate::geometry::Geometry;
use crate::log::trace;

use super::{ChangeKind, NodeId, Scene, SceneChange, WatchId, WatchScope};

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Local-to-parent transform
    transform: DAffine2,
    geometry: Option<Geometry>,
    /// Only meaningful on roots
    realized: bool,
}

impl Node {
    fn new(parent: Option<NodeId>) -> Self {
        Node {
            parent,
            children: Vec::new(),
            transform: DAffine2::IDENTITY,
            geometry: None,
            realized: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Watch {
    node: NodeId,
    scope: WatchScope,
}

/// A render tree of nodes, each with a local transform and optional geometry.
///
/// Mutations queue [`SceneChange`]s for the affected watches in registration
/// order; hosts drain them with [`SceneGraph::take_changes`] and hand them to
/// every anchor's `process`.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    watches: BTreeMap<WatchId, Watch>,
    next_watch: u64,
    pending: Vec<SceneChange>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new tree root
    pub fn add_root(&mut self) -> NodeId {
        self.nodes.insert(Node::new(None))
    }

    /// Add a node under `parent`
    pub fn add_child(&mut self, parent: NodeId) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.nodes.insert(Node::new(Some(parent)));
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Add a node under `parent` with the given geometry
    pub fn add_shape(&mut self, parent: NodeId, geometry: impl Into<Geometry>) -> Result<NodeId> {
        let id = self.add_child(parent)?;
        self.nodes[id].geometry = Some(geometry.into());
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(AnchorError::UnknownNode { node: id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn transform(&self, id: NodeId) -> Option<DAffine2> {
        self.nodes.get(id).map(|n| n.transform)
    }

    /// `id` followed by its ancestors up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), move |n| self.parent(*n))
    }

    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).last()
    }

    /// Number of registered watches
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Watches currently registered on `node`
    pub fn watches_on(&self, node: NodeId) -> Vec<(WatchId, WatchScope)> {
        self.watches
            .iter()
            .filter(|(_, w)| w.node == node)
            .map(|(id, w)| (*id, w.scope))
            .collect()
    }

    /// Drain queued change notifications
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.pending)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    pub fn set_geometry(&mut self, id: NodeId, geometry: Option<Geometry>) -> Result<()> {
        self.node(id)?;
        self.nodes[id].geometry = geometry;
        self.notify(|w| w.node == id && matches!(w.scope, WatchScope::Geometry { .. }), ChangeKind::Geometry);
        Ok(())
    }

    pub fn set_transform(&mut self, id: NodeId, transform: DAffine2) -> Result<()> {
        self.node(id)?;
        if self.nodes[id].transform == transform {
            return Ok(());
        }
        self.nodes[id].transform = transform;
        let this: &SceneGraph = self;
        let affected: Vec<bool> = this
            .watches
            .values()
            .map(|w| match w.scope {
                WatchScope::Geometry { ancestor } => this.chain_contains(w.node, id, ancestor),
                WatchScope::Membership => false,
            })
            .collect();
        self.notify_each(&affected, ChangeKind::Transform);
        Ok(())
    }

    /// Move `id` under `parent`, or make it a root
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<()> {
        self.node(id)?;
        if let Some(p) = parent {
            self.node(p)?;
            if self.ancestors(p).any(|a| a == id) {
                return Err(AnchorError::CyclicParent { node: id });
            }
        }
        if self.nodes[id].parent == parent {
            return Ok(());
        }
        if let Some(old) = self.nodes[id].parent {
            self.nodes[old].children.retain(|c| *c != id);
        }
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        self.nodes[id].parent = parent;
        self.notify_membership(|graph, watched| graph.ancestors(watched).any(|a| a == id));
        Ok(())
    }

    /// Mark a root as realized (attached to a rendered scene) or not
    pub fn set_realized(&mut self, root: NodeId, realized: bool) -> Result<()> {
        self.node(root)?;
        if self.nodes[root].realized == realized {
            return Ok(());
        }
        self.nodes[root].realized = realized;
        self.notify_membership(|graph, watched| graph.root(watched) == Some(root));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------------

    /// Whether `target` is on the chain from `from` upwards, stopping before
    /// `stop` (exclusive)
    fn chain_contains(&self, from: NodeId, target: NodeId, stop: Option<NodeId>) -> bool {
        for n in self.ancestors(from) {
            if Some(n) == stop {
                return false;
            }
            if n == target {
                return true;
            }
        }
        false
    }

    fn notify(&mut self, filter: impl Fn(&Watch) -> bool, kind: ChangeKind) {
        let affected: Vec<bool> = self.watches.values().map(&filter).collect();
        self.notify_each(&affected, kind);
    }

    fn notify_membership(&mut self, affects: impl Fn(&SceneGraph, NodeId) -> bool) {
        let this: &SceneGraph = self;
        let affected: Vec<bool> = this
            .watches
            .values()
            .map(|w| w.scope == WatchScope::Membership && affects(this, w.node))
            .collect();
        self.notify_each(&affected, ChangeKind::Membership);
    }

    fn notify_each(&mut self, affected: &[bool], kind: ChangeKind) {
        for ((id, w), hit) in self.watches.iter().zip(affected) {
            if *hit {
                trace!(watch = %id, kind = ?kind, "queue scene change");
                self.pending.push(SceneChange {
                    watch: *id,
                    node: w.node,
                    kind,
                });
            }
        }
    }
}

impl Scene for SceneGraph {
    fn geometry(&self, node: NodeId) -> Option<&Geometry> {
        self.nodes.get(node).and_then(|n| n.geometry.as_ref())
    }

    fn local_to_scene(&self, node: NodeId) -> Option<DAffine2> {
        self.node(node).ok()?;
        Some(
            self.ancestors(node)
                .fold(DAffine2::IDENTITY, |acc, n| self.nodes[n].transform * acc),
        )
    }

    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.ancestors(a).collect();
        self.ancestors(b).find(|n| chain.contains(n))
    }

    fn is_realized(&self, node: NodeId) -> bool {
        self.root(node).is_some_and(|r| self.nodes[r].realized)
    }

    fn watch(&mut self, node: NodeId, scope: WatchScope) -> WatchId {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watches.insert(id, Watch { node, scope });
        id
    }

    fn unwatch(&mut self, watch: WatchId) {
        self.watches.remove(&watch);
    }
}
