//! The anchor: positions for many anchored keys relative to one anchorage.
//!
//! An [`Anchor`] owns the parameter stores, the cached positions and the
//! watches it registers in the host [`Scene`]. The host drains scene
//! changes and hands them to [`Anchor::process`]; every other operation
//! recomputes synchronously before returning.
//!
//! A key is recomputed only while attached, and only when:
//! - its anchored node's geometry or transform changes (while observed)
//! - its anchored node or one of its ancestors is moved in the tree
//! - the anchorage changes or is replaced
//! - a parameter visible to the key changes
//! - the strategy is replaced

pub mod key;
pub mod parameter;
pub mod positions;

pub use key::AnchorKey;
pub use positions::{PositionChange, PositionMap, SubscriptionId};

use std::collections::HashMap;

use glam::DVec2;
use indexmap::{IndexMap, IndexSet};

use crate::errors::{AnchorError, Result};
use crate::log::{debug, trace, warn};
use crate::scene::{NodeId, Scene, SceneChange, WatchId, WatchScope};
use crate::strategy::{ComputationStrategy, Strategy};
use crate::types::is_finite_point;

use parameter::{
    Binding, Parameter, ParameterFactory, ParameterKind, ParameterSet, ParameterSpec,
    ParameterStore, ParameterType,
};

/// Counters over the lifetime of an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorStats {
    /// Recomputations started for attached keys
    pub recomputations: u64,
    /// Results written to the position map
    pub accepted: u64,
    /// Results dropped as unchanged or non-finite
    pub discarded: u64,
}

#[derive(Debug, Clone, Copy)]
struct AnchorageWatches {
    membership: WatchId,
    geometry: WatchId,
}

/// Watches held for one anchored node
#[derive(Debug, Clone, Copy)]
struct Observer {
    membership: WatchId,
    /// Geometry watch and the common ancestor it is scoped to
    geometry: Option<(WatchId, NodeId)>,
}

/// What a scene change refers to, from this anchor's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchRole {
    AnchorageMembership,
    AnchorageGeometry,
    AnchoredMembership(NodeId),
    AnchoredGeometry(NodeId),
}

#[derive(Debug)]
pub struct Anchor {
    anchorage: Option<NodeId>,
    anchorage_watches: Option<AnchorageWatches>,
    strategy: Strategy,
    /// Attached keys grouped by anchored node, in attach order
    keys: IndexMap<NodeId, IndexSet<AnchorKey>>,
    observers: HashMap<NodeId, Observer>,
    anchorage_params: ParameterStore,
    anchored_params: HashMap<AnchorKey, ParameterStore>,
    positions: PositionMap,
    stats: AnchorStats,
}

impl Anchor {
    /// An anchor without anchorage. Parameters are seeded on first attach.
    pub fn new(strategy: impl Into<Strategy>) -> Self {
        Anchor {
            anchorage: None,
            anchorage_watches: None,
            strategy: strategy.into(),
            keys: IndexMap::new(),
            observers: HashMap::new(),
            anchorage_params: ParameterStore::new(),
            anchored_params: HashMap::new(),
            positions: PositionMap::default(),
            stats: AnchorStats::default(),
        }
    }

    /// An anchor positioned against `anchorage` from the start
    pub fn with_anchorage(
        scene: &mut dyn Scene,
        strategy: impl Into<Strategy>,
        anchorage: Option<NodeId>,
    ) -> Result<Self> {
        let mut anchor = Anchor::new(strategy);
        anchor.set_anchorage(scene, anchorage)?;
        Ok(anchor)
    }

    // ========================================================================
    // Attachment
    // ========================================================================

    pub fn attach(&mut self, scene: &mut dyn Scene, key: AnchorKey) -> Result<()> {
        if self.is_attached(&key) {
            return Err(AnchorError::AlreadyAttached { key });
        }
        let factories = factories(&self.strategy)?;
        seed(&mut self.anchorage_params, &factories, ParameterKind::Anchorage);
        seed(
            self.anchored_params.entry(key.clone()).or_default(),
            &factories,
            ParameterKind::Anchored,
        );

        let node = key.anchored();
        let bucket = self.keys.entry(node).or_default();
        bucket.insert(key.clone());
        if bucket.len() == 1 {
            let membership = scene.watch(node, WatchScope::Membership);
            self.observers.insert(
                node,
                Observer {
                    membership,
                    geometry: None,
                },
            );
            self.sync_observer(scene, node);
        }
        debug!(%key, "attached");

        self.refresh_anchorage_bindings(&*scene);
        self.recompute(&*scene, &key);
        Ok(())
    }

    pub fn detach(&mut self, scene: &mut dyn Scene, key: &AnchorKey) -> Result<()> {
        if !self.is_attached(key) {
            return Err(AnchorError::NotAttached { key: key.clone() });
        }
        // Cleared so a later attach reports a change even for an equal value
        self.positions.remove(key);

        let node = key.anchored();
        let emptied = match self.keys.get_mut(&node) {
            Some(bucket) => {
                bucket.shift_remove(key);
                bucket.is_empty()
            }
            None => false,
        };
        if emptied {
            self.keys.shift_remove(&node);
            if let Some(observer) = self.observers.remove(&node) {
                scene.unwatch(observer.membership);
                if let Some((watch, _)) = observer.geometry {
                    scene.unwatch(watch);
                }
                debug!(?node, "observer torn down");
            }
            self.anchored_params.retain(|k, _| k.anchored() != node);
        }
        debug!(%key, "detached");
        Ok(())
    }

    pub fn is_attached(&self, key: &AnchorKey) -> bool {
        self.keys
            .get(&key.anchored())
            .is_some_and(|bucket| bucket.contains(key))
    }

    /// Attached keys, grouped by anchored node in attach order
    pub fn keys(&self) -> impl Iterator<Item = &AnchorKey> {
        self.keys.values().flatten()
    }

    /// Detach every key and release the anchorage watches
    pub fn dispose(mut self, scene: &mut dyn Scene) {
        let keys: Vec<AnchorKey> = self.keys().cloned().collect();
        for key in &keys {
            // Every collected key is attached
            let _ = self.detach(scene, key);
        }
        if let Some(watches) = self.anchorage_watches.take() {
            scene.unwatch(watches.membership);
            scene.unwatch(watches.geometry);
        }
    }

    // ========================================================================
    // Positions
    // ========================================================================

    /// Cached position of an attached key in its anchored node's local
    /// space. `None` until the key first becomes computable.
    pub fn position(&self, key: &AnchorKey) -> Result<Option<DVec2>> {
        if !self.is_attached(key) {
            return Err(AnchorError::NotAttached { key: key.clone() });
        }
        Ok(self.positions.get(key))
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn subscribe_positions(
        &mut self,
        listener: impl FnMut(&PositionChange) + 'static,
    ) -> SubscriptionId {
        self.positions.subscribe(listener)
    }

    pub fn unsubscribe_positions(&mut self, id: SubscriptionId) -> bool {
        self.positions.unsubscribe(id)
    }

    pub fn stats(&self) -> AnchorStats {
        self.stats
    }

    // ========================================================================
    // Anchorage and strategy
    // ========================================================================

    pub fn anchorage(&self) -> Option<NodeId> {
        self.anchorage
    }

    /// Replace the anchorage and recompute every attached key
    pub fn set_anchorage(&mut self, scene: &mut dyn Scene, anchorage: Option<NodeId>) -> Result<()> {
        if anchorage == self.anchorage {
            return Ok(());
        }
        if let Some(node) = anchorage {
            if scene.local_to_scene(node).is_none() {
                return Err(AnchorError::UnknownNode { node });
            }
        }

        if let Some(watches) = self.anchorage_watches.take() {
            scene.unwatch(watches.membership);
            scene.unwatch(watches.geometry);
        }
        self.anchorage = anchorage;
        self.anchorage_watches = anchorage.map(|node| AnchorageWatches {
            membership: scene.watch(node, WatchScope::Membership),
            geometry: scene.watch(node, WatchScope::Geometry { ancestor: None }),
        });
        debug!(?anchorage, "anchorage replaced");

        let nodes: Vec<NodeId> = self.keys.keys().copied().collect();
        for node in nodes {
            self.sync_observer(scene, node);
        }
        self.refresh_anchorage_bindings(&*scene);
        self.recompute_all(&*scene);
        Ok(())
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Replace the strategy.
    ///
    /// Parameters the new strategy does not require are dropped, missing
    /// ones are seeded and shared ones keep their values. Every attached key
    /// is then recomputed once.
    pub fn set_strategy(&mut self, scene: &dyn Scene, strategy: impl Into<Strategy>) -> Result<()> {
        let strategy = strategy.into();
        let factories = factories(&strategy)?;
        let required = strategy.required_parameters();

        self.anchorage_params.retain(|ty| required.contains(&ty));
        for store in self.anchored_params.values_mut() {
            store.retain(|ty| required.contains(&ty));
        }
        if !self.keys.is_empty() {
            seed(&mut self.anchorage_params, &factories, ParameterKind::Anchorage);
            for key in self.keys.values().flatten() {
                seed(
                    self.anchored_params.entry(key.clone()).or_default(),
                    &factories,
                    ParameterKind::Anchored,
                );
            }
        }
        debug!(from = self.strategy.name(), to = strategy.name(), "strategy replaced");
        self.strategy = strategy;

        self.refresh_anchorage_bindings(scene);
        self.recompute_all(scene);
        Ok(())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// The parameter of type `P`, created with its default on first access.
    ///
    /// Per-anchored parameter types need `key`; shared ones ignore it. A key
    /// configured here before it is attached keeps its store until the
    /// last key of its node detaches or [`Anchor::forget_parameters`] drops it.
    pub fn parameter<P: ParameterSpec>(&mut self, key: Option<&AnchorKey>) -> Result<&Parameter> {
        self.parameter_mut::<P>(key).map(|param| &*param)
    }

    /// Parameters owned by `key`, or the shared ones when `key` is `None`
    pub fn parameter_store(&self, key: Option<&AnchorKey>) -> Option<&ParameterStore> {
        match key {
            Some(key) => self.anchored_params.get(key),
            None => Some(&self.anchorage_params),
        }
    }

    pub fn set_parameter<P: ParameterSpec>(
        &mut self,
        scene: &dyn Scene,
        key: Option<&AnchorKey>,
        value: Option<P::Value>,
    ) -> Result<()> {
        let changed = self.parameter_mut::<P>(key)?.set(value.map(P::wrap))?;
        if changed {
            self.parameter_changed(scene, P::TYPE, key);
        }
        Ok(())
    }

    /// Make the parameter track `binding` and evaluate it right away
    pub fn bind_parameter<P: ParameterSpec>(
        &mut self,
        scene: &dyn Scene,
        key: Option<&AnchorKey>,
        binding: Binding,
    ) -> Result<()> {
        let anchorage = self.anchorage;
        let anchored = key.map(AnchorKey::anchored);
        let param = self.parameter_mut::<P>(key)?;
        param.bind(binding)?;
        if param.refresh(scene, anchorage, anchored) {
            self.parameter_changed(scene, P::TYPE, key);
        }
        Ok(())
    }

    /// Stop tracking the bound source. The last value is kept.
    pub fn unbind_parameter<P: ParameterSpec>(
        &mut self,
        key: Option<&AnchorKey>,
    ) -> Result<Option<Binding>> {
        Ok(self.parameter_mut::<P>(key)?.unbind())
    }

    /// Drop the per-key parameters of a key that is not attached.
    ///
    /// Returns whether a store existed.
    pub fn forget_parameters(&mut self, key: &AnchorKey) -> Result<bool> {
        if self.is_attached(key) {
            return Err(AnchorError::AlreadyAttached { key: key.clone() });
        }
        Ok(self.anchored_params.remove(key).is_some())
    }

    /// Re-evaluate every binding, for sources that changed without notice
    pub fn invalidate_bindings(&mut self, scene: &dyn Scene) {
        if self.refresh_anchorage_bindings(scene) {
            self.recompute_all(scene);
            return;
        }
        let anchorage = self.anchorage;
        let keys: Vec<AnchorKey> = self.keys().cloned().collect();
        for key in keys {
            let changed = self
                .anchored_params
                .get_mut(&key)
                .is_some_and(|store| refresh_store(store, scene, anchorage, Some(key.anchored())));
            if changed {
                self.recompute(scene, &key);
            }
        }
    }

    fn parameter_mut<P: ParameterSpec>(&mut self, key: Option<&AnchorKey>) -> Result<&mut Parameter> {
        let store = match (P::TYPE.kind(), key) {
            (ParameterKind::Anchorage, _) => &mut self.anchorage_params,
            (ParameterKind::Anchored, Some(key)) => {
                self.anchored_params.entry(key.clone()).or_default()
            }
            (ParameterKind::Anchored, None) => {
                return Err(AnchorError::MissingKeyContext { ty: P::TYPE });
            }
        };
        Ok(store.get_or_create(P::TYPE, P::create))
    }

    fn parameter_changed(&mut self, scene: &dyn Scene, ty: ParameterType, key: Option<&AnchorKey>) {
        trace!(%ty, "parameter changed");
        match (ty.kind(), key) {
            (ParameterKind::Anchorage, _) => self.recompute_all(scene),
            (ParameterKind::Anchored, Some(key)) if self.is_attached(key) => self.recompute(scene, key),
            (ParameterKind::Anchored, _) => {}
        }
    }

    fn refresh_anchorage_bindings(&mut self, scene: &dyn Scene) -> bool {
        refresh_store(&mut self.anchorage_params, scene, self.anchorage, None)
    }

    // ========================================================================
    // Scene changes
    // ========================================================================

    /// Apply scene changes drained from the host, in order.
    ///
    /// Changes for watches this anchor does not own are ignored, so one
    /// drained batch can be handed to several anchors.
    pub fn process(&mut self, scene: &mut dyn Scene, changes: &[SceneChange]) {
        for change in changes {
            let Some(role) = self.watch_role(change.watch) else {
                continue;
            };
            trace!(watch = %change.watch, ?role, kind = ?change.kind, "scene change");
            match role {
                WatchRole::AnchorageMembership => {
                    let nodes: Vec<NodeId> = self.keys.keys().copied().collect();
                    for node in nodes {
                        self.sync_observer(scene, node);
                    }
                    self.refresh_anchorage_bindings(&*scene);
                    self.recompute_all(&*scene);
                }
                WatchRole::AnchorageGeometry => {
                    self.refresh_anchorage_bindings(&*scene);
                    self.recompute_all(&*scene);
                }
                WatchRole::AnchoredMembership(node) => {
                    // A reparent below the common ancestor keeps the watch
                    // but still moves the node
                    self.sync_observer(scene, node);
                    self.recompute_node(&*scene, node);
                }
                WatchRole::AnchoredGeometry(node) => self.recompute_node(&*scene, node),
            }
        }
    }

    fn watch_role(&self, watch: WatchId) -> Option<WatchRole> {
        if let Some(w) = &self.anchorage_watches {
            if w.membership == watch {
                return Some(WatchRole::AnchorageMembership);
            }
            if w.geometry == watch {
                return Some(WatchRole::AnchorageGeometry);
            }
        }
        self.observers.iter().find_map(|(node, observer)| {
            if observer.membership == watch {
                Some(WatchRole::AnchoredMembership(*node))
            } else if observer.geometry.is_some_and(|(w, _)| w == watch) {
                Some(WatchRole::AnchoredGeometry(*node))
            } else {
                None
            }
        })
    }

    /// Install, move or tear down the geometry watch of `node`.
    ///
    /// The watch exists exactly while the anchorage and `node` are both
    /// realized and share a common ancestor; it is scoped to that ancestor.
    fn sync_observer(&mut self, scene: &mut dyn Scene, node: NodeId) {
        let target = self
            .anchorage
            .filter(|a| scene.is_realized(*a) && scene.is_realized(node))
            .and_then(|a| scene.common_ancestor(a, node));
        let Some(observer) = self.observers.get_mut(&node) else {
            return;
        };
        match (observer.geometry, target) {
            (Some((_, current)), Some(ancestor)) if current == ancestor => {}
            (current, target) => {
                if let Some((watch, _)) = current {
                    scene.unwatch(watch);
                    debug!(?node, "geometry observer removed");
                }
                observer.geometry = target.map(|ancestor| {
                    let scope = WatchScope::Geometry {
                        ancestor: Some(ancestor),
                    };
                    (scene.watch(node, scope), ancestor)
                });
                if observer.geometry.is_some() {
                    debug!(?node, "geometry observer installed");
                }
            }
        }
    }

    // ========================================================================
    // Recomputation
    // ========================================================================

    fn recompute_all(&mut self, scene: &dyn Scene) {
        let keys: Vec<AnchorKey> = self.keys().cloned().collect();
        for key in &keys {
            self.recompute(scene, key);
        }
    }

    fn recompute_node(&mut self, scene: &dyn Scene, node: NodeId) {
        let keys: Vec<AnchorKey> = match self.keys.get(&node) {
            Some(bucket) => bucket.iter().cloned().collect(),
            None => return,
        };
        for key in &keys {
            self.recompute(scene, key);
        }
    }

    /// Recompute one attached key and publish the result if it is finite
    /// and differs from the cached one
    fn recompute(&mut self, scene: &dyn Scene, key: &AnchorKey) {
        self.stats.recomputations += 1;
        let Some(anchorage) = self.anchorage else {
            trace!(%key, "no anchorage, not computable");
            return;
        };
        let anchored = key.anchored();
        if let Some(store) = self.anchored_params.get_mut(key) {
            refresh_store(store, scene, Some(anchorage), Some(anchored));
        }

        let params = ParameterSet::new(&self.anchorage_params, self.anchored_params.get(key));
        if params
            .missing_mandatory(self.strategy.required_parameters())
            .is_some()
        {
            trace!(%key, "mandatory parameter absent, not computable");
            return;
        }
        let Some(scene_point) = self
            .strategy
            .compute_position(scene, anchorage, anchored, &params)
        else {
            trace!(%key, "strategy produced no position");
            return;
        };
        let Some(to_scene) = scene.local_to_scene(anchored) else {
            return;
        };
        let local = to_scene.inverse().transform_point2(scene_point);

        if !is_finite_point(local) {
            warn!(%key, ?local, "discarding non-finite position");
            self.stats.discarded += 1;
            return;
        }
        if self.positions.insert(key.clone(), local) {
            trace!(%key, ?local, "position accepted");
            self.stats.accepted += 1;
        } else {
            self.stats.discarded += 1;
        }
    }
}

// ============================================================================
// Parameter seeding
// ============================================================================

/// Factories for every parameter the strategy requires.
///
/// Fails on the first required type the strategy cannot construct.
fn factories(strategy: &dyn ComputationStrategy) -> Result<Vec<(ParameterType, ParameterFactory)>> {
    strategy
        .required_parameters()
        .iter()
        .map(|&ty| {
            strategy
                .parameter_factory(ty)
                .map(|factory| (ty, factory))
                .ok_or(AnchorError::MissingParameterFactory {
                    strategy: strategy.name(),
                    ty,
                })
        })
        .collect()
}

/// Create the parameters of `kind` that `store` lacks
fn seed(store: &mut ParameterStore, factories: &[(ParameterType, ParameterFactory)], kind: ParameterKind) {
    for &(ty, factory) in factories {
        if ty.kind() == kind && !store.contains(ty) {
            store.insert(factory());
        }
    }
}

/// Re-evaluate every bound parameter in `store`. Returns whether any value
/// changed.
fn refresh_store(
    store: &mut ParameterStore,
    scene: &dyn Scene,
    anchorage: Option<NodeId>,
    anchored: Option<NodeId>,
) -> bool {
    store
        .iter_mut()
        .fold(false, |changed, param| param.refresh(scene, anchorage, anchored) | changed)
}
