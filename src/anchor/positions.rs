//! Observable key-to-position map

use std::fmt;

use glam::DVec2;
use indexmap::IndexMap;

use super::AnchorKey;

/// One accepted update of the map. `new` is `None` when the key was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionChange {
    pub key: AnchorKey,
    pub old: Option<DVec2>,
    pub new: Option<DVec2>,
}

/// Handle returned by [`PositionMap::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PositionChange)>;

/// Positions of attached keys in their anchored node's local space.
///
/// Read-only outside the crate. Entries keep the order in which keys first
/// received a position. Listeners run synchronously in subscription order.
#[derive(Default)]
pub struct PositionMap {
    entries: IndexMap<AnchorKey, DVec2>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl PositionMap {
    pub fn get(&self, key: &AnchorKey) -> Option<DVec2> {
        self.entries.get(key).copied()
    }

    pub fn contains_key(&self, key: &AnchorKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnchorKey, DVec2)> {
        self.entries.iter().map(|(k, p)| (k, *p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &AnchorKey> {
        self.entries.keys()
    }

    pub(crate) fn subscribe(&mut self, listener: impl FnMut(&PositionChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        let listener: Listener = Box::new(listener);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Store `point` for `key`. Returns false, and notifies nobody, when the
    /// stored value is already equal.
    pub(crate) fn insert(&mut self, key: AnchorKey, point: DVec2) -> bool {
        let old = self.entries.insert(key.clone(), point);
        if old == Some(point) {
            return false;
        }
        self.fire(PositionChange {
            key,
            old,
            new: Some(point),
        });
        true
    }

    pub(crate) fn remove(&mut self, key: &AnchorKey) -> Option<DVec2> {
        let old = self.entries.shift_remove(key)?;
        self.fire(PositionChange {
            key: key.clone(),
            old: Some(old),
            new: None,
        });
        Some(old)
    }

    fn fire(&mut self, change: PositionChange) {
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

impl fmt::Debug for PositionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionMap")
            .field("entries", &self.entries)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl fmt::Display for PositionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, p) in &self.entries {
            writeln!(f, "{} = ({}, {})", key.role(), p.x, p.y)?;
        }
        Ok(())
    }
}
