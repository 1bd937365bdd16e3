//! Per-bind mapper cache
//!
//! Two-phase build over an arena: a pair's id is reserved before its builder
//! runs, so a pair that reaches itself (directly or through other pairs)
//! gets the reserved id back instead of recursing. Builders capture ids, not
//! mappers; [`MapperCache::finalize`] checks every slot is filled and every
//! captured id is in range, then freezes the arena into a [`MapperGraph`].

use crate::error::BindError;
use crate::mapper::{MapperGraph, MapperNode};
use omap_types::TypePair;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Stable index of a mapper within one bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapperId(usize);

impl MapperId {
    /// Arena index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for MapperId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena slot: a reserved id and, once built, its node
#[derive(Debug)]
pub struct MapperCacheItem {
    /// Slot id
    pub id: MapperId,
    /// Pair the slot was reserved for
    pub pair: TypePair,
    /// Built node; `None` while still a stub
    pub node: Option<MapperNode>,
}

impl MapperCacheItem {
    /// Still a stub
    #[inline]
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.node.is_none()
    }
}

/// Registration-pass cache
#[derive(Debug, Default)]
pub struct MapperCache {
    items: Vec<MapperCacheItem>,
    index: HashMap<TypePair, MapperId>,
}

impl MapperCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id already reserved for `pair`
    #[inline]
    #[must_use]
    pub fn lookup(&self, pair: &TypePair) -> Option<MapperId> {
        self.index.get(pair).copied()
    }

    /// Reserve a stub for `pair`, or return its existing id
    pub fn reserve(&mut self, pair: TypePair) -> MapperId {
        if let Some(id) = self.lookup(&pair) {
            return id;
        }
        let id = self.reserve_anonymous(pair.clone());
        self.index.insert(pair, id);
        id
    }

    /// Reserve a slot that is never shared by pair lookup
    ///
    /// Used for member-specific mappers such as custom converters, which
    /// must not be reused for other members of the same pair.
    pub fn reserve_anonymous(&mut self, pair: TypePair) -> MapperId {
        let id = MapperId(self.items.len());
        tracing::trace!("reserved {} for {}", id, pair);
        self.items.push(MapperCacheItem {
            id,
            pair,
            node: None,
        });
        id
    }

    /// Fill a reserved slot
    ///
    /// # Errors
    /// [`BindError::UnresolvedStub`] when `id` was never reserved.
    pub fn complete(&mut self, id: MapperId, node: MapperNode) -> Result<(), BindError> {
        let item = self
            .items
            .get_mut(id.index())
            .ok_or_else(|| BindError::UnresolvedStub {
                id: id.index(),
                pair: node.pair.clone(),
            })?;
        item.node = Some(node);
        Ok(())
    }

    /// Slot by id
    #[must_use]
    pub fn get(&self, id: MapperId) -> Option<&MapperCacheItem> {
        self.items.get(id.index())
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No slots reserved
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Freeze into a graph rooted at `root`
    ///
    /// # Errors
    /// [`BindError::UnresolvedStub`] when any slot is unfilled or a node
    /// captured an out-of-range sibling id; [`BindError::UnknownRoot`] when
    /// `root` is not a slot of this cache.
    pub fn finalize(self, root: MapperId) -> Result<MapperGraph, BindError> {
        let count = self.items.len();
        let mut nodes = Vec::with_capacity(count);
        for item in self.items {
            let Some(node) = item.node else {
                return Err(BindError::UnresolvedStub {
                    id: item.id.index(),
                    pair: item.pair,
                });
            };
            if let Some(dangling) = node.siblings.iter().find(|s| s.index() >= count) {
                return Err(BindError::UnresolvedStub {
                    id: dangling.index(),
                    pair: node.pair.clone(),
                });
            }
            nodes.push(node);
        }
        let Some(root_node) = nodes.get(root.index()) else {
            return Err(BindError::UnknownRoot(root.index()));
        };
        tracing::debug!(
            "finalized mapper graph for {}: {} nodes",
            root_node.pair,
            nodes.len()
        );
        Ok(MapperGraph::new(nodes, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{routine, MapperKind};
    use omap_types::{Ty, Value};

    fn node(pair: &TypePair) -> MapperNode {
        MapperNode::new(
            pair.clone(),
            MapperKind::Convertible,
            routine(|_, source, _| Ok(source)),
        )
    }

    #[test]
    fn reserve_returns_stable_ids() {
        let mut cache = MapperCache::new();
        let a = TypePair::new(Ty::I32, Ty::I64);
        let b = TypePair::new(Ty::I64, Ty::I32);
        let first = cache.reserve(a.clone());
        assert_eq!(cache.reserve(b.clone()).index(), 1);
        assert_eq!(cache.reserve(a.clone()), first);
        assert_eq!(cache.lookup(&b).map(MapperId::index), Some(1));
        assert!(cache.get(first).unwrap().is_stub());
    }

    #[test]
    fn anonymous_slots_are_not_shared() {
        let mut cache = MapperCache::new();
        let pair = TypePair::new(Ty::I32, Ty::I32);
        let a = cache.reserve_anonymous(pair.clone());
        let b = cache.reserve_anonymous(pair.clone());
        assert_ne!(a, b);
        assert!(cache.lookup(&pair).is_none());
    }

    #[test]
    fn stub_left_unfilled_fails_finalize() {
        let mut cache = MapperCache::new();
        let a = TypePair::new(Ty::I32, Ty::I64);
        let root = cache.reserve(a.clone());
        cache.reserve(TypePair::new(Ty::I64, Ty::I32));
        cache.complete(root, node(&a)).unwrap();
        let err = cache.finalize(root).unwrap_err();
        assert!(matches!(err, BindError::UnresolvedStub { id: 1, .. }));
    }

    #[test]
    fn self_reference_resolves_after_finalize() {
        let mut cache = MapperCache::new();
        let pair = TypePair::new(Ty::I32, Ty::I32);
        let id = cache.reserve(pair.clone());
        cache
            .complete(id, node(&pair).with_siblings(vec![id]))
            .unwrap();
        let graph = cache.finalize(id).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node(id).unwrap().siblings, vec![id]);
        assert_eq!(graph.invoke(id, Value::Int(4), None).unwrap(), Value::Int(4));
    }

    #[test]
    fn dangling_sibling_fails_finalize() {
        let mut cache = MapperCache::new();
        let pair = TypePair::new(Ty::I32, Ty::I32);
        let id = cache.reserve(pair.clone());
        cache
            .complete(id, node(&pair).with_siblings(vec![MapperId(7)]))
            .unwrap();
        assert!(matches!(
            cache.finalize(id),
            Err(BindError::UnresolvedStub { id: 7, .. })
        ));
    }
}
