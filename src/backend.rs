//! Pluggable map backends.
//!
//! Implement [`MapBackend`] to keep records in your own concurrent map. Records
//! are keyed by [`RecordId`]; because identifiers only ever grow, ascending key
//! order is insertion order.

use crate::model::RecordId;
use std::collections::BTreeMap;

/// Trait that a concurrent map must satisfy to back a
/// [`Collection`](crate::Collection).
///
/// Every method works with owned values so the collection API stays uniform
/// regardless of how the backend stores things internally. Backends that keep
/// values behind an `Arc` (like ShardMap) clone on read.
pub trait MapBackend<V>: Send + Sync
where
    V: Send + Sync + Clone,
{
    /// Insert a value under `id`, returning the previous value if any.
    fn insert(&self, id: RecordId, value: V) -> Option<V>;

    /// Look up a value by identifier.
    fn get(&self, id: RecordId) -> Option<V>;

    /// Remove an identifier, returning its value if it was present.
    fn remove(&self, id: RecordId) -> Option<V>;

    /// Consistent copy of all entries, ascending by identifier.
    fn ordered_snapshot(&self) -> Vec<(RecordId, V)>;

    /// Number of entries.
    fn map_len(&self) -> usize;

    /// Check if an identifier exists without cloning the value.
    fn contains_key(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Entry at zero-based `index` in identifier order. The default builds a
    /// full snapshot; ordered backends should override.
    fn nth(&self, index: usize) -> Option<(RecordId, V)> {
        self.ordered_snapshot().into_iter().nth(index)
    }
}

// ---- RwLock<BTreeMap> (default) ----------------------------------------------

impl<V> MapBackend<V> for parking_lot::RwLock<BTreeMap<RecordId, V>>
where
    V: Send + Sync + Clone,
{
    fn insert(&self, id: RecordId, value: V) -> Option<V> {
        self.write().insert(id, value)
    }

    fn get(&self, id: RecordId) -> Option<V> {
        self.read().get(&id).cloned()
    }

    fn remove(&self, id: RecordId) -> Option<V> {
        self.write().remove(&id)
    }

    fn ordered_snapshot(&self) -> Vec<(RecordId, V)> {
        self.read().iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    fn map_len(&self) -> usize {
        self.read().len()
    }

    fn contains_key(&self, id: RecordId) -> bool {
        self.read().contains_key(&id)
    }

    fn nth(&self, index: usize) -> Option<(RecordId, V)> {
        self.read().iter().nth(index).map(|(k, v)| (*k, v.clone()))
    }
}

// ---- ShardMap ----------------------------------------------------------------

impl<V> MapBackend<V> for shardmap::ShardMap<RecordId, V>
where
    V: Send + Sync + Clone + 'static,
{
    fn insert(&self, id: RecordId, value: V) -> Option<V> {
        shardmap::ShardMap::insert(self, id, value).map(|arc| (*arc).clone())
    }

    fn get(&self, id: RecordId) -> Option<V> {
        shardmap::ShardMap::get(self, &id).map(|arc| (*arc).clone())
    }

    fn remove(&self, id: RecordId) -> Option<V> {
        shardmap::ShardMap::remove(self, &id).map(|arc| (*arc).clone())
    }

    // Shards hash their keys, so order has to be restored here.
    fn ordered_snapshot(&self) -> Vec<(RecordId, V)> {
        let mut snap: Vec<_> = shardmap::ShardMap::iter_snapshot(self)
            .map(|(k, arc_v)| (k, (*arc_v).clone()))
            .collect();
        snap.sort_unstable_by_key(|(k, _)| *k);
        snap
    }

    fn map_len(&self) -> usize {
        self.len()
    }

    // ShardMap::get returns Arc<V>, so is_some() is just an atomic refcount bump.
    fn contains_key(&self, id: RecordId) -> bool {
        shardmap::ShardMap::get(self, &id).is_some()
    }
}

// ---- DashMap (feature-gated) -------------------------------------------------

#[cfg(feature = "dashmap")]
impl<V> MapBackend<V> for dashmap::DashMap<RecordId, V>
where
    V: Send + Sync + Clone + 'static,
{
    fn insert(&self, id: RecordId, value: V) -> Option<V> {
        dashmap::DashMap::insert(self, id, value)
    }

    fn get(&self, id: RecordId) -> Option<V> {
        dashmap::DashMap::get(self, &id).map(|r| r.value().clone())
    }

    fn remove(&self, id: RecordId) -> Option<V> {
        dashmap::DashMap::remove(self, &id).map(|(_, v)| v)
    }

    fn ordered_snapshot(&self) -> Vec<(RecordId, V)> {
        let mut snap: Vec<_> = self
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        snap.sort_unstable_by_key(|(k, _)| *k);
        snap
    }

    fn map_len(&self) -> usize {
        self.len()
    }

    fn contains_key(&self, id: RecordId) -> bool {
        dashmap::DashMap::contains_key(self, &id)
    }
}
