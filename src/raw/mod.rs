use crate::entry::Entry;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A plain key-to-entry mapping. Used for both the stable and the hot table.
///
/// A freshly created or reset table does not allocate, which is how the "absent" table is
/// represented.
pub(crate) struct Table<K, V, S> {
    entries: HashMap<K, Arc<Entry<V>>, S>,
}

impl<K, V, S> Table<K, V, S> {
    pub(crate) fn with_hasher(hash_builder: S) -> Self {
        Self {
            entries: HashMap::with_hasher(hash_builder),
        }
    }

    pub(crate) fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, hash_builder),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn is_allocated(&self) -> bool {
        self.entries.capacity() != 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &Arc<Entry<V>>)> {
        self.entries.iter()
    }
}

impl<K, V, S> Table<K, V, S>
where
    S: Clone,
{
    /// Drops every entry and releases the backing allocation.
    pub(crate) fn reset(&mut self) {
        let hash_builder = self.entries.hasher().clone();
        self.entries = HashMap::with_hasher(hash_builder);
    }

    /// Empties the table, yielding its contents and leaving it unallocated.
    pub(crate) fn drain(&mut self) -> std::collections::hash_map::IntoIter<K, Arc<Entry<V>>> {
        let hash_builder = self.entries.hasher().clone();
        std::mem::replace(&mut self.entries, HashMap::with_hasher(hash_builder)).into_iter()
    }
}

impl<K, V, S> Table<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&Arc<Entry<V>>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get(key)
    }

    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &Arc<Entry<V>>)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get_key_value(key)
    }

    pub(crate) fn insert(&mut self, key: K, entry: Arc<Entry<V>>) -> Option<Arc<Entry<V>>> {
        self.entries.insert(key, entry)
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<Arc<Entry<V>>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.remove(key)
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional)
    }
}

/// Both tiers of a map.
///
/// The hot table's lock lives inside the value protected by the outer lock, so it cannot be
/// taken without first holding the outer lock. Holding the outer lock for writing gives direct
/// access to the hot table through [`RwLock::get_mut`].
pub(crate) struct Tables<K, V, S> {
    pub(crate) stable: Table<K, V, S>,
    pub(crate) hot: RwLock<Table<K, V, S>>,
}

impl<K, V, S> Tables<K, V, S>
where
    S: Clone,
{
    pub(crate) fn new(stable: Table<K, V, S>, hash_builder: S) -> Self {
        Self {
            stable,
            hot: RwLock::new(Table::with_hasher(hash_builder)),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.stable.reset();
        self.hot.get_mut().reset();
    }
}
