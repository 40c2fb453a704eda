use crate::config::Config;
use crate::entry::Entry;
use crate::iter::Snapshot;
use crate::merge::{self, MergeTrigger};
use crate::raw::{Table, Tables};
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use tracing::{debug, trace};

/// A concurrent hash map built from two tables and two reader/writer locks.
///
/// Reads are served from a large, rarely restructured _stable_ table under a shared lock. Keys
/// that are new since the last merge live in a small _hot_ table behind a second lock, which is
/// only ever taken while the first one is held. Once the hot table has been consulted often
/// enough, or has grown large enough, the next operation that manages to grab the outer lock
/// exclusively (without waiting for it) folds the hot table into the stable one. See the
/// [crate-level documentation](index.html) for details.
///
/// Values are handed out by cloning them. Wrap large values in an [`Arc`] to make that cheap.
pub struct RwMap<K, V, S = crate::DefaultHashBuilder> {
    /// The outer lock. Protects the stable table and, through it, the hot table's lock.
    tables: RwLock<Tables<K, V, S>>,

    /// Miss counter and ready flag for the merge heuristic.
    trigger: MergeTrigger,

    config: Config,

    build_hasher: S,
}

impl<K, V> RwMap<K, V, crate::DefaultHashBuilder> {
    /// Creates an empty `RwMap`.
    ///
    /// Neither table allocates until it is first written to.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    /// let map: RwMap<&str, i32> = RwMap::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty `RwMap` whose stable table can hold at least `capacity` elements without
    /// reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    /// let map: RwMap<&str, i32> = RwMap::with_capacity(10);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, crate::DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for RwMap<K, V, S>
where
    S: Default + Clone,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> RwMap<K, V, S>
where
    S: Clone,
{
    /// Creates an empty map which will use `hash_builder` to hash keys.
    ///
    /// Warning: `hash_builder` is normally randomly generated, and is designed to
    /// allow the map to be resistant to attacks that cause many collisions and
    /// very poor performance. Setting it manually using this
    /// function can expose a DoS attack vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::{RwMap, DefaultHashBuilder};
    ///
    /// let map = RwMap::with_hasher(DefaultHashBuilder::default());
    /// map.store(1, 2);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty map with the specified `capacity`, using `hash_builder` to hash the keys.
    ///
    /// If `capacity` is 0, the call will not allocate, and is equivalent to
    /// [`RwMap::with_hasher`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let s = RandomState::new();
    /// let map = RwMap::with_capacity_and_hasher(10, s);
    /// map.store(1, 2);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let stable = Table::with_capacity_and_hasher(capacity, hash_builder.clone());
        Self {
            tables: RwLock::new(Tables::new(stable, hash_builder.clone())),
            trigger: MergeTrigger::new(),
            config: Config::default(),
            build_hasher: hash_builder,
        }
    }

    /// Replaces the merge heuristic configuration of this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::{Config, RwMap};
    ///
    /// let config = Config::builder().merge_miss_threshold(16).build().unwrap();
    /// let map: RwMap<u32, u32> = RwMap::new().with_config(config);
    /// assert_eq!(map.config().merge_miss_threshold(), 16);
    /// ```
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Returns the merge heuristic configuration of this map.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the map's [`BuildHasher`].
    pub fn hasher(&self) -> &S {
        &self.build_hasher
    }
}

// ===
// merging
// ===

impl<K, V, S> RwMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Runs a merge if one is due and the outer lock is free. Never blocks.
    fn check_merge(&self) {
        if !self.trigger.is_ready() {
            return;
        }
        match self.tables.try_write() {
            Some(mut tables) => self.merge(&mut tables),
            None => trace!("merge due, but the tables are busy"),
        }
    }

    fn merge(&self, tables: &mut Tables<K, V, S>) {
        let hot = tables.hot.get_mut().len();
        let stats = merge::fold(tables);
        self.trigger.reset();
        trace!(
            hot,
            promoted = stats.promoted,
            evicted = stats.evicted,
            stable = tables.stable.len(),
            "merged hot table into stable table"
        );
    }

    /// Folds all recent insertions and removals into the stable table, waiting for the lock if
    /// necessary.
    ///
    /// Merges normally happen on their own, amortized over regular operations. Calling this
    /// after a bulk load makes subsequent reads take the fast path straight away.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// for i in 0..1000 {
    ///     map.store(i, i);
    /// }
    /// map.force_merge();
    /// assert_eq!(map.load(&500), Some(500));
    /// ```
    pub fn force_merge(&self) {
        let mut tables = self.tables.write();
        debug!("forcing merge");
        self.merge(&mut tables);
    }

    fn score_miss(&self, hot: &Table<K, V, S>) {
        self.trigger.score_miss(hot.len(), &self.config);
    }

    /// Places a brand-new entry in the hot table, allocating it on first use.
    fn insert_hot(&self, hot: &mut Table<K, V, S>, key: K, entry: Arc<Entry<V>>) {
        if !hot.is_allocated() {
            hot.reserve(self.config.hot_initial_capacity());
        }
        hot.insert(key, entry);
    }
}

// ===
// lookups
// ===

impl<K, V, S> RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Returns a clone of the value mapped to `key`, or `None` if there is none.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash` and `Eq` on the borrowed
    /// form must match those for the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store(1, "a");
    /// assert_eq!(map.load(&1), Some("a"));
    /// assert_eq!(map.load(&2), None);
    /// ```
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check_merge();
        let tables = self.tables.read();

        if let Some(value) = tables.stable.get(key).and_then(|entry| entry.load()) {
            return Some(value);
        }

        let hot = tables.hot.read();
        self.score_miss(&hot);
        hot.get(key).and_then(|entry| entry.load())
    }

    /// Returns `true` if the map holds a value for `key`.
    ///
    /// Unlike [`RwMap::load`], this does not clone the value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check_merge();
        let tables = self.tables.read();

        if tables.stable.get(key).map_or(false, |entry| entry.is_occupied()) {
            return true;
        }

        let hot = tables.hot.read();
        self.score_miss(&hot);
        hot.get(key).map_or(false, |entry| entry.is_occupied())
    }

    /// Captures a point-in-time copy of the map's contents.
    ///
    /// The locks are only held while the copy is built; the returned [`Snapshot`] is private to
    /// the caller and does not observe later changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store("a", 1);
    /// map.store("b", 2);
    ///
    /// let snapshot = map.snapshot();
    /// map.delete("a");
    /// assert_eq!(snapshot.get("a"), Some(&1));
    /// assert_eq!(snapshot.len(), 2);
    /// ```
    pub fn snapshot(&self) -> Snapshot<K, V, S> {
        self.check_merge();
        let tables = self.tables.read();

        let mut copy = HashMap::with_capacity_and_hasher(
            tables.stable.len(),
            self.build_hasher.clone(),
        );
        for (key, entry) in tables.stable.iter() {
            if let Some(value) = entry.load() {
                copy.insert(key.clone(), value);
            }
        }

        let hot = tables.hot.read();
        self.score_miss(&hot);
        for (key, entry) in hot.iter() {
            match entry.load() {
                Some(value) => {
                    copy.insert(key.clone(), value);
                }
                None => {
                    copy.remove(key);
                }
            }
        }

        Snapshot::new(copy)
    }

    /// Calls `f` for every key-value pair in the map, in arbitrary order, until `f` returns
    /// `false`.
    ///
    /// `f` runs over a [`snapshot`](RwMap::snapshot) taken when the call starts, with no locks
    /// held, so it may freely call back into the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// for i in 0..10 {
    ///     map.store(i, i * 2);
    /// }
    ///
    /// let mut visited = 0;
    /// map.range(|_, _| {
    ///     visited += 1;
    ///     visited < 3
    /// });
    /// assert_eq!(visited, 3);
    /// ```
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for (key, value) in self.snapshot().iter() {
            if !f(key, value) {
                break;
            }
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// This builds a [`snapshot`](RwMap::snapshot), so it is _O(n)_.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns `true` if the map is empty. Otherwise returns `false`.
    ///
    /// Like [`RwMap::len`], this is _O(n)_.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ===
// modifications
// ===

impl<K, V, S> RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Maps `key` to `value`, replacing any previous value.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store(37, "a");
    /// map.store(37, "b");
    /// assert_eq!(map.load(&37), Some("b"));
    /// ```
    pub fn store(&self, key: K, value: V) {
        self.put(key, value);
    }

    /// Maps `key` to `value`, returning the previous value if there was one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// assert_eq!(map.swap(37, "a"), None);
    /// assert_eq!(map.swap(37, "b"), Some("a"));
    /// ```
    pub fn swap(&self, key: K, value: V) -> Option<V> {
        self.put(key, value)
    }

    fn put(&self, key: K, mut value: V) -> Option<V> {
        self.check_merge();
        let tables = self.tables.read();

        // a populated stable entry is overwritten in place. an empty one is a tombstone and must
        // not be revived, the key now belongs to the hot table.
        if let Some(entry) = tables.stable.get(&key) {
            match entry.update(value) {
                Ok(previous) => return Some(previous),
                Err(v) => value = v,
            }
        }

        let mut hot = tables.hot.write();
        if let Some(entry) = hot.get(&key) {
            match entry.update(value) {
                Ok(previous) => {
                    self.score_miss(&hot);
                    return Some(previous);
                }
                Err(v) => value = v,
            }
        }

        // this may shadow a tombstone, in which case the merge installs the new entry over the
        // dead stable one.
        self.insert_hot(&mut hot, key, Arc::new(Entry::new(value)));
        self.score_miss(&hot);
        None
    }

    /// Returns the existing value for `key` if there is one. Otherwise stores `value` and returns
    /// it.
    ///
    /// The returned `bool` is `true` if the value was loaded and `false` if it was stored. Of
    /// several threads racing to `load_or_store` the same absent key, exactly one stores.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// assert_eq!(map.load_or_store("k", 1), (1, false));
    /// assert_eq!(map.load_or_store("k", 2), (1, true));
    /// ```
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool) {
        self.check_merge();
        let tables = self.tables.read();

        if let Some(current) = tables.stable.get(&key).and_then(|entry| entry.load()) {
            return (current, true);
        }

        let mut hot = tables.hot.write();
        self.score_miss(&hot);
        if let Some(current) = hot.get(&key).and_then(|entry| entry.load()) {
            return (current, true);
        }

        self.insert_hot(&mut hot, key, Arc::new(Entry::new(value.clone())));
        (value, false)
    }

    /// Removes the value for `key`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store(1, "a");
    /// map.delete(&1);
    /// assert_eq!(map.load(&1), None);
    /// ```
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_with(key, Entry::take);
    }

    /// Removes the value for `key`, returning it if there was one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store(1, "a");
    /// assert_eq!(map.load_and_delete(&1), Some("a"));
    /// assert_eq!(map.load_and_delete(&1), None);
    /// ```
    pub fn load_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_with(key, Entry::take)
    }

    /// Empties the entry for `key` with `remove`.
    ///
    /// An entry emptied in the stable table is registered in the hot table as a tombstone, so that
    /// the next merge evicts the key. Emptying and registering happen under the hot table's write
    /// lock, otherwise a concurrent insert into the hot table could be overwritten by the
    /// tombstone.
    fn remove_with<Q, R, F>(&self, key: &Q, remove: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: Fn(&Entry<V>) -> Option<R>,
    {
        self.check_merge();
        let tables = self.tables.read();

        if let Some((stable_key, entry)) = tables.stable.get_key_value(key) {
            if entry.is_occupied() {
                let mut hot = tables.hot.write();
                let removed = remove(entry);
                if removed.is_some() {
                    self.insert_hot(&mut hot, stable_key.clone(), Arc::clone(entry));
                    self.score_miss(&hot);
                }
                return removed;
            }
        }

        let hot = tables.hot.read();
        let entry = hot.get(key)?;
        self.score_miss(&hot);
        remove(entry)
    }

    /// Clears the map, removing all key-value pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.reset();
        self.trigger.reset();
        debug!("cleared map");
    }
}

impl<K, V, S> RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    S: BuildHasher + Clone,
{
    /// Replaces the value for `key` with `new` if it is currently equal to `old`.
    ///
    /// Returns `true` if the value was swapped. An absent key never matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store("k", 1);
    /// assert!(!map.compare_and_swap("k", &2, 3));
    /// assert!(map.compare_and_swap("k", &1, 3));
    /// assert_eq!(map.load("k"), Some(3));
    /// ```
    pub fn compare_and_swap<Q>(&self, key: &Q, old: &V, new: V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check_merge();
        let tables = self.tables.read();

        if let Some(entry) = tables.stable.get(key) {
            if entry.is_occupied() {
                return entry.compare_and_swap(old, new).is_ok();
            }
        }

        let hot = tables.hot.read();
        match hot.get(key) {
            Some(entry) => {
                self.score_miss(&hot);
                entry.compare_and_swap(old, new).is_ok()
            }
            None => false,
        }
    }

    /// Removes the value for `key` if it is currently equal to `old`.
    ///
    /// Returns `true` if the value was removed. An absent key never matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use rwmap::RwMap;
    ///
    /// let map = RwMap::new();
    /// map.store("k", 1);
    /// assert!(!map.compare_and_delete("k", &2));
    /// assert!(map.compare_and_delete("k", &1));
    /// assert_eq!(map.load("k"), None);
    /// ```
    pub fn compare_and_delete<Q>(&self, key: &Q, old: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_with(key, |entry| entry.compare_and_delete(old).then_some(()))
            .is_some()
    }
}

impl<K, V, S> PartialEq for RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    S: BuildHasher + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl<K, V, S> Eq for RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone + Eq,
    S: BuildHasher + Clone,
{
}

impl<K, V, S> Debug for RwMap<K, V, S>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone + Debug,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.snapshot().iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for &RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.store(key, value);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for &RwMap<K, V, S>
where
    K: Hash + Eq + Copy,
    V: Copy,
    S: BuildHasher + Clone,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&key, &value)| (key, value)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let map = Self::with_capacity_and_hasher(lower, S::default());
        (&map).extend(iter);
        map
    }
}

impl<K, V, S> Clone for RwMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> RwMap<K, V, S> {
        let snapshot = self.snapshot();
        let cloned = Self::with_capacity_and_hasher(snapshot.len(), self.build_hasher.clone())
            .with_config(self.config);
        {
            // nobody else can see `cloned` yet, so everything goes straight to the stable table.
            let mut tables = cloned.tables.write();
            for (key, value) in snapshot {
                tables.stable.insert(key, Arc::new(Entry::new(value)));
            }
        }
        cloned
    }
}

#[cfg(test)]
impl<K, V, S> RwMap<K, V, S> {
    /// Returns the number of keys in the stable and hot tables, live or not.
    fn tier_lens(&self) -> (usize, usize) {
        let tables = self.tables.read();
        let hot = tables.hot.read().len();
        (tables.stable.len(), hot)
    }
}
