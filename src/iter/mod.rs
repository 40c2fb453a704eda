//! Point-in-time copies of a map's contents and the iterators over them.

use std::borrow::Borrow;
use std::collections::hash_map;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// A point-in-time copy of a map's contents.
///
/// See [`RwMap::snapshot`](crate::RwMap::snapshot) for details.
#[derive(Debug, Clone)]
pub struct Snapshot<K, V, S = crate::DefaultHashBuilder> {
    entries: HashMap<K, V, S>,
}

impl<K, V, S> Snapshot<K, V, S> {
    pub(crate) fn new(entries: HashMap<K, V, S>) -> Self {
        Self { entries }
    }

    /// Returns the number of entries captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An iterator visiting all key-value pairs in arbitrary order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// An iterator visiting all keys in arbitrary order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.entries.keys(),
        }
    }

    /// An iterator visiting all values in arbitrary order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.entries.values(),
        }
    }
}

impl<K, V, S> Snapshot<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Returns the captured value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get(key)
    }

    /// Returns `true` if a value for `key` was captured.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.contains_key(key)
    }
}

impl<K, V, S> PartialEq for Snapshot<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, V, S> Eq for Snapshot<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> From<Snapshot<K, V, S>> for HashMap<K, V, S> {
    fn from(snapshot: Snapshot<K, V, S>) -> Self {
        snapshot.entries
    }
}

impl<K, V, S> IntoIterator for Snapshot<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a Snapshot<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over a snapshot's entries.
///
/// See [`Snapshot::iter`] for details.
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    inner: hash_map::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over a snapshot's keys.
///
/// See [`Snapshot::keys`] for details.
#[derive(Debug, Clone)]
pub struct Keys<'a, K, V> {
    inner: hash_map::Keys<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over a snapshot's values.
///
/// See [`Snapshot::values`] for details.
#[derive(Debug, Clone)]
pub struct Values<'a, K, V> {
    inner: hash_map::Values<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An owning iterator over a snapshot's entries.
#[derive(Debug)]
pub struct IntoIter<K, V> {
    inner: hash_map::IntoIter<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
