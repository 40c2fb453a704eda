use crate::config::Config;
use crate::raw::Tables;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Decides when the hot table should be folded into the stable table.
///
/// Both fields are only reset while the outer lock is held for writing.
#[derive(Debug, Default)]
pub(crate) struct MergeTrigger {
    misses: AtomicUsize,
    ready: AtomicBool,
}

impl MergeTrigger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Records that an operation had to consult the hot table.
    ///
    /// Must be called with the hot table's lock held (in either mode), with `hot_len` read under
    /// that lock. An empty hot table has nothing to merge and is not scored.
    pub(crate) fn score_miss(&self, hot_len: usize, config: &Config) {
        if hot_len == 0 {
            return;
        }
        let misses = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
        if hot_len >= config.merge_size_threshold() || misses >= config.merge_miss_threshold() {
            self.ready.store(true, Ordering::Release);
        }
    }

    pub(crate) fn reset(&self) {
        self.misses.store(0, Ordering::Relaxed);
        self.ready.store(false, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeStats {
    /// Hot entries installed into the stable table.
    pub(crate) promoted: usize,
    /// Dead keys removed from the stable table.
    pub(crate) evicted: usize,
}

/// Folds the hot table into the stable table and leaves the hot table unallocated.
///
/// Requires exclusive access to both tables, i.e. the outer lock held for writing.
pub(crate) fn fold<K, V, S>(tables: &mut Tables<K, V, S>) -> MergeStats
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    let mut stats = MergeStats::default();
    let hot = tables.hot.get_mut();
    if hot.is_empty() {
        hot.reset();
        return stats;
    }

    let stable = &mut tables.stable;
    stable.reserve(hot.len());
    for (key, entry) in hot.drain() {
        if entry.is_occupied() {
            // either a brand-new key, or a tombstone whose entry was re-populated before we got
            // here; both belong in the stable table.
            stable.insert(key, entry);
            stats.promoted += 1;
        } else if stable.get(&key).map_or(false, |current| !current.is_occupied()) {
            stable.remove(&key);
            stats.evicted += 1;
        }
    }
    stats
}
