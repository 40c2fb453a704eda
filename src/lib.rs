//! A concurrent hash map built on reader/writer locks.
//!
//! [`RwMap`] offers the familiar "sync map" operations (`load`, `store`, `delete`, `swap`,
//! `compare_and_swap`, `compare_and_delete`, `load_and_delete`, `load_or_store`, `range` and
//! `clear`) to any number of threads, without epochs, hazard pointers, or any other form of
//! deferred reclamation. Instead, it splits its contents over two tables.
//!
//! # Two tables
//!
//! The _stable_ table holds the bulk of the map. It sits behind an outer `RwLock` that regular
//! operations only ever take for reading, so lookups, and updates of keys that already live in
//! the stable table, proceed in parallel. Values are kept in individually locked slots, which is
//! what lets an update change a value while only holding the table's read lock.
//!
//! The _hot_ table absorbs everything that changes the stable table's key set: keys inserted
//! since the last merge, and _tombstones_ for stable keys that were removed. It sits behind an
//! inner `RwLock` which can only be reached through a guard of the outer lock, so the locks are
//! always taken in the same order.
//!
//! # Merging
//!
//! Each time an operation has to look in the hot table, it scores a miss. Once the miss count or
//! the size of the hot table crosses a threshold (64 of either by default, see [`Config`]), a
//! merge becomes due. The next operation that can take the outer lock exclusively _without
//! waiting for it_ folds the hot table into the stable one: new keys are installed, dead ones
//! evicted, and the hot table starts over empty. If the lock is busy, the merge is simply left
//! for a later operation. [`RwMap::force_merge`] waits for the lock instead.
//!
//! Merging never changes what the map contains, only where it is stored.
//!
//! # Values
//!
//! Values are returned by cloning them out of their slot, so `V: Clone` is required for most
//! operations. Use `Arc<V>` for values that are expensive to clone. An absent value is
//! represented by `None`, which can never be stored.
//!
//! # Examples
//!
//! ```
//! use rwmap::RwMap;
//! use std::sync::Arc;
//!
//! let map = Arc::new(RwMap::new());
//! let threads: Vec<_> = (0..4)
//!     .map(|t| {
//!         let map = Arc::clone(&map);
//!         std::thread::spawn(move || {
//!             for i in 0..100 {
//!                 map.store(t * 100 + i, i);
//!             }
//!         })
//!     })
//!     .collect();
//! for t in threads {
//!     t.join().unwrap();
//! }
//!
//! assert_eq!(map.len(), 400);
//! assert_eq!(map.load(&250), Some(50));
//! ```
#![deny(
    missing_docs,
    missing_debug_implementations,
    unreachable_pub,
    rustdoc::broken_intra_doc_links
)]
#![warn(rust_2018_idioms)]

mod config;
mod entry;
mod error;
mod map;
mod merge;
mod raw;

pub mod iter;

#[cfg(feature = "rayon")]
mod rayon_impls;

#[cfg(feature = "serde")]
mod serde_impls;

pub use config::{
    Config, ConfigBuilder, DEFAULT_HOT_INITIAL_CAPACITY, DEFAULT_MERGE_MISS_THRESHOLD,
    DEFAULT_MERGE_SIZE_THRESHOLD,
};
pub use error::{ConfigError, Result};
pub use iter::Snapshot;
pub use map::RwMap;

/// Default hasher for [`RwMap`].
pub type DefaultHashBuilder = ahash::RandomState;
