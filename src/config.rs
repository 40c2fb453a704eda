//! Tuning knobs for [`RwMap`](crate::RwMap).

use crate::error::{ConfigError, Result};

/// Number of hot-table misses after which a merge is requested.
pub const DEFAULT_MERGE_MISS_THRESHOLD: usize = 64;

/// Hot-table size at which a merge is requested.
pub const DEFAULT_MERGE_SIZE_THRESHOLD: usize = 64;

/// Capacity reserved when the hot table is first allocated.
pub const DEFAULT_HOT_INITIAL_CAPACITY: usize = 8;

/// Merge heuristic configuration for a map.
///
/// A merge becomes due once the hot table has been consulted `merge_miss_threshold` times, or
/// once it holds `merge_size_threshold` entries, whichever comes first.
///
/// # Examples
///
/// ```
/// use rwmap::{Config, RwMap};
///
/// let config = Config::builder()
///     .merge_miss_threshold(128)
///     .merge_size_threshold(32)
///     .build()
///     .unwrap();
/// let map: RwMap<u64, u64> = RwMap::new().with_config(config);
/// assert_eq!(map.config().merge_size_threshold(), 32);
/// ```
///
/// The fields are private, so a `Config` can only come from [`Config::default`] or a validated
/// [`ConfigBuilder`]:
///
/// ```compile_fail
/// use rwmap::Config;
///
/// let config = Config {
///     merge_miss_threshold: 0,
///     merge_size_threshold: 0,
///     hot_initial_capacity: 0,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    merge_miss_threshold: usize,
    merge_size_threshold: usize,
    hot_initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            merge_miss_threshold: DEFAULT_MERGE_MISS_THRESHOLD,
            merge_size_threshold: DEFAULT_MERGE_SIZE_THRESHOLD,
            hot_initial_capacity: DEFAULT_HOT_INITIAL_CAPACITY,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Hot-table misses after which a merge is due. Never zero.
    pub fn merge_miss_threshold(&self) -> usize {
        self.merge_miss_threshold
    }

    /// Hot-table size at which a merge is due. Never zero.
    pub fn merge_size_threshold(&self) -> usize {
        self.merge_size_threshold
    }

    /// Capacity reserved when the hot table is first allocated after a merge or clear.
    pub fn hot_initial_capacity(&self) -> usize {
        self.hot_initial_capacity
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of hot-table misses that makes a merge due
    pub fn merge_miss_threshold(mut self, misses: usize) -> Self {
        self.config.merge_miss_threshold = misses;
        self
    }

    /// Set the hot-table size that makes a merge due
    pub fn merge_size_threshold(mut self, entries: usize) -> Self {
        self.config.merge_size_threshold = entries;
        self
    }

    /// Set the capacity reserved for a newly allocated hot table
    pub fn hot_initial_capacity(mut self, capacity: usize) -> Self {
        self.config.hot_initial_capacity = capacity;
        self
    }

    /// Validate and return the config. Both thresholds must be non-zero.
    pub fn build(self) -> Result<Config> {
        if self.config.merge_miss_threshold == 0 {
            return Err(ConfigError::ZeroMissThreshold);
        }
        if self.config.merge_size_threshold == 0 {
            return Err(ConfigError::ZeroSizeThreshold);
        }
        Ok(self.config)
    }
}
