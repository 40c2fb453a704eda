//! Error types for rwmap.
//!
//! Map operations never fail; only building a [`Config`](crate::Config) can.

use thiserror::Error;

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The error type for [`ConfigBuilder::build`](crate::ConfigBuilder::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// [`Config::merge_miss_threshold`](crate::Config::merge_miss_threshold) was zero.
    #[error("merge miss threshold must be greater than zero")]
    ZeroMissThreshold,

    /// [`Config::merge_size_threshold`](crate::Config::merge_size_threshold) was zero.
    #[error("merge size threshold must be greater than zero")]
    ZeroSizeThreshold,
}
