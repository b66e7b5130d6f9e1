//! Error types for the baselines.

use thiserror::Error;

/// Result type alias using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Rejected baseline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A hash table needs at least one bucket.
    #[error("bucket count must be non-zero")]
    ZeroBuckets,
}
