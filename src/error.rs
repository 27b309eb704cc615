//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// Misses, evictions and expirations are ordinary outcomes and never surface
/// as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The entry alone exceeds the configured memory ceiling
    #[error("Entry too large: {size} bytes exceeds memory ceiling of {ceiling} bytes")]
    EntryTooLarge {
        /// Estimated size of the rejected entry
        size: usize,
        /// Configured memory ceiling
        ceiling: usize,
    },

    /// Eviction was requested from a policy that tracks no keys
    #[error("Eviction requested from an empty policy")]
    EmptyPolicy,

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_too_large_message() {
        let err = CacheError::EntryTooLarge {
            size: 2048,
            ceiling: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Entry too large: 2048 bytes exceeds memory ceiling of 1024 bytes"
        );
    }

    #[test]
    fn test_invalid_config_message() {
        let err = CacheError::InvalidConfig("capacity must be non-zero".to_string());
        assert!(err.to_string().contains("capacity must be non-zero"));
    }
}
