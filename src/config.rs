//! Configuration Module
//!
//! Handles loading and validating cache configuration, either from
//! environment variables or through builder-style setters.

use std::env;
use std::time::Duration;

use crate::cache::PolicyKind;
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Leaving both `capacity` and `memory_ceiling` unset makes the cache unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: Option<usize>,
    /// Maximum aggregate estimated size of all live entries, in bytes
    pub memory_ceiling: Option<usize>,
    /// Eviction discipline, fixed for the life of the cache
    pub policy: PolicyKind,
    /// TTL applied to entries inserted without an explicit TTL
    pub default_ttl: Option<Duration>,
    /// Hold values through non-owning references
    pub weak_values: bool,
    /// Interval between background expiry sweeps
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum entries, `0`/`none` for unbounded (default: 1000)
    /// - `CACHE_MEMORY_CEILING` - Memory ceiling in bytes, `0`/`none` for unbounded (default: none)
    /// - `CACHE_POLICY` - `lru`, `lfu` or `fifo` (default: lru)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds, `0`/`none` for no TTL (default: none)
    /// - `CACHE_WEAK_VALUES` - `true`/`false` (default: false)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            capacity: env_optional("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            memory_ceiling: env_optional("CACHE_MEMORY_CEILING")
                .unwrap_or(defaults.memory_ceiling),
            policy: env::var("CACHE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.policy),
            default_ttl: env_optional("CACHE_DEFAULT_TTL")
                .map(|secs| secs.map(Duration::from_secs))
                .unwrap_or(defaults.default_ttl),
            weak_values: env::var("CACHE_WEAK_VALUES")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.weak_values),
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Sets the entry-count bound.
    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the memory bound in bytes.
    pub fn with_memory_ceiling(mut self, ceiling: Option<usize>) -> Self {
        self.memory_ceiling = ceiling;
        self
    }

    /// Sets the eviction policy.
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the TTL used when `put` is called without one.
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enables or disables weak value semantics.
    pub fn with_weak_values(mut self, weak: bool) -> Self {
        self.weak_values = weak;
        self
    }

    /// Sets the background sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    // == Validate ==
    /// Rejects bounds that no entry could ever satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == Some(0) {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.memory_ceiling == Some(0) {
            return Err(CacheError::InvalidConfig(
                "memory ceiling must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns true if neither an entry-count nor a memory bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.capacity.is_none() && self.memory_ceiling.is_none()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Some(1000),
            memory_ceiling: None,
            policy: PolicyKind::Lru,
            default_ttl: None,
            weak_values: false,
            sweep_interval: Duration::from_secs(1),
        }
    }
}

/// Reads an optional numeric bound.
///
/// Outer `None` means "not set or unparsable", inner `None` means "explicitly unbounded".
fn env_optional<T>(name: &str) -> Option<Option<T>>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let raw = env::var(name).ok()?;
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    let value: T = raw.parse().ok()?;
    if value == T::default() {
        Some(None)
    } else {
        Some(Some(value))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
