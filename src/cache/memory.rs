//! Memory Accounting Module
//!
//! Tracks the aggregate estimated size of live entries against an optional
//! ceiling, and defines the size estimation collaborator.

// == Size Estimator ==
/// Estimates the in-memory footprint of a value, in bytes.
///
/// Called exactly once per `put`; the result is stored with the entry and
/// never recomputed.
pub trait SizeEstimator<V: ?Sized>: Send + Sync {
    /// Returns the estimated size of `value`.
    fn estimate_size(&self, value: &V) -> usize;
}

impl<V: ?Sized, F> SizeEstimator<V> for F
where
    F: Fn(&V) -> usize + Send + Sync,
{
    fn estimate_size(&self, value: &V) -> usize {
        self(value)
    }
}

/// Default estimator: the shallow size of the value type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowSize;

impl<V> SizeEstimator<V> for ShallowSize {
    fn estimate_size(&self, _value: &V) -> usize {
        std::mem::size_of::<V>()
    }
}

// == Memory Accountant ==
/// Running total of entry sizes with an optional ceiling.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountant {
    /// Sum of `size_bytes` across live entries
    usage: usize,
    /// Upper bound for `usage`, None = unbounded
    ceiling: Option<usize>,
}

impl MemoryAccountant {
    // == Constructor ==
    /// Creates an accountant with zero usage.
    pub fn new(ceiling: Option<usize>) -> Self {
        Self { usage: 0, ceiling }
    }

    /// Records a new entry's size.
    pub fn add(&mut self, size_bytes: usize) {
        self.usage = self.usage.saturating_add(size_bytes);
    }

    /// Releases a removed entry's size.
    pub fn remove(&mut self, size_bytes: usize) {
        debug_assert!(size_bytes <= self.usage, "memory accounting underflow");
        self.usage = self.usage.saturating_sub(size_bytes);
    }

    /// Returns the bytes currently accounted for.
    pub fn current_usage(&self) -> usize {
        self.usage
    }

    /// Returns the configured ceiling.
    pub fn ceiling(&self) -> Option<usize> {
        self.ceiling
    }

    // == Would Exceed ==
    /// Checks whether adding `additional_bytes` would cross the ceiling.
    pub fn would_exceed(&self, additional_bytes: usize) -> bool {
        match self.ceiling {
            Some(ceiling) => self.usage.saturating_add(additional_bytes) > ceiling,
            None => false,
        }
    }

    /// Checks whether an entry could fit even in an empty cache.
    pub fn fits_when_empty(&self, size_bytes: usize) -> bool {
        self.ceiling.map_or(true, |ceiling| size_bytes <= ceiling)
    }

    /// Resets usage to zero.
    pub fn reset(&mut self) {
        self.usage = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accountant_add_remove() {
        let mut memory = MemoryAccountant::new(Some(100));
        memory.add(40);
        memory.add(25);
        assert_eq!(memory.current_usage(), 65);

        memory.remove(40);
        assert_eq!(memory.current_usage(), 25);
    }

    #[test]
    fn test_would_exceed_boundary() {
        let mut memory = MemoryAccountant::new(Some(100));
        memory.add(60);

        // Filling exactly to the ceiling is allowed
        assert!(!memory.would_exceed(40));
        assert!(memory.would_exceed(41));
    }

    #[test]
    fn test_unbounded_never_exceeds() {
        let mut memory = MemoryAccountant::new(None);
        memory.add(usize::MAX - 1);
        assert!(!memory.would_exceed(usize::MAX));
        assert!(memory.fits_when_empty(usize::MAX));
    }

    #[test]
    fn test_fits_when_empty() {
        let memory = MemoryAccountant::new(Some(64));
        assert!(memory.fits_when_empty(64));
        assert!(!memory.fits_when_empty(65));
    }

    #[test]
    fn test_reset() {
        let mut memory = MemoryAccountant::new(Some(10));
        memory.add(7);
        memory.reset();
        assert_eq!(memory.current_usage(), 0);
        assert_eq!(memory.ceiling(), Some(10));
    }

    #[test]
    fn test_closure_estimator() {
        let estimator = |value: &String| value.len();
        assert_eq!(estimator.estimate_size(&"hello".to_string()), 5);
    }

    #[test]
    fn test_shallow_size_estimator() {
        assert_eq!(
            SizeEstimator::<u64>::estimate_size(&ShallowSize, &7u64),
            std::mem::size_of::<u64>()
        );
    }
}
