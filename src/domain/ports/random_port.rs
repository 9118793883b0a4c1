//! Randomness port definition.

/// Source of pseudo-random picks, injectable for deterministic tests.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;
}
