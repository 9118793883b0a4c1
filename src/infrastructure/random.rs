//! Pseudo-random picks backed by `fastrand`.

use parking_lot::Mutex;

use crate::domain::ports::RandomSource;

/// Thread-safe random source.
#[derive(Debug)]
pub struct FastRandom {
    rng: Mutex<fastrand::Rng>,
}

impl FastRandom {
    /// Creates a source seeded from the OS.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a reproducible source.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for FastRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for FastRandom {
    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.lock().usize(..len)
    }
}
