//! The two non-deterministic inputs of normalization: wall-clock reads and random draws.
//!
//! Both are passed into [`crate::Normalizer`] so that tests (and `--seed` runs) can pin them.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Upper bound (exclusive) for synthesized `seed`/`versionNonce` values.
pub const SEED_BOUND: u32 = 2_147_483_647;

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

pub trait RandomSource {
    /// Uniform draw in `0..SEED_BOUND`.
    fn next_seed(&mut self) -> u32;

    fn fill_bytes(&mut self, dest: &mut [u8]);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_seed(&mut self) -> u32 {
        rand::rng().random_range(0..SEED_BOUND)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand::rng().fill_bytes(dest);
    }
}

/// Reproducible generator for snapshot-style output.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_seed(&mut self) -> u32 {
        self.0.random_range(0..SEED_BOUND)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_seed(&mut self) -> u32 {
        (**self).next_seed()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        (**self).fill_bytes(dest);
    }
}
