// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Randomness sources for identifier generation and probabilistic sampling.
//!
//! Identifier generation and the sampling draw are the only places where
//! state is shared across concurrent requests. Both go through the
//! [`RandomSource`] trait so callers can supply a deterministic source in
//! tests while production code uses a thread-local generator.

use std::sync::{Mutex, PoisonError};

/// Uniform random values shared by concurrent requests.
///
/// Implementations must be safe to call from any thread without producing
/// correlated values across threads.
pub trait RandomSource: Send + Sync {
    /// Returns a value uniformly distributed over the whole `u64` range.
    fn next_u64(&self) -> u64;

    /// Returns a value uniformly distributed in `[0, 1)`.
    fn next_f64(&self) -> f64;
}

/// Thread-local `fastrand` generator.
///
/// Each thread owns an independently seeded generator, so no locking is
/// needed and concurrent requests never share generator state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastRandom;

impl RandomSource for FastRandom {
    fn next_u64(&self) -> u64 {
        fastrand::u64(..)
    }

    fn next_f64(&self) -> f64 {
        fastrand::f64()
    }
}

/// Deterministic generator for reproducible tests and replays.
///
/// The generator state is guarded by a mutex, so a single instance can be
/// shared across threads; the sequence is then only deterministic per call
/// order.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<fastrand::Rng>,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut fastrand::Rng) -> T) -> T {
        // A panic while holding the lock cannot leave the generator invalid
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }
}

impl RandomSource for SeededRandom {
    fn next_u64(&self) -> u64 {
        self.with_rng(|rng| rng.u64(..))
    }

    fn next_f64(&self) -> f64 {
        self.with_rng(fastrand::Rng::f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);

        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_next_f64_in_unit_interval() {
        let sources: Vec<Box<dyn RandomSource>> =
            vec![Box::new(FastRandom), Box::new(SeededRandom::new(7))];

        for source in sources {
            for _ in 0..1_000 {
                let value = source.next_f64();
                assert!((0.0..1.0).contains(&value), "{value} out of range");
            }
        }
    }

    #[test]
    fn test_fast_random_across_threads() {
        let source: Arc<dyn RandomSource> = Arc::new(FastRandom);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = Arc::clone(&source);
                std::thread::spawn(move || (0..64).map(|_| source.next_u64()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();

        assert_eq!(all.len(), total, "threads produced correlated values");
    }
}
