//! Deterministic random number generation for training runs.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical epoch permutations
//! - **Forkable**: Independent streams for weight init and minibatch shuffling
//!
//! ```
//! use drive_clone::core::TrainRng;
//!
//! let mut rng = TrainRng::new(42);
//! let mut init_rng = rng.fork();
//!
//! // Same seed, same permutation
//! let mut again = TrainRng::new(42);
//! assert_eq!(rng.permutation(16), again.permutation(16));
//! # let _ = init_rng.normal();
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded RNG used for minibatch shuffling and parameter initialization.
///
/// Uses ChaCha8 so that a run is reproducible from its seed alone.
#[derive(Clone, Debug)]
pub struct TrainRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl TrainRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Fork an independent, deterministic stream.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E3779B97F4A7C15));
        Self {
            inner: ChaCha8Rng::seed_from_u64(fork_seed),
            seed: fork_seed,
            fork_counter: 0,
        }
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// A fresh random permutation of `0..len`.
    pub fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        self.shuffle(&mut indices);
        indices
    }

    /// Uniform sample in `[low, high)`.
    pub fn uniform(&mut self, low: f32, high: f32) -> f32 {
        self.inner.gen_range(low..high)
    }

    /// Standard normal sample (Box-Muller).
    pub fn normal(&mut self) -> f32 {
        // gen::<f32>() is in [0, 1); shift away from zero before the log
        let u1 = 1.0 - self.inner.gen::<f32>();
        let u2 = self.inner.gen::<f32>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
    }
}
