//! Seeded randomness for the model.
//!
//! Every random decision the simulation makes goes through a [`RandomSource`], which is
//! handed to [`Simulation::new`](crate::Simulation::new) explicitly. A run is therefore fully
//! determined by its parameters and its seed.
//!
//! [`SeededRng`] is the production source. Independent streams are derived from one base seed
//! by name, so two streams seeded from the same base never share a sequence:
//!
//! ```rust
//! use herd_immunity::{RandomSource, SeededRng};
//!
//! let mut contacts = SeededRng::from_base_seed(42, "contacts");
//! let index = contacts.next_index(10);
//! assert!(index < 10);
//! ```
use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use xxhash_rust::xxh3::xxh3_64;

/// The draws the simulation needs. Implementations must be deterministic for a given seed.
pub trait RandomSource {
    /// A uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// A uniform index in `0..len`. Panics if `len` is zero.
    fn next_index(&mut self, len: usize) -> usize;

    /// `true` with probability `p`, decided by `next_unit() < p`.
    fn next_bool(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }
}

fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// A [`RandomSource`] backed by `SmallRng`.
#[derive(Clone, Debug)]
pub struct SeededRng {
    rng: SmallRng,
}

impl SeededRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        SeededRng {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Derives the stream called `name` from `base_seed`.
    pub fn from_base_seed(base_seed: u64, name: &str) -> Self {
        trace!("creating new RNG (seed={}) for stream {}", base_seed, name);
        Self::seed_from_u64(base_seed.wrapping_add(hash_str(name)))
    }
}

impl RandomSource for SeededRng {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot sample an index from an empty range");
        // Sampling over `u32` is noticeably faster than over `usize`.
        match u32::try_from(len) {
            Ok(len) => self.rng.random_range(0..len) as usize,
            Err(_) => self.rng.random_range(0..len),
        }
    }
}
