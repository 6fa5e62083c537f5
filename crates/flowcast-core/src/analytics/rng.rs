//! Injectable randomness for simulations

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws; normals are derived with Box–Muller
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn next_uniform(&mut self) -> f64;

    /// Standard normal draw
    ///
    /// `u1` is taken as `1 - uniform` so it lies in `(0, 1]` and the log is
    /// always finite.
    fn next_standard_normal(&mut self) -> f64 {
        let u1 = 1.0 - self.next_uniform();
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).sin()
    }
}

/// Seeded PRNG wrapper
///
/// The same seed always produces the same sequence.
pub struct SeededRandom {
    inner: StdRng,
    seed: u64,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from the system clock
    pub fn from_clock() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::from_seed(seed)
    }

    /// Seed used for initialisation
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}
