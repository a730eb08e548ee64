//! Randomness capability injected into key generation and encryption.
//!
//! Nothing in the crate draws from ambient state: callers hand a
//! [`Randomness`] implementation to every operation that samples. Every draw
//! takes `&mut self`, so one [`Sampler`] serves one caller at a time; give each
//! worker its own instance.

pub mod gaussian;
pub mod uniform;

use num_bigint::{BigInt, BigUint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::ring::poly::Poly;

pub use gaussian::CdtTable;
pub use uniform::uniform_bits;

/// Source of the two distributions the scheme needs.
pub trait Randomness {
    /// Uniform integer in [0, 2^bits).
    fn uniform_bits(&mut self, bits: u32) -> BigUint;

    /// One draw from the discrete Gaussian with standard deviation `sigma`.
    fn noise(&mut self, sigma: f64) -> i64;

    /// `n` noise coefficients.
    fn noise_vec(&mut self, n: usize, sigma: f64) -> Vec<i64> {
        (0..n).map(|_| self.noise(sigma)).collect()
    }

    /// Polynomial with `n` coefficients uniform in [0, 2^bits).
    fn uniform_poly(&mut self, n: usize, bits: u32) -> Poly {
        Poly::from_coeffs(
            (0..n)
                .map(|_| BigInt::from(self.uniform_bits(bits)))
                .collect(),
        )
    }
}

/// [`Randomness`] over any `rand` generator, caching the CDT table per sigma.
pub struct Sampler<R> {
    rng: R,
    table: Option<CdtTable>,
}

impl<R: Rng> Sampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, table: None }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl Sampler<ChaCha20Rng> {
    /// Deterministic sampler for tests and reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaCha20Rng::seed_from_u64(seed))
    }

    /// Sampler seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(ChaCha20Rng::from_os_rng())
    }
}

impl<R: Rng> Randomness for Sampler<R> {
    fn uniform_bits(&mut self, bits: u32) -> BigUint {
        uniform_bits(bits, &mut self.rng)
    }

    fn noise(&mut self, sigma: f64) -> i64 {
        if self.table.as_ref().is_some_and(|t| t.sigma() != sigma) {
            self.table = None;
        }
        let table = self.table.get_or_insert_with(|| CdtTable::new(sigma));
        table.sample(&mut self.rng)
    }
}
