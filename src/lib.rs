//! # fandv: Fan-Vercauteren somewhat-homomorphic encryption
//!
//! Integers are encrypted under the FV scheme over Z_q[x]/(x^d+1) with
//! q = 2^qpow, and can be added, subtracted and multiplied while encrypted.
//! Ciphertexts are collected into vectors and column-major matrices with
//! elementwise algebra, reductions and a parallel matrix product.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fandv::prelude::*;
//!
//! let params = fandv::params::presets::compact().unwrap();
//! let mut rng = Sampler::from_seed(7);
//! let (sk, pk, _rlk) = keygen_with_rng(&params, &mut rng);
//!
//! let a = pk.encrypt_with_rng(6, &mut rng).unwrap();
//! let b = pk.encrypt_with_rng(-7, &mut rng).unwrap();
//! let prod = a.mul(&b).unwrap();
//! assert_eq!(sk.decrypt(&prod).unwrap(), num_bigint::BigInt::from(-42));
//! ```
//!
//! Arithmetic is exact big-integer arithmetic with schoolbook ring products,
//! so the ring degree dominates the cost. Noise growth is not tracked: a
//! ciphertext that has gone through too many multiplications decrypts to
//! garbage without an error.

pub mod collections;
pub mod error;
pub mod fv;
pub mod parallel;
pub mod params;
pub mod persist;
pub mod ring;
pub mod sampling;

/// Convenient re-exports for common types and functions.
pub mod prelude {
    pub use crate::collections::{CiphertextMatrix, CiphertextVector};
    pub use crate::error::{FvError, Result};
    pub use crate::fv::{keygen, keygen_with_rng, Ciphertext, PublicKey, RelinKey, SecretKey};
    pub use crate::parallel::{CancelToken, WorkerPool};
    pub use crate::params::{Parameters, ParametersBuilder};
    pub use crate::ring::Poly;
    pub use crate::sampling::{Randomness, Sampler};
}
