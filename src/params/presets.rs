use std::sync::Arc;

use crate::error::Result;
use crate::params::{Parameters, ParametersBuilder};

/// The package defaults: d=4096, sigma=16, q=2^128, t=2^15, T=2^64.
///
/// Ring products are schoolbook over big integers, so a multiplication at this
/// size takes seconds.
pub fn standard() -> Result<Arc<Parameters>> {
    ParametersBuilder::new()
        .ring_degree(4096)
        .sigma(16.0)
        .qpow(128)
        .plain_modulus(32768)
        .build()
}

/// Compact parameters for tests and examples (no security).
/// d=64 leaves room for the product of two full 31-bit encodings (degree <= 60).
pub fn compact() -> Result<Arc<Parameters>> {
    ParametersBuilder::new()
        .ring_degree(64)
        .sigma(16.0)
        .qpow(128)
        .plain_modulus(32768)
        .build()
}

/// Tiny ring for serialization and display tests.
pub fn toy() -> Result<Arc<Parameters>> {
    ParametersBuilder::new()
        .ring_degree(8)
        .sigma(3.2)
        .qpow(64)
        .plain_modulus(256)
        .build()
}

/// Look up a preset by name, as accepted on the command line.
pub fn by_name(name: &str) -> Option<Result<Arc<Parameters>>> {
    match name {
        "standard" => Some(standard()),
        "compact" => Some(compact()),
        "toy" => Some(toy()),
        _ => None,
    }
}
