//! Binary encoding of signed integers as plaintext polynomials.
//!
//! Coefficient i of the plaintext is bit i of |m| carrying the sign of m, so
//! the polynomial evaluates to m at x = 2. Sums and products of encodings stay
//! valid as long as no coefficient wraps modulo t and the degree stays below d.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::{FvError, Result};

/// Largest number of message bits in one plaintext.
pub const MAX_MESSAGE_BITS: u32 = 31;

/// Message bits available in a ring of degree `d`.
pub fn message_bits(ring_degree: usize) -> u32 {
    MAX_MESSAGE_BITS.min(u32::try_from(ring_degree).unwrap_or(u32::MAX))
}

/// Encode `m` into `message_bits(d)` coefficients in {-1, 0, 1}.
pub fn encode_int(m: i64, ring_degree: usize) -> Result<Vec<i64>> {
    let bits = message_bits(ring_degree);
    let magnitude = m.unsigned_abs();
    if magnitude >> bits != 0 {
        return Err(FvError::EncodingRange { value: m, bits });
    }
    let sign = m.signum();
    Ok((0..bits).map(|i| ((magnitude >> i) & 1) as i64 * sign).collect())
}

/// Evaluate a decrypted plaintext at x = 2.
pub fn decode_int(coeffs: &[BigInt]) -> BigInt {
    coeffs
        .iter()
        .rev()
        .fold(BigInt::zero(), |acc, c| (acc << 1usize) + c)
}
