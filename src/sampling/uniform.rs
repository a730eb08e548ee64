use num_bigint::BigUint;
use rand::Rng;

/// Uniform integer in [0, 2^bits), assembled from 32-bit words.
pub fn uniform_bits<R: Rng + ?Sized>(bits: u32, rng: &mut R) -> BigUint {
    let words = bits.div_ceil(32) as usize;
    let mut digits: Vec<u32> = (0..words).map(|_| rng.random::<u32>()).collect();
    let spare = words as u32 * 32 - bits;
    if spare > 0 {
        if let Some(top) = digits.last_mut() {
            *top >>= spare;
        }
    }
    BigUint::from_slice(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use num_traits::{One, Zero};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_uniform_bits_bound() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for bits in [1u32, 7, 31, 32, 33, 64, 100, 128] {
            let bound = BigUint::one() << bits as usize;
            for _ in 0..200 {
                assert!(uniform_bits(bits, &mut rng) < bound, "bits = {bits}");
            }
        }
    }

    #[test]
    fn test_uniform_bits_uses_top_bit() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let half = BigUint::one() << 99usize;
        let high = (0..200)
            .filter(|_| uniform_bits(100, &mut rng) >= half)
            .count();
        assert!(high > 60 && high < 140, "high = {high}");
    }

    #[test]
    fn test_zero_bits() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(uniform_bits(0, &mut rng).is_zero());
    }
}
