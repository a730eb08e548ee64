use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

/// 2^exp as a big integer.
pub fn pow2(exp: u32) -> BigInt {
    BigInt::one() << exp as usize
}

/// Centered reduction: map x to the representative of x mod m in (-m/2, m/2].
///
/// `half` must be floor(m/2); callers pass it in because it is fixed per modulus.
#[inline]
pub fn center(x: &BigInt, m: &BigInt, half: &BigInt) -> BigInt {
    let r = x.mod_floor(m);
    if &r > half {
        r - m
    } else {
        r
    }
}

/// In-place variant of [`center`], used on hot coefficient loops.
#[inline]
pub fn center_in_place(x: &mut BigInt, m: &BigInt, half: &BigInt) {
    let r = x.mod_floor(m);
    *x = if &r > half { r - m } else { r };
}

/// Scale x by t/q, rounding to nearest.
///
/// quotient = floor(t·x / q), remainder = (t·x) mod q in [0, q); the quotient is
/// bumped by one when the remainder exceeds q/2. Exact halves round down.
#[inline]
pub fn rescale_round(x: &BigInt, t: &BigInt, q: &BigInt, half_q: &BigInt) -> BigInt {
    let (quotient, remainder) = (t * x).div_mod_floor(q);
    if &remainder > half_q {
        quotient + 1
    } else {
        quotient
    }
}

/// Split x into two base-`base` digits: x = low + base·high with low in [0, base).
#[inline]
pub fn split_digit(x: &BigInt, base: &BigInt) -> (BigInt, BigInt) {
    let (high, low) = x.div_mod_floor(base);
    (low, high)
}

/// Sign of a machine integer as a big integer multiplier (0 for 0).
pub fn signum_i64(x: i64) -> BigInt {
    match x.signum() {
        0 => BigInt::zero(),
        1 => BigInt::one(),
        _ => -BigInt::one(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(x: i64) -> BigInt {
        BigInt::from(x)
    }

    #[test]
    fn test_center_range() {
        let m = big(16);
        let half = big(8);
        assert_eq!(center(&big(0), &m, &half), big(0));
        assert_eq!(center(&big(8), &m, &half), big(8));
        assert_eq!(center(&big(9), &m, &half), big(-7));
        assert_eq!(center(&big(-8), &m, &half), big(8));
        assert_eq!(center(&big(-9), &m, &half), big(7));
        assert_eq!(center(&big(33), &m, &half), big(1));
    }

    #[test]
    fn test_center_in_place_matches() {
        let m = big(1 << 20);
        let half = big(1 << 19);
        for x in [-3_000_000i64, -524_288, -1, 0, 524_288, 524_289, 9_999_999] {
            let mut y = big(x);
            center_in_place(&mut y, &m, &half);
            assert_eq!(y, center(&big(x), &m, &half));
        }
    }

    #[test]
    fn test_rescale_round() {
        // t/q = 1/4
        let t = big(1);
        let q = big(4);
        let half = big(2);
        assert_eq!(rescale_round(&big(5), &t, &q, &half), big(1)); // 1.25
        assert_eq!(rescale_round(&big(6), &t, &q, &half), big(1)); // 1.5 ties down
        assert_eq!(rescale_round(&big(7), &t, &q, &half), big(2)); // 1.75
        assert_eq!(rescale_round(&big(-5), &t, &q, &half), big(-1)); // -1.25
        assert_eq!(rescale_round(&big(-7), &t, &q, &half), big(-2)); // -1.75
    }

    #[test]
    fn test_split_digit() {
        let base = big(256);
        for x in [-70_000i64, -256, -1, 0, 1, 255, 256, 70_000] {
            let (lo, hi) = split_digit(&big(x), &base);
            assert!(lo >= big(0) && lo < base);
            assert_eq!(lo + &base * hi, big(x));
        }
    }

    #[test]
    fn test_pow2() {
        assert_eq!(pow2(0), big(1));
        assert_eq!(pow2(10), big(1024));
        assert_eq!(pow2(128).bits(), 129);
    }
}
