use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use rayon::prelude::*;

use crate::ring::modular::{center_in_place, rescale_round, split_digit};

/// Products with at least this many output coefficients are computed on the rayon pool.
const PAR_MUL_THRESHOLD: usize = 256;

/// Dense polynomial over Z, coefficient i is the coefficient of x^i.
///
/// Ring elements of Z[x]/(x^d+1) are kept with exactly d coefficients; intermediate
/// products may be longer until they are folded back with [`Poly::fold_cyclotomic`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Poly {
    pub coeffs: Vec<BigInt>,
}

impl Poly {
    /// Zero polynomial with n coefficients.
    pub fn zero(n: usize) -> Self {
        Self {
            coeffs: vec![BigInt::zero(); n],
        }
    }

    pub fn from_coeffs(coeffs: Vec<BigInt>) -> Self {
        Self { coeffs }
    }

    pub fn from_i64(coeffs: &[i64]) -> Self {
        Self {
            coeffs: coeffs.iter().map(|&c| BigInt::from(c)).collect(),
        }
    }

    /// Number of stored coefficients (not the degree).
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_zero())
    }

    /// Degree of the highest non-zero coefficient, `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.iter().rposition(|c| !c.is_zero())
    }

    /// Coefficient of x^i, zero beyond the stored length.
    pub fn coeff(&self, i: usize) -> BigInt {
        self.coeffs.get(i).cloned().unwrap_or_default()
    }

    /// Pad with zeros (or drop trailing coefficients) to exactly n coefficients.
    pub fn resize(&mut self, n: usize) {
        self.coeffs.resize(n, BigInt::zero());
    }

    /// Drop trailing zero coefficients.
    pub fn trim(&mut self) {
        let len = self.degree().map_or(0, |d| d + 1);
        self.coeffs.truncate(len);
    }

    pub fn add(&self, other: &Self) -> Self {
        let n = self.len().max(other.len());
        let coeffs = (0..n)
            .map(|i| match (self.coeffs.get(i), other.coeffs.get(i)) {
                (Some(a), Some(b)) => a + b,
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => unreachable!(),
            })
            .collect();
        Self { coeffs }
    }

    pub fn sub(&self, other: &Self) -> Self {
        let n = self.len().max(other.len());
        let coeffs = (0..n)
            .map(|i| match (self.coeffs.get(i), other.coeffs.get(i)) {
                (Some(a), Some(b)) => a - b,
                (Some(a), None) => a.clone(),
                (None, Some(b)) => -b,
                (None, None) => unreachable!(),
            })
            .collect();
        Self { coeffs }
    }

    pub fn add_assign(&mut self, other: &Self) {
        if other.len() > self.len() {
            self.resize(other.len());
        }
        for (a, b) in self.coeffs.iter_mut().zip(other.coeffs.iter()) {
            *a += b;
        }
    }

    pub fn neg(&self) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| -c).collect(),
        }
    }

    pub fn scalar_mul(&self, k: &BigInt) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| c * k).collect(),
        }
    }

    /// Full product in Z[x] (no cyclotomic reduction), length len(a)+len(b)-1.
    pub fn mul(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::default();
        }
        let (a, b) = (&self.coeffs, &other.coeffs);
        let out_len = a.len() + b.len() - 1;
        let cell = |k: usize| {
            let lo = k.saturating_sub(b.len() - 1);
            let hi = k.min(a.len() - 1);
            let mut acc = BigInt::zero();
            for i in lo..=hi {
                let (x, y) = (&a[i], &b[k - i]);
                if x.is_zero() || y.is_zero() {
                    continue;
                }
                acc += x * y;
            }
            acc
        };
        let coeffs = if out_len >= PAR_MUL_THRESHOLD {
            (0..out_len).into_par_iter().map(cell).collect()
        } else {
            (0..out_len).map(cell).collect()
        };
        Self { coeffs }
    }

    /// Full product with a polynomial whose coefficients fit in machine words.
    pub fn mul_small(&self, small: &[i64]) -> Self {
        if self.is_empty() || small.is_empty() {
            return Self::default();
        }
        let mut coeffs = vec![BigInt::zero(); self.len() + small.len() - 1];
        for (j, &s) in small.iter().enumerate() {
            if s == 0 {
                continue;
            }
            for (i, c) in self.coeffs.iter().enumerate() {
                if !c.is_zero() {
                    coeffs[i + j] += c * s;
                }
            }
        }
        Self { coeffs }
    }

    /// Reduce modulo x^d+1 by folding the upper part onto the lower d coefficients.
    ///
    /// Uses x^d ≡ -1: coefficient i ≥ d lands on i mod d with sign (-1)^(i/d).
    /// Products of two ring elements only fold once; longer inputs wrap around
    /// as often as needed. A zero `d` leaves the empty polynomial.
    pub fn fold_cyclotomic(&mut self, d: usize) {
        if self.len() <= d {
            self.resize(d);
            return;
        }
        if d == 0 {
            self.coeffs.clear();
            return;
        }
        let high = self.coeffs.split_off(d);
        for (k, h) in high.into_iter().enumerate() {
            if h.is_zero() {
                continue;
            }
            let target = &mut self.coeffs[k % d];
            if (k / d) % 2 == 0 {
                *target -= h;
            } else {
                *target += h;
            }
        }
    }

    /// Polynomial long division by a monic divisor: returns (quotient, remainder).
    ///
    /// This is the generic reference reduction; the remainder has length
    /// `len(divisor) - 1`. `None` when the divisor is zero or not monic.
    pub fn div_rem_monic(&self, divisor: &Self) -> Option<(Self, Self)> {
        let ddeg = divisor.degree()?;
        if !divisor.coeffs[ddeg].is_one() {
            return None;
        }

        let mut rem = self.coeffs.clone();
        if rem.len() <= ddeg {
            rem.resize(ddeg, BigInt::zero());
            return Some((Self::default(), Self { coeffs: rem }));
        }
        let mut quot = vec![BigInt::zero(); rem.len() - ddeg];
        for k in (ddeg..rem.len()).rev() {
            let lead = std::mem::take(&mut rem[k]);
            if lead.is_zero() {
                continue;
            }
            let shift = k - ddeg;
            for (j, dc) in divisor.coeffs[..ddeg].iter().enumerate() {
                if !dc.is_zero() {
                    rem[shift + j] -= &lead * dc;
                }
            }
            quot[shift] = lead;
        }
        rem.truncate(ddeg);
        Some((Self { coeffs: quot }, Self { coeffs: rem }))
    }

    /// The cyclotomic polynomial x^d + 1.
    pub fn cyclotomic(d: usize) -> Self {
        let mut phi = Self::zero(d + 1);
        phi.coeffs[0] = BigInt::one();
        phi.coeffs[d] = BigInt::one();
        phi
    }

    /// Centered reduction of every coefficient into (-m/2, m/2].
    pub fn center_mod(&mut self, m: &BigInt, half: &BigInt) {
        for c in self.coeffs.iter_mut() {
            center_in_place(c, m, half);
        }
    }

    /// Coefficient-wise round(t·c / q) with the remainder rule of [`rescale_round`].
    pub fn rescale(&self, t: &BigInt, q: &BigInt, half_q: &BigInt) -> Self {
        Self {
            coeffs: self
                .coeffs
                .iter()
                .map(|c| rescale_round(c, t, q, half_q))
                .collect(),
        }
    }

    /// Split into two base-`base` digit polynomials: self = low + base·high.
    pub fn split_digits(&self, base: &BigInt) -> (Self, Self) {
        let (low, high): (Vec<_>, Vec<_>) =
            self.coeffs.iter().map(|c| split_digit(c, base)).unzip();
        (Self { coeffs: low }, Self { coeffs: high })
    }

    /// Infinity norm.
    pub fn max_abs(&self) -> BigInt {
        self.coeffs
            .iter()
            .map(|c| c.abs())
            .max()
            .unwrap_or_default()
    }
}

const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

fn superscript(exp: usize) -> String {
    exp.to_string()
        .bytes()
        .map(|b| SUPERSCRIPTS[(b - b'0') as usize])
        .collect()
}

/// Highest degree first, e.g. `3x²-x+1`; unit coefficients are elided except on
/// the constant term.
impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (i, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            if c.is_positive() && !first {
                f.write_str("+")?;
            }
            if i > 0 && c.is_one() {
                // implicit 1
            } else if i > 0 && *c == -BigInt::one() {
                f.write_str("-")?;
            } else {
                write!(f, "{c}")?;
            }
            first = false;
            if i > 0 {
                f.write_str("x")?;
            }
            if i > 1 {
                f.write_str(&superscript(i))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::modular::pow2;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn p(c: &[i64]) -> Poly {
        Poly::from_i64(c)
    }

    #[test]
    fn test_add_sub_unequal_lengths() {
        let a = p(&[1, 2, 3]);
        let b = p(&[5, 6]);
        assert_eq!(a.add(&b), p(&[6, 8, 3]));
        assert_eq!(b.sub(&a), p(&[4, 4, -3]));
    }

    #[test]
    fn test_mul_full() {
        // (1 + x)(1 - x) = 1 - x^2
        let c = p(&[1, 1]).mul(&p(&[1, -1]));
        assert_eq!(c, p(&[1, 0, -1]));
    }

    #[test]
    fn test_mul_small_matches_mul() {
        let a = p(&[3, -7, 0, 11, 5]);
        let s = [2i64, 0, -1, 4];
        assert_eq!(a.mul_small(&s), a.mul(&Poly::from_i64(&s)));
    }

    #[test]
    fn test_fold_wraparound() {
        // x^3 * x^3 = x^6 = -x^2 mod x^4+1
        let x3 = p(&[0, 0, 0, 1]);
        let mut c = x3.mul(&x3);
        c.fold_cyclotomic(4);
        assert_eq!(c, p(&[0, 0, -1, 0]));
    }

    #[test]
    fn test_fold_short_input_is_padded() {
        let mut c = p(&[4, 5]);
        c.fold_cyclotomic(4);
        assert_eq!(c, p(&[4, 5, 0, 0]));
    }

    #[test]
    fn test_fold_matches_long_division() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for d in [1usize, 2, 8, 32, 128] {
            let phi = Poly::cyclotomic(d);
            // Random polynomials of degree < 2d-1 with 200-bit coefficients.
            let len = 2 * d - 1;
            let coeffs = (0..len)
                .map(|_| {
                    let hi: i128 = rng.random();
                    let lo: u64 = rng.random();
                    (BigInt::from(hi) << 72) + BigInt::from(lo)
                })
                .collect();
            let a = Poly::from_coeffs(coeffs);
            let (_, naive) = a.div_rem_monic(&phi).unwrap();
            let mut folded = a.clone();
            folded.fold_cyclotomic(d);
            assert_eq!(folded, naive, "d = {d}");
        }
    }

    #[test]
    fn test_fold_long_input_wraps_repeatedly() {
        // x^9 = x * (x^4)^2 = x, x^5 = -x, x^12 = (x^4)^3 = -1 mod x^4+1
        let mut c = Poly::zero(13);
        c.coeffs[9] = BigInt::from(3);
        c.coeffs[5] = BigInt::from(2);
        c.coeffs[12] = BigInt::from(7);
        c.coeffs[0] = BigInt::from(1);
        let (_, naive) = c.div_rem_monic(&Poly::cyclotomic(4)).unwrap();
        c.fold_cyclotomic(4);
        assert_eq!(c, p(&[-6, 1, 0, 0]));
        assert_eq!(c, naive);
    }

    #[test]
    fn test_div_rem_rejects_bad_divisor() {
        let a = p(&[1, 2, 3]);
        assert!(a.div_rem_monic(&Poly::zero(3)).is_none());
        assert!(a.div_rem_monic(&p(&[1, 2])).is_none());
    }

    #[test]
    fn test_div_rem_monic_reconstructs() {
        let a = p(&[5, -3, 2, 7, 0, 1, 9]);
        let div = p(&[1, 0, 2, 1]); // x^3 + 2x^2 + 1
        let (q, r) = a.div_rem_monic(&div).unwrap();
        assert_eq!(r.len(), 3);
        let mut back = q.mul(&div).add(&r);
        back.trim();
        assert_eq!(back, a);
    }

    #[test]
    fn test_center_and_rescale() {
        let q = pow2(8);
        let half = pow2(7);
        let mut a = p(&[0, 128, 129, -129, 300]);
        a.center_mod(&q, &half);
        assert_eq!(a, p(&[0, 128, -127, 127, 44]));

        let t = BigInt::from(2);
        let r = p(&[64, 65, -65, 192]).rescale(&t, &q, &half);
        // 2*64/256 = 0.5 -> 0 (ties down), 0.507 -> 1, -0.507 -> -1, 1.5 -> 1
        assert_eq!(r, p(&[0, 1, -1, 1]));
    }

    #[test]
    fn test_split_digits_reconstructs() {
        let base = pow2(16);
        let a = p(&[-1, 0, 65_535, 65_536, -1_000_000, 123_456_789]);
        let (lo, hi) = a.split_digits(&base);
        assert_eq!(lo.add(&hi.scalar_mul(&base)), a);
    }

    #[test]
    fn test_display() {
        assert_eq!(p(&[1, 0, 3]).to_string(), "3x²+1");
        assert_eq!(p(&[7, -2, 0, -1]).to_string(), "-x³-2x+7");
        assert_eq!(p(&[0, 1]).to_string(), "x");
        assert_eq!(p(&[-1]).to_string(), "-1");
        let mut big = Poly::zero(13);
        big.coeffs[12] = BigInt::from(2);
        assert_eq!(big.to_string(), "2x¹²");
        assert_eq!(Poly::zero(4).to_string(), "");
    }
}
