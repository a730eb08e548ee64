pub mod presets;

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::One;

use crate::error::{FvError, Result};
use crate::ring::modular::pow2;
use crate::ring::poly::Poly;

/// Parameters for the FV scheme over Z_q[x]/(x^d + 1) with q = 2^qpow.
///
/// Built once through [`ParametersBuilder`] and shared as `Arc<Parameters>` by
/// every key and ciphertext derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Ring degree d (power of 2).
    pub ring_degree: usize,
    /// Standard deviation of the noise distribution.
    pub sigma: f64,
    /// Ciphertext modulus exponent: q = 2^qpow.
    pub qpow: u32,
    /// Ciphertext modulus q.
    pub q: BigInt,
    /// Plaintext modulus t.
    pub t: BigInt,
    /// Relinearization base T, with T^2 >= q.
    pub relin_base: BigInt,
    /// Delta = floor(q / t).
    pub delta: BigInt,
    half_q: BigInt,
    half_t: BigInt,
}

impl Parameters {
    pub fn builder() -> ParametersBuilder {
        ParametersBuilder::new()
    }

    /// floor(q / 2), the upper end of the centered range.
    pub fn half_q(&self) -> &BigInt {
        &self.half_q
    }

    /// floor(t / 2).
    pub fn half_t(&self) -> &BigInt {
        &self.half_t
    }

    /// The cyclotomic polynomial Phi = x^d + 1.
    pub fn phi(&self) -> Poly {
        Poly::cyclotomic(self.ring_degree)
    }

    /// Reduce a product modulo Phi and center its coefficients modulo q.
    pub(crate) fn reduce(&self, poly: &mut Poly) {
        poly.fold_cyclotomic(self.ring_degree);
        poly.center_mod(&self.q, &self.half_q);
    }

    /// Center coefficients modulo q without a ring reduction.
    pub(crate) fn center_q(&self, poly: &mut Poly) {
        poly.center_mod(&self.q, &self.half_q);
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fan and Vercauteren parameters")?;
        writeln!(f, "phi = {}", self.phi())?;
        writeln!(f, "q = 2^{} = {}", self.qpow, self.q)?;
        writeln!(f, "t = {}", self.t)?;
        writeln!(f, "T = {}", self.relin_base)?;
        writeln!(f, "Delta = {}", self.delta)?;
        write!(f, "sigma = {}", self.sigma)
    }
}

/// Builder for [`Parameters`].
pub struct ParametersBuilder {
    ring_degree: usize,
    sigma: f64,
    qpow: u32,
    plain_modulus: BigInt,
    relin_base: Option<BigInt>,
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParametersBuilder {
    pub fn new() -> Self {
        Self {
            ring_degree: 4096,
            sigma: 16.0,
            qpow: 128,
            plain_modulus: BigInt::from(32768),
            relin_base: None, // 2^ceil(qpow/2)
        }
    }

    pub fn ring_degree(mut self, d: usize) -> Self {
        self.ring_degree = d;
        self
    }

    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn qpow(mut self, qpow: u32) -> Self {
        self.qpow = qpow;
        self
    }

    pub fn plain_modulus(mut self, t: impl Into<BigInt>) -> Self {
        self.plain_modulus = t.into();
        self
    }

    /// Plaintext modulus given as an exponent: t = 2^tpow.
    pub fn plain_modulus_pow(mut self, tpow: u32) -> Self {
        self.plain_modulus = pow2(tpow);
        self
    }

    pub fn relin_base(mut self, base: impl Into<BigInt>) -> Self {
        self.relin_base = Some(base.into());
        self
    }

    pub fn build(self) -> Result<Arc<Parameters>> {
        if !self.ring_degree.is_power_of_two() {
            return Err(FvError::InvalidParameters(format!(
                "ring degree must be a power of 2, got {}",
                self.ring_degree
            )));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(FvError::InvalidParameters(format!(
                "sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        let one = BigInt::one();
        if self.plain_modulus <= one {
            return Err(FvError::InvalidParameters(format!(
                "plaintext modulus must be > 1, got {}",
                self.plain_modulus
            )));
        }

        let q = pow2(self.qpow);
        if q <= self.plain_modulus {
            return Err(FvError::InvalidParameters(format!(
                "ciphertext modulus 2^{} must exceed plaintext modulus {}",
                self.qpow, self.plain_modulus
            )));
        }

        let relin_base = self
            .relin_base
            .unwrap_or_else(|| pow2(self.qpow.div_ceil(2)));
        if relin_base <= one {
            return Err(FvError::InvalidParameters(format!(
                "relinearization base must be >= 2, got {relin_base}"
            )));
        }
        // Relinearization uses exactly two base-T digits.
        if &relin_base * &relin_base < q {
            return Err(FvError::InvalidParameters(format!(
                "relinearization base {relin_base} too small: two digits cannot cover q = 2^{}",
                self.qpow
            )));
        }

        let delta = &q / &self.plain_modulus;
        let half_q = &q >> 1;
        let half_t = &self.plain_modulus >> 1;

        Ok(Arc::new(Parameters {
            ring_degree: self.ring_degree,
            sigma: self.sigma,
            qpow: self.qpow,
            q,
            t: self.plain_modulus,
            relin_base,
            delta,
            half_q,
            half_t,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ParametersBuilder::new().build().unwrap();
        assert_eq!(params.ring_degree, 4096);
        assert_eq!(params.q, pow2(128));
        assert_eq!(params.t, BigInt::from(32768));
        assert_eq!(params.delta, pow2(113));
        assert_eq!(params.relin_base, pow2(64));
        assert_eq!(params.half_q(), &pow2(127));
    }

    #[test]
    fn test_odd_qpow_rounds_relin_base_up() {
        let params = Parameters::builder().ring_degree(16).qpow(61).build().unwrap();
        assert_eq!(params.relin_base, pow2(31));
    }

    #[test]
    fn test_plain_modulus_pow() {
        let params = Parameters::builder()
            .ring_degree(16)
            .plain_modulus_pow(10)
            .build()
            .unwrap();
        assert_eq!(params.t, BigInt::from(1024));
    }

    #[test]
    fn test_rejects_bad_degree() {
        let err = Parameters::builder().ring_degree(12).build().unwrap_err();
        assert!(matches!(err, FvError::InvalidParameters(_)));
        assert!(Parameters::builder().ring_degree(0).build().is_err());
    }

    #[test]
    fn test_rejects_q_not_above_t() {
        assert!(Parameters::builder()
            .ring_degree(16)
            .qpow(15)
            .plain_modulus(32768)
            .build()
            .is_err());
        assert!(Parameters::builder().plain_modulus(1).build().is_err());
    }

    #[test]
    fn test_rejects_small_relin_base() {
        let err = Parameters::builder()
            .ring_degree(16)
            .qpow(128)
            .relin_base(pow2(63))
            .build()
            .unwrap_err();
        assert!(matches!(err, FvError::InvalidParameters(_)));
        assert!(Parameters::builder()
            .ring_degree(16)
            .qpow(128)
            .relin_base(pow2(64))
            .build()
            .is_ok());
    }

    #[test]
    fn test_rejects_bad_sigma() {
        assert!(Parameters::builder().sigma(0.0).build().is_err());
        assert!(Parameters::builder().sigma(f64::NAN).build().is_err());
    }

    #[test]
    fn test_display() {
        let params = Parameters::builder().ring_degree(4).build().unwrap();
        let shown = params.to_string();
        assert!(shown.starts_with("Fan and Vercauteren parameters"));
        assert!(shown.contains("phi = x⁴+1"));
        assert!(shown.contains("q = 2^128"));
    }
}
