use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use tracing::{debug, instrument};
use zeroize::Zeroize;

use crate::params::Parameters;
use crate::ring::poly::Poly;
use crate::sampling::{Randomness, Sampler};

/// FV secret key: a ring element s with small (noise-distributed) coefficients.
pub struct SecretKey {
    pub(crate) s: Vec<i64>,
    pub(crate) params: Arc<Parameters>,
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.s.zeroize();
    }
}

impl SecretKey {
    pub(crate) fn from_coeffs(s: Vec<i64>, params: Arc<Parameters>) -> Self {
        Self { s, params }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub(crate) fn poly(&self) -> Poly {
        Poly::from_i64(&self.s)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("ring_degree", &self.params.ring_degree)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fan and Vercauteren private key")?;
        write!(f, "s = {}", self.poly())
    }
}

/// FV public key (p0, p1) with p0 = -(p1·s + e).
///
/// Holds the relinearization key generated with it; every ciphertext it
/// produces shares that key.
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub(crate) p0: Poly,
    pub(crate) p1: Poly,
    pub(crate) params: Arc<Parameters>,
    pub(crate) rlk: Arc<RelinKey>,
}

impl PublicKey {
    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn relin_key(&self) -> &Arc<RelinKey> {
        &self.rlk
    }

    pub fn p0(&self) -> &Poly {
        &self.p0
    }

    pub fn p1(&self) -> &Poly {
        &self.p1
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.p0 == other.p0 && self.p1 == other.p1 && self.rlk == other.rlk
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fan and Vercauteren public key")?;
        writeln!(f, "( p₀ = {},", self.p0)?;
        write!(f, "p₁ = {} )", self.p1)
    }
}

/// Relinearization key for the two base-T digits of a degree-2 component.
///
/// For digit j: rlk0j + rlk1j·s ≈ T^j·s², i.e.
/// rlk0j = -(a_j·s + e_j) + T^j·s² and rlk1j = a_j.
#[derive(Clone, Debug, PartialEq)]
pub struct RelinKey {
    pub(crate) rlk00: Poly,
    pub(crate) rlk01: Poly,
    pub(crate) rlk10: Poly,
    pub(crate) rlk11: Poly,
    pub(crate) params: Arc<Parameters>,
}

impl RelinKey {
    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    /// The four key polynomials in storage order rlk00, rlk01, rlk10, rlk11.
    pub fn polys(&self) -> [&Poly; 4] {
        [&self.rlk00, &self.rlk01, &self.rlk10, &self.rlk11]
    }
}

impl fmt::Display for RelinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fan and Vercauteren relinearisation key")?;
        writeln!(f, "( rlk₀₀ = {},", self.rlk00)?;
        writeln!(f, "rlk₀₁ = {},", self.rlk01)?;
        writeln!(f, "rlk₁₀ = {},", self.rlk10)?;
        write!(f, "rlk₁₁ = {} )", self.rlk11)
    }
}

/// Generate a key set with an OS-seeded sampler.
pub fn keygen(params: &Arc<Parameters>) -> (SecretKey, PublicKey, Arc<RelinKey>) {
    let mut sampler = Sampler::from_os_rng();
    keygen_with_rng(params, &mut sampler)
}

/// Generate secret, public and relinearization keys from one secret.
#[instrument(skip_all, fields(d = params.ring_degree, qpow = params.qpow))]
pub fn keygen_with_rng<S: Randomness + ?Sized>(
    params: &Arc<Parameters>,
    rng: &mut S,
) -> (SecretKey, PublicKey, Arc<RelinKey>) {
    let d = params.ring_degree;
    let s = rng.noise_vec(d, params.sigma);

    let (p0, p1) = masked_pair(params, &s, None, rng);

    let mut s_sq = Poly::from_i64(&s).mul_small(&s);
    s_sq.fold_cyclotomic(d);
    let (rlk00, rlk01) = masked_pair(params, &s, Some(s_sq.clone()), rng);
    let (rlk10, rlk11) = masked_pair(params, &s, Some(s_sq.scalar_mul(&params.relin_base)), rng);

    let rlk = Arc::new(RelinKey {
        rlk00,
        rlk01,
        rlk10,
        rlk11,
        params: params.clone(),
    });
    debug!("generated key set");

    let pk = PublicKey {
        p0,
        p1,
        params: params.clone(),
        rlk: rlk.clone(),
    };
    (SecretKey::from_coeffs(s, params.clone()), pk, rlk)
}

/// Sample a fresh uniform `a` and noise `e`; return (-(a·s + e) + payload, a).
fn masked_pair<S: Randomness + ?Sized>(
    params: &Parameters,
    s: &[i64],
    payload: Option<Poly>,
    rng: &mut S,
) -> (Poly, Poly) {
    let d = params.ring_degree;
    let mut a = rng.uniform_poly(d, params.qpow);
    params.center_q(&mut a);
    let e = Poly::from_coeffs(
        rng.noise_vec(d, params.sigma)
            .into_iter()
            .map(BigInt::from)
            .collect(),
    );

    let mut b = a.mul_small(s);
    b.fold_cyclotomic(d);
    let mut b = b.add(&e).neg();
    if let Some(payload) = payload {
        b.add_assign(&payload);
    }
    params.center_q(&mut b);
    (b, a)
}

impl Parameters {
    /// Shorthand for [`keygen`].
    pub fn keygen(self: &Arc<Self>) -> (SecretKey, PublicKey, Arc<RelinKey>) {
        keygen(self)
    }
}
