pub mod encoding;
pub mod encrypt;
pub mod eval;
pub mod keygen;

pub use encoding::{decode_int, encode_int, message_bits};
pub use keygen::{keygen, keygen_with_rng, PublicKey, RelinKey, SecretKey};

use std::fmt;
use std::sync::Arc;

use crate::error::{FvError, Result};
use crate::params::Parameters;
use crate::ring::poly::Poly;

/// An FV ciphertext (c0, c1) over Z_q[x]/(x^d+1), coefficients centered mod q.
///
/// Carries handles to the parameters and relinearization key it was produced
/// under so that it can be multiplied without extra arguments. Values are
/// immutable: every operation returns a new ciphertext.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub(crate) c0: Poly,
    pub(crate) c1: Poly,
    pub(crate) params: Arc<Parameters>,
    pub(crate) rlk: Arc<RelinKey>,
}

impl Ciphertext {
    pub(crate) fn from_parts(c0: Poly, c1: Poly, rlk: &Arc<RelinKey>) -> Self {
        Self {
            c0,
            c1,
            params: rlk.params.clone(),
            rlk: rlk.clone(),
        }
    }

    pub fn c0(&self) -> &Poly {
        &self.c0
    }

    pub fn c1(&self) -> &Poly {
        &self.c1
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn relin_key(&self) -> &Arc<RelinKey> {
        &self.rlk
    }

    /// Both operands must come from the same parameter set.
    pub(crate) fn check_compatible(&self, other: &Self) -> Result<()> {
        if Arc::ptr_eq(&self.params, &other.params) || self.params == other.params {
            Ok(())
        } else {
            Err(FvError::ParameterMismatch)
        }
    }
}

/// Ciphertexts compare by value: same polynomials under equal parameters.
impl PartialEq for Ciphertext {
    fn eq(&self, other: &Self) -> bool {
        self.c0 == other.c0 && self.c1 == other.c1 && self.params == other.params
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fan and Vercauteren cipher text")?;
        writeln!(f, "( c₀ = {},", self.c0)?;
        write!(f, "c₁ = {} )", self.c1)
    }
}
