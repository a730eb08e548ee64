use std::sync::Arc;

use num_bigint::BigInt;
use tracing::instrument;

use crate::collections::matrix::cell_count;
use crate::collections::{CiphertextMatrix, CiphertextVector};
use crate::error::{FvError, Result};
use crate::fv::encoding::{decode_int, encode_int};
use crate::fv::keygen::{PublicKey, SecretKey};
use crate::fv::Ciphertext;
use crate::ring::poly::Poly;
use crate::sampling::{Randomness, Sampler};

impl PublicKey {
    /// Encrypt `m` with an OS-seeded sampler.
    pub fn encrypt(&self, m: i64) -> Result<Ciphertext> {
        self.encrypt_with_rng(m, &mut Sampler::from_os_rng())
    }

    /// c0 = p0·u + e1 + Delta·encode(m), c1 = p1·u (mod x^d+1, centered mod q).
    pub fn encrypt_with_rng<S: Randomness + ?Sized>(
        &self,
        m: i64,
        rng: &mut S,
    ) -> Result<Ciphertext> {
        let params = &self.params;
        let d = params.ring_degree;
        let message = Poly::from_i64(&encode_int(m, d)?).scalar_mul(&params.delta);

        let u = rng.noise_vec(d, params.sigma);
        let e1 = Poly::from_i64(&rng.noise_vec(d, params.sigma));

        let mut c0 = self.p0.mul_small(&u);
        c0.fold_cyclotomic(d);
        c0.add_assign(&e1);
        c0.add_assign(&message);
        params.center_q(&mut c0);

        let mut c1 = self.p1.mul_small(&u);
        params.reduce(&mut c1);

        Ok(Ciphertext::from_parts(c0, c1, &self.rlk))
    }

    pub fn encrypt_vector(&self, values: &[i64]) -> Result<CiphertextVector> {
        self.encrypt_vector_with_rng(values, &mut Sampler::from_os_rng())
    }

    #[instrument(skip_all, fields(n = values.len()))]
    pub fn encrypt_vector_with_rng<S: Randomness + ?Sized>(
        &self,
        values: &[i64],
        rng: &mut S,
    ) -> Result<CiphertextVector> {
        values
            .iter()
            .map(|&m| self.encrypt_with_rng(m, rng))
            .collect()
    }

    /// Encrypt a column-major array of `nrow * ncol` values.
    pub fn encrypt_matrix(&self, values: &[i64], nrow: usize, ncol: usize) -> Result<CiphertextMatrix> {
        self.encrypt_matrix_with_rng(values, nrow, ncol, &mut Sampler::from_os_rng())
    }

    pub fn encrypt_matrix_with_rng<S: Randomness + ?Sized>(
        &self,
        values: &[i64],
        nrow: usize,
        ncol: usize,
        rng: &mut S,
    ) -> Result<CiphertextMatrix> {
        let n = cell_count(nrow, ncol)?;
        if values.len() != n {
            return Err(FvError::shape(
                format!("{n} values for a {nrow} x {ncol} matrix"),
                values.len(),
            ));
        }
        let elements = self.encrypt_vector_with_rng(values, rng)?;
        CiphertextMatrix::new(elements.into_inner(), nrow, ncol)
    }
}

impl SecretKey {
    /// Decrypt to the integer value of the plaintext polynomial.
    ///
    /// Fails with [`FvError::ParameterMismatch`] when the ciphertext was made
    /// under other parameters. A ciphertext whose noise has outgrown Delta/2
    /// decrypts to an unrelated value; this is not detected.
    pub fn decrypt(&self, ct: &Ciphertext) -> Result<BigInt> {
        if !Arc::ptr_eq(&self.params, &ct.params) && self.params != ct.params {
            return Err(FvError::ParameterMismatch);
        }
        let params = &self.params;
        let mut raw = ct.c1.mul_small(&self.s);
        params.reduce(&mut raw);
        let mut raw = raw.add(&ct.c0);
        params.center_q(&mut raw);

        let mut plain = raw.rescale(&params.t, &params.q, params.half_q());
        plain.center_mod(&params.t, params.half_t());
        Ok(decode_int(&plain.coeffs))
    }

    pub fn decrypt_vector(&self, cts: &CiphertextVector) -> Result<Vec<BigInt>> {
        cts.iter().map(|ct| self.decrypt(ct)).collect()
    }

    /// Column-major, like the matrix storage.
    pub fn decrypt_matrix(&self, cts: &CiphertextMatrix) -> Result<Vec<BigInt>> {
        cts.iter().map(|ct| self.decrypt(ct)).collect()
    }
}
