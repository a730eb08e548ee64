//! Text persistence for parameters, keys and ciphertext containers.
//!
//! Every object starts with the banner line and a type tag, followed by its
//! body. Containers nest complete objects:
//!
//! ```text
//! => FHE package object <=
//! Rcpp_FandV_ct
//! <c0>
//! <c1>
//! => FHE package object <=
//! Rcpp_FandV_rlk
//! ...
//! ```
//!
//! Polynomial lines are `<len>  c0 c1 ...` in ascending powers of x. Blank
//! lines between objects are ignored on input.

pub mod text;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use tracing::{debug, instrument};

use crate::collections::{CiphertextMatrix, CiphertextVector};
use crate::error::{FvError, Result};
use crate::fv::{Ciphertext, PublicKey, RelinKey, SecretKey};
use crate::params::Parameters;
use crate::ring::poly::Poly;

pub use text::{LineReader, HEADER};
use text::{write_object_start, write_poly};

pub const TAG_PARAMS: &str = "Rcpp_FandV_par";
pub const TAG_CIPHERTEXT: &str = "Rcpp_FandV_ct";
pub const TAG_VECTOR: &str = "Rcpp_FandV_ct_vec";
pub const TAG_MATRIX: &str = "Rcpp_FandV_ct_mat";
pub const TAG_PUBLIC_KEY: &str = "Rcpp_FandV_pk";
pub const TAG_SECRET_KEY: &str = "Rcpp_FandV_sk";
pub const TAG_RELIN_KEY: &str = "Rcpp_FandV_rlk";
pub const TAG_KEYS: &str = "FandV_keys";

/// Contexts already seen in one stream; equal blocks resolve to one `Arc`.
#[derive(Default)]
struct Shared {
    params: Vec<Arc<Parameters>>,
    rlks: Vec<Arc<RelinKey>>,
}

impl Shared {
    fn params(&mut self, p: Arc<Parameters>) -> Arc<Parameters> {
        if let Some(known) = self.params.iter().find(|k| **k == p) {
            return known.clone();
        }
        self.params.push(p.clone());
        p
    }

    fn rlk(&mut self, rlk: RelinKey) -> Arc<RelinKey> {
        if let Some(known) = self.rlks.iter().find(|k| ***k == rlk) {
            return known.clone();
        }
        let rlk = Arc::new(rlk);
        self.rlks.push(rlk.clone());
        rlk
    }
}

pub fn save_params<W: Write + ?Sized>(w: &mut W, params: &Parameters) -> Result<()> {
    write_object_start(w, TAG_PARAMS)?;
    writeln!(w, "d={}", params.ring_degree)?;
    writeln!(w, "sigma={}", params.sigma)?;
    writeln!(w, "qpow={}", params.qpow)?;
    writeln!(w, "t={}", params.t)?;
    writeln!(w, "T={}", params.relin_base)?;
    Ok(())
}

pub fn save_relin_key<W: Write + ?Sized>(w: &mut W, rlk: &RelinKey) -> Result<()> {
    write_object_start(w, TAG_RELIN_KEY)?;
    for poly in rlk.polys() {
        write_poly(w, poly)?;
    }
    save_params(w, &rlk.params)
}

pub fn save_public_key<W: Write + ?Sized>(w: &mut W, pk: &PublicKey) -> Result<()> {
    write_object_start(w, TAG_PUBLIC_KEY)?;
    write_poly(w, &pk.p0)?;
    write_poly(w, &pk.p1)?;
    save_relin_key(w, &pk.rlk)?;
    save_params(w, &pk.params)
}

/// The body is s alone; the parameters travel with the public key.
pub fn save_secret_key<W: Write + ?Sized>(w: &mut W, sk: &SecretKey) -> Result<()> {
    write_object_start(w, TAG_SECRET_KEY)?;
    write_poly(w, &sk.poly())
}

pub fn save_ciphertext<W: Write + ?Sized>(w: &mut W, ct: &Ciphertext) -> Result<()> {
    write_object_start(w, TAG_CIPHERTEXT)?;
    write_poly(w, &ct.c0)?;
    write_poly(w, &ct.c1)?;
    save_relin_key(w, &ct.rlk)?;
    save_params(w, &ct.params)
}

#[instrument(skip_all, fields(n = v.len()))]
pub fn save_vector<W: Write + ?Sized>(w: &mut W, v: &CiphertextVector) -> Result<()> {
    write_object_start(w, TAG_VECTOR)?;
    writeln!(w, "n={}", v.len())?;
    for ct in v {
        save_ciphertext(w, ct)?;
    }
    Ok(())
}

#[instrument(skip_all, fields(nrow = m.nrow(), ncol = m.ncol()))]
pub fn save_matrix<W: Write + ?Sized>(w: &mut W, m: &CiphertextMatrix) -> Result<()> {
    write_object_start(w, TAG_MATRIX)?;
    writeln!(w, "nrow={}", m.nrow())?;
    writeln!(w, "ncol={}", m.ncol())?;
    for ct in m.iter() {
        save_ciphertext(w, ct)?;
    }
    Ok(())
}

/// Secret, public and relinearization keys in one object.
pub fn save_keys<W: Write + ?Sized>(
    w: &mut W,
    sk: &SecretKey,
    pk: &PublicKey,
    rlk: &RelinKey,
) -> Result<()> {
    write_object_start(w, TAG_KEYS)?;
    save_secret_key(w, sk)?;
    save_public_key(w, pk)?;
    save_relin_key(w, rlk)
}

pub fn load_params<R: BufRead>(r: R) -> Result<Arc<Parameters>> {
    read_params(&mut LineReader::new(r), &mut Shared::default())
}

pub fn load_relin_key<R: BufRead>(r: R) -> Result<Arc<RelinKey>> {
    read_relin_key(&mut LineReader::new(r), &mut Shared::default())
}

pub fn load_public_key<R: BufRead>(r: R) -> Result<PublicKey> {
    read_public_key(&mut LineReader::new(r), &mut Shared::default())
}

/// A standalone secret key carries no parameters; pass the ones it belongs to.
pub fn load_secret_key<R: BufRead>(r: R, params: &Arc<Parameters>) -> Result<SecretKey> {
    let mut reader = LineReader::new(r);
    let s = read_secret(&mut reader, params.ring_degree)?;
    Ok(SecretKey::from_coeffs(s, params.clone()))
}

pub fn load_ciphertext<R: BufRead>(r: R) -> Result<Ciphertext> {
    read_ciphertext(&mut LineReader::new(r), &mut Shared::default())
}

#[instrument(skip_all)]
pub fn load_vector<R: BufRead>(r: R) -> Result<CiphertextVector> {
    let mut r = LineReader::new(r);
    let mut shared = Shared::default();
    r.expect_object(TAG_VECTOR)?;
    let n: usize = r.read_field("n")?;
    let v = (0..n)
        .map(|_| read_ciphertext(&mut r, &mut shared))
        .collect::<Result<CiphertextVector>>()?;
    debug!(n, contexts = shared.rlks.len(), "loaded vector");
    Ok(v)
}

#[instrument(skip_all)]
pub fn load_matrix<R: BufRead>(r: R) -> Result<CiphertextMatrix> {
    let mut r = LineReader::new(r);
    let mut shared = Shared::default();
    r.expect_object(TAG_MATRIX)?;
    let nrow: usize = r.read_field("nrow")?;
    let ncol: usize = r.read_field("ncol")?;
    let n = nrow
        .checked_mul(ncol)
        .ok_or_else(|| r.error(format!("matrix size {nrow} x {ncol} overflows")))?;
    let elements = (0..n)
        .map(|_| read_ciphertext(&mut r, &mut shared))
        .collect::<Result<Vec<_>>>()?;
    debug!(nrow, ncol, contexts = shared.rlks.len(), "loaded matrix");
    CiphertextMatrix::new(elements, nrow, ncol)
}

#[instrument(skip_all)]
pub fn load_keys<R: BufRead>(r: R) -> Result<(SecretKey, PublicKey, Arc<RelinKey>)> {
    let mut r = LineReader::new(r);
    let mut shared = Shared::default();
    r.expect_object(TAG_KEYS)?;

    r.expect_object(TAG_SECRET_KEY)?;
    let s_poly = r.read_poly()?;
    let s_line = r.line();
    let pk = read_public_key(&mut r, &mut shared)?;
    let rlk = read_relin_key(&mut r, &mut shared)?;

    let d = pk.params.ring_degree;
    let s = small_coeffs(s_poly, d).map_err(|message| FvError::Format {
        line: s_line,
        message,
    })?;
    Ok((SecretKey::from_coeffs(s, pk.params.clone()), pk, rlk))
}

fn read_params<R: BufRead>(r: &mut LineReader<R>, shared: &mut Shared) -> Result<Arc<Parameters>> {
    r.expect_object(TAG_PARAMS)?;
    let d: usize = r.read_field("d")?;
    let sigma: f64 = r.read_field("sigma")?;
    let qpow: u32 = r.read_field("qpow")?;
    let t: BigInt = r.read_field("t")?;
    let relin_base: BigInt = r.read_field("T")?;
    let params = Parameters::builder()
        .ring_degree(d)
        .sigma(sigma)
        .qpow(qpow)
        .plain_modulus(t)
        .relin_base(relin_base)
        .build()
        .map_err(|e| r.error(e.to_string()))?;
    Ok(shared.params(params))
}

/// Reads `N` polynomials, remembering the line each came from. Their ring
/// degree is only known once the trailing parameter block has been read.
fn read_polys<R: BufRead, const N: usize>(r: &mut LineReader<R>) -> Result<[(Poly, usize); N]> {
    let mut out: [(Poly, usize); N] = std::array::from_fn(|_| (Poly::default(), 0));
    for slot in out.iter_mut() {
        let poly = r.read_poly()?;
        *slot = (poly, r.line());
    }
    Ok(out)
}

/// Zero-pad each polynomial to `d` coefficients, rejecting longer ones.
fn fit_ring(polys: &mut [(Poly, usize)], d: usize) -> Result<()> {
    for (poly, line) in polys.iter_mut() {
        if poly.len() > d {
            return Err(FvError::Format {
                line: *line,
                message: format!(
                    "polynomial has {} coefficients but the ring degree is {d}",
                    poly.len()
                ),
            });
        }
        poly.resize(d);
    }
    Ok(())
}

fn read_relin_key<R: BufRead>(r: &mut LineReader<R>, shared: &mut Shared) -> Result<Arc<RelinKey>> {
    r.expect_object(TAG_RELIN_KEY)?;
    let mut polys: [(Poly, usize); 4] = read_polys(r)?;
    let params = read_params(r, shared)?;
    fit_ring(&mut polys, params.ring_degree)?;
    let [(rlk00, _), (rlk01, _), (rlk10, _), (rlk11, _)] = polys;
    Ok(shared.rlk(RelinKey {
        rlk00,
        rlk01,
        rlk10,
        rlk11,
        params,
    }))
}

/// Body shared by public keys and ciphertexts: two polynomials, then the
/// relinearization key and the parameters they live under.
fn read_pair<R: BufRead>(
    r: &mut LineReader<R>,
    shared: &mut Shared,
) -> Result<(Poly, Poly, Arc<Parameters>, Arc<RelinKey>)> {
    let mut polys: [(Poly, usize); 2] = read_polys(r)?;
    let rlk = read_relin_key(r, shared)?;
    let params = read_params(r, shared)?;
    if params != rlk.params {
        return Err(r.error("parameters disagree with the relinearization key"));
    }
    fit_ring(&mut polys, params.ring_degree)?;
    let [(a, _), (b, _)] = polys;
    Ok((a, b, params, rlk))
}

fn read_public_key<R: BufRead>(r: &mut LineReader<R>, shared: &mut Shared) -> Result<PublicKey> {
    r.expect_object(TAG_PUBLIC_KEY)?;
    let (p0, p1, params, rlk) = read_pair(r, shared)?;
    Ok(PublicKey { p0, p1, params, rlk })
}

fn read_ciphertext<R: BufRead>(r: &mut LineReader<R>, shared: &mut Shared) -> Result<Ciphertext> {
    r.expect_object(TAG_CIPHERTEXT)?;
    let (c0, c1, params, rlk) = read_pair(r, shared)?;
    Ok(Ciphertext { c0, c1, params, rlk })
}

fn read_secret<R: BufRead>(r: &mut LineReader<R>, d: usize) -> Result<Vec<i64>> {
    r.expect_object(TAG_SECRET_KEY)?;
    let poly = r.read_poly()?;
    small_coeffs(poly, d).map_err(|message| r.error(message))
}

fn small_coeffs(poly: Poly, d: usize) -> std::result::Result<Vec<i64>, String> {
    if poly.len() > d {
        return Err(format!(
            "secret key has {} coefficients but the ring degree is {d}",
            poly.len()
        ));
    }
    let mut s = poly
        .coeffs
        .iter()
        .map(|c| c.to_i64().ok_or_else(|| format!("secret coefficient {c} out of range")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    s.resize(d, 0);
    Ok(s)
}

/// Write through a buffered file, creating or truncating `path`.
pub fn write_file<P, F>(path: P, save: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let mut w = BufWriter::new(File::create(path)?);
    save(&mut w)?;
    w.flush()?;
    Ok(())
}

pub fn read_file<P, T, F>(path: P, load: F) -> Result<T>
where
    P: AsRef<Path>,
    F: FnOnce(BufReader<File>) -> Result<T>,
{
    load(BufReader::new(File::open(path)?))
}

pub fn save_ciphertext_file(path: impl AsRef<Path>, ct: &Ciphertext) -> Result<()> {
    write_file(path, |w| save_ciphertext(w, ct))
}

pub fn load_ciphertext_file(path: impl AsRef<Path>) -> Result<Ciphertext> {
    read_file(path, load_ciphertext)
}

pub fn save_vector_file(path: impl AsRef<Path>, v: &CiphertextVector) -> Result<()> {
    write_file(path, |w| save_vector(w, v))
}

pub fn load_vector_file(path: impl AsRef<Path>) -> Result<CiphertextVector> {
    read_file(path, load_vector)
}

pub fn save_matrix_file(path: impl AsRef<Path>, m: &CiphertextMatrix) -> Result<()> {
    write_file(path, |w| save_matrix(w, m))
}

pub fn load_matrix_file(path: impl AsRef<Path>) -> Result<CiphertextMatrix> {
    read_file(path, load_matrix)
}

pub fn save_keys_file(
    path: impl AsRef<Path>,
    sk: &SecretKey,
    pk: &PublicKey,
    rlk: &RelinKey,
) -> Result<()> {
    write_file(path, |w| save_keys(w, sk, pk, rlk))
}

pub fn load_keys_file(path: impl AsRef<Path>) -> Result<(SecretKey, PublicKey, Arc<RelinKey>)> {
    read_file(path, load_keys)
}
