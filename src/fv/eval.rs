use std::ops::Neg;

use crate::error::Result;
use crate::fv::Ciphertext;
use crate::params::Parameters;
use crate::ring::poly::Poly;

impl Ciphertext {
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        Ok(self.map_pair(other, Poly::add))
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        Ok(self.map_pair(other, Poly::sub))
    }

    /// Homomorphic product, relinearized back to two components.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        let params = &self.params;

        let mut c0 = self.c0.mul(&other.c0);
        let mut c1 = self.c0.mul(&other.c1).add(&self.c1.mul(&other.c0));
        let mut c2 = self.c1.mul(&other.c1);
        for c in [&mut c0, &mut c1, &mut c2] {
            c.fold_cyclotomic(params.ring_degree);
            *c = scale_down(c, params);
        }

        let (c0, c1) = self.relinearize(c0, c1, &c2);
        Ok(Self {
            c0,
            c1,
            params: self.params.clone(),
            rlk: self.rlk.clone(),
        })
    }

    /// Fold c2 into (c0, c1) through its two base-T digits.
    fn relinearize(&self, c0: Poly, c1: Poly, c2: &Poly) -> (Poly, Poly) {
        let params = &self.params;
        let rlk = &self.rlk;
        let (digit0, digit1) = c2.split_digits(&params.relin_base);

        let mut c0 = c0.add(&rlk.rlk00.mul(&digit0)).add(&rlk.rlk10.mul(&digit1));
        let mut c1 = c1.add(&rlk.rlk01.mul(&digit0)).add(&rlk.rlk11.mul(&digit1));
        params.reduce(&mut c0);
        params.reduce(&mut c1);
        (c0, c1)
    }

    fn map_pair(&self, other: &Self, op: impl Fn(&Poly, &Poly) -> Poly) -> Self {
        let mut c0 = op(&self.c0, &other.c0);
        let mut c1 = op(&self.c1, &other.c1);
        self.params.center_q(&mut c0);
        self.params.center_q(&mut c1);
        Self {
            c0,
            c1,
            params: self.params.clone(),
            rlk: self.rlk.clone(),
        }
    }
}

/// round(t/q · c), centered mod q.
fn scale_down(c: &Poly, params: &Parameters) -> Poly {
    let mut out = c.rescale(&params.t, &params.q, params.half_q());
    params.center_q(&mut out);
    out
}

impl Neg for &Ciphertext {
    type Output = Ciphertext;

    fn neg(self) -> Ciphertext {
        let mut c0 = self.c0.neg();
        let mut c1 = self.c1.neg();
        self.params.center_q(&mut c0);
        self.params.center_q(&mut c1);
        Ciphertext {
            c0,
            c1,
            params: self.params.clone(),
            rlk: self.rlk.clone(),
        }
    }
}

impl Neg for Ciphertext {
    type Output = Ciphertext;

    fn neg(self) -> Ciphertext {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FvError;
    use crate::fv::keygen::keygen_with_rng;
    use crate::params::presets;
    use crate::sampling::Sampler;
    use num_bigint::BigInt;

    #[test]
    fn test_add_sub_neg() {
        let params = presets::compact().unwrap();
        let mut rng = Sampler::from_seed(31);
        let (sk, pk, _) = keygen_with_rng(&params, &mut rng);
        let a = pk.encrypt_with_rng(1234, &mut rng).unwrap();
        let b = pk.encrypt_with_rng(-77, &mut rng).unwrap();
        assert_eq!(sk.decrypt(&a.add(&b).unwrap()).unwrap(), BigInt::from(1157));
        assert_eq!(sk.decrypt(&a.sub(&b).unwrap()).unwrap(), BigInt::from(1311));
        assert_eq!(sk.decrypt(&-&a).unwrap(), BigInt::from(-1234));
        assert_eq!(sk.decrypt(&(-b)).unwrap(), BigInt::from(77));
    }

    #[test]
    fn test_mul() {
        let params = presets::compact().unwrap();
        let mut rng = Sampler::from_seed(32);
        let (sk, pk, _) = keygen_with_rng(&params, &mut rng);
        for (x, y) in [(3i64, 5i64), (-12, 9), (0, 1000), (255, -255), (40_000, 3)] {
            let a = pk.encrypt_with_rng(x, &mut rng).unwrap();
            let b = pk.encrypt_with_rng(y, &mut rng).unwrap();
            let c = a.mul(&b).unwrap();
            assert_eq!(sk.decrypt(&c).unwrap(), BigInt::from(x * y), "{x} * {y}");
        }
    }

    #[test]
    fn test_chained_mul() {
        let params = presets::compact().unwrap();
        let mut rng = Sampler::from_seed(33);
        let (sk, pk, _) = keygen_with_rng(&params, &mut rng);
        let a = pk.encrypt_with_rng(3, &mut rng).unwrap();
        let b = pk.encrypt_with_rng(-2, &mut rng).unwrap();
        let c = pk.encrypt_with_rng(5, &mut rng).unwrap();
        let abc = a.mul(&b).unwrap().mul(&c).unwrap();
        assert_eq!(sk.decrypt(&abc).unwrap(), BigInt::from(-30));
    }

    #[test]
    fn test_operands_unchanged() {
        let params = presets::toy().unwrap();
        let mut rng = Sampler::from_seed(34);
        let (_, pk, _) = keygen_with_rng(&params, &mut rng);
        let a = pk.encrypt_with_rng(2, &mut rng).unwrap();
        let b = pk.encrypt_with_rng(3, &mut rng).unwrap();
        let (a0, b0) = (a.clone(), b.clone());
        let _ = a.mul(&b).unwrap();
        let _ = a.add(&b).unwrap();
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_parameter_mismatch() {
        let toy = presets::toy().unwrap();
        let compact = presets::compact().unwrap();
        let mut rng = Sampler::from_seed(35);
        let (_, pk_a, _) = keygen_with_rng(&toy, &mut rng);
        let (_, pk_b, _) = keygen_with_rng(&compact, &mut rng);
        let a = pk_a.encrypt_with_rng(1, &mut rng).unwrap();
        let b = pk_b.encrypt_with_rng(1, &mut rng).unwrap();
        assert!(matches!(a.add(&b), Err(FvError::ParameterMismatch)));
        assert!(matches!(a.mul(&b), Err(FvError::ParameterMismatch)));
    }

    #[test]
    fn test_display() {
        let params = presets::toy().unwrap();
        let mut rng = Sampler::from_seed(36);
        let (_, pk, _) = keygen_with_rng(&params, &mut rng);
        let shown = pk.encrypt_with_rng(1, &mut rng).unwrap().to_string();
        assert!(shown.starts_with("Fan and Vercauteren cipher text\n( c₀ = "));
        assert!(shown.contains("\nc₁ = "));
        assert!(shown.ends_with(" )"));
    }
}
