use rand::Rng;

/// Cumulative distribution table for a discrete Gaussian over Z centered at 0.
///
/// Covers [-tail, tail] with tail = ceil(6σ); mass beyond that is negligible.
#[derive(Clone, Debug)]
pub struct CdtTable {
    sigma: f64,
    tail: i64,
    cdf: Vec<f64>,
}

impl CdtTable {
    pub fn new(sigma: f64) -> Self {
        let tail = (6.0 * sigma).ceil() as i64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut cdf = Vec::with_capacity((2 * tail + 1) as usize);
        let mut cumulative = 0.0f64;
        for x in -tail..=tail {
            cumulative += (-((x * x) as f64) / two_sigma_sq).exp();
            cdf.push(cumulative);
        }
        Self { sigma, tail, cdf }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn tail(&self) -> i64 {
        self.tail
    }

    /// Draw one sample.
    ///
    /// The scan visits every entry and selects with integer masks, so the
    /// running time does not depend on the sampled value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let total = self.cdf[self.cdf.len() - 1];
        let u: f64 = rng.random::<f64>() * total;

        let mut result = self.tail;
        for (i, &c) in self.cdf.iter().enumerate().rev() {
            let mask = ((u < c) as i64).wrapping_neg();
            let candidate = -self.tail + i as i64;
            result = (candidate & mask) | (result & !mask);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_gaussian_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sigma = 3.2;
        let table = CdtTable::new(sigma);
        let n = 10000;

        let samples: Vec<i64> = (0..n).map(|_| table.sample(&mut rng)).collect();

        let mean: f64 = samples.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.5, "mean = {mean}");

        let var: f64 = samples.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n as f64;
        let expected_var = sigma * sigma;
        assert!((var - expected_var).abs() < 2.0, "var = {var}, expected ≈ {expected_var}");

        for &s in &samples {
            assert!(s.abs() <= table.tail(), "sample {s} exceeds tail bound");
        }
    }

    #[test]
    fn test_wide_sigma() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let table = CdtTable::new(16.0);
        assert_eq!(table.tail(), 96);
        let n = 20000;
        let var = (0..n)
            .map(|_| table.sample(&mut rng) as f64)
            .map(|x| x * x)
            .sum::<f64>()
            / n as f64;
        assert!((var - 256.0).abs() < 20.0, "var = {var}");
    }
}
