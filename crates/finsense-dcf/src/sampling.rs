//! Random variates used by the Monte Carlo sweep

use rand::Rng;
use std::f64::consts::PI;

/// Draws normal and Student-t variates on top of any uniform source.
///
/// Normals use Box-Muller and keep the second value of each pair.
pub struct Sampler<R> {
    rng: R,
    cached_normal: Option<f64>,
}

impl<R: Rng> Sampler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            cached_normal: None,
        }
    }

    /// Uniform on [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        // 1 - U lies in (0, 1], so ln never sees zero
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        self.cached_normal = Some(r * theta.sin());
        r * theta.cos()
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }

    /// Student-t with integer degrees of freedom: Z / sqrt(chi2(df) / df)
    pub fn student_t(&mut self, df: u32) -> f64 {
        let z = self.standard_normal();
        let chi2: f64 = (0..df)
            .map(|_| {
                let x = self.standard_normal();
                x * x
            })
            .sum();
        if chi2 <= 0.0 {
            return z;
        }
        z / (chi2 / f64::from(df)).sqrt()
    }

    /// Bernoulli trial with success probability `p`
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
