//! Probability distributions for leak rates, venting and travel times.
//!
//! Sampling is hand-rolled over a `rand` RNG (Box-Muller for normals) so all
//! draws flow through the single per-run stream in [crate::rng::SimRng].

use rand::Rng;

/// Standard normal draw via Box-Muller.
pub fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-12);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Lognormal rate distribution parameterised on the log scale.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LognormalRate {
    /// Mean of ln(rate).
    pub mu: f64,
    /// Standard deviation of ln(rate).
    pub sigma: f64,
}

impl LognormalRate {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self {
            mu,
            sigma: sigma.max(0.0),
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        (self.mu + self.sigma * sample_standard_normal(rng)).exp()
    }

    /// Value below which `proportion` of the distribution's mass lies.
    /// Used to resolve proportion-style follow-up thresholds once at build.
    pub fn quantile(&self, proportion: f64) -> f64 {
        let p = proportion.clamp(1e-9, 1.0 - 1e-9);
        (self.mu + self.sigma * inverse_standard_normal_cdf(p)).exp()
    }
}

/// Empirical rate distribution: uniform draw over observed samples.
/// A draw of exactly the sample minimum or maximum is valid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmpiricalRate {
    samples: Vec<f64>,
}

impl EmpiricalRate {
    pub fn new(mut samples: Vec<f64>) -> Self {
        debug_assert!(!samples.is_empty(), "empirical distribution needs samples");
        samples.retain(|s| s.is_finite() && *s >= 0.0);
        if samples.is_empty() {
            samples.push(0.0);
        }
        Self { samples }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.samples[rng.gen_range(0..self.samples.len())]
    }

    /// Empirical quantile (sorted-order index), used for proportion-style
    /// follow-up thresholds.
    pub fn quantile(&self, proportion: f64) -> f64 {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((sorted.len() - 1) as f64 * proportion.clamp(0.0, 1.0)).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

/// Configured leak-rate source.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RateDist {
    Lognormal(LognormalRate),
    Empirical(EmpiricalRate),
}

impl RateDist {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            RateDist::Lognormal(dist) => dist.sample(rng),
            RateDist::Empirical(dist) => dist.sample(rng),
        }
    }

    pub fn quantile(&self, proportion: f64) -> f64 {
        match self {
            RateDist::Lognormal(dist) => dist.quantile(proportion),
            RateDist::Empirical(dist) => dist.quantile(proportion),
        }
    }
}

/// Site-level vented (non-leak) emissions sampled per visit. Negative draws
/// clamp to zero.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VentingModel {
    pub mean_g_per_sec: f64,
    pub sd_g_per_sec: f64,
}

impl VentingModel {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        (self.mean_g_per_sec + self.sd_g_per_sec * sample_standard_normal(rng)).max(0.0)
    }
}

/// Acklam's rational approximation of the standard normal inverse CDF.
/// Absolute error below 1.15e-9 over (0, 1), ample for threshold resolution.
fn inverse_standard_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
