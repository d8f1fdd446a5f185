use rand::rngs::StdRng;

/// Outcome of measuring one site's cumulative emission rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub detected: bool,
    /// Reported rate in g/s; zero when nothing was detected.
    pub measured_g_per_sec: f64,
}

impl Measurement {
    pub fn none() -> Self {
        Self {
            detected: false,
            measured_g_per_sec: 0.0,
        }
    }
}

/// Converts a true site-level emission rate into a measured outcome.
///
/// Implementations must be deterministic given the RNG state; all noise is
/// drawn from the passed stream.
pub trait SensorModel: Send + Sync + std::fmt::Debug {
    fn measure(&self, true_rate_g_per_sec: f64, rng: &mut StdRng) -> Measurement;
}
