use rand::rngs::StdRng;
use rand::Rng;

use super::model::{Measurement, SensorModel};
use crate::distributions::sample_standard_normal;

/// Probability-of-detection sensor: a logistic curve in log10 rate gives the
/// chance of detection, and detected rates carry multiplicative lognormal
/// quantification noise.
#[derive(Debug, Clone, Copy)]
pub struct PodSensor {
    /// Rate at which detection probability is 50%.
    mdl_g_per_sec: f64,
    /// Logistic steepness in log10-rate units.
    slope: f64,
    /// Standard deviation of ln(noise factor); 0 = exact quantification.
    quant_noise_sd: f64,
}

impl PodSensor {
    pub fn new(mdl_g_per_sec: f64, slope: f64, quant_noise_sd: f64) -> Self {
        Self {
            mdl_g_per_sec: mdl_g_per_sec.max(1e-12),
            slope: slope.max(0.0),
            quant_noise_sd: quant_noise_sd.max(0.0),
        }
    }

    fn detection_probability(&self, rate_g_per_sec: f64) -> f64 {
        if rate_g_per_sec <= 0.0 {
            return 0.0;
        }
        let x = rate_g_per_sec.log10() - self.mdl_g_per_sec.log10();
        1.0 / (1.0 + (-self.slope * x).exp())
    }
}

impl SensorModel for PodSensor {
    fn measure(&self, true_rate_g_per_sec: f64, rng: &mut StdRng) -> Measurement {
        let p = self.detection_probability(true_rate_g_per_sec);
        if p <= 0.0 || rng.gen::<f64>() >= p {
            return Measurement::none();
        }
        let noise = if self.quant_noise_sd > 0.0 {
            (self.quant_noise_sd * sample_standard_normal(rng)).exp()
        } else {
            1.0
        };
        Measurement {
            detected: true,
            measured_g_per_sec: true_rate_g_per_sec * noise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn probability_is_half_at_mdl() {
        let sensor = PodSensor::new(1.0, 3.0, 0.0);
        assert!((sensor.detection_probability(1.0) - 0.5).abs() < 1e-9);
        assert!(sensor.detection_probability(10.0) > 0.9);
        assert!(sensor.detection_probability(0.01) < 0.1);
    }

    #[test]
    fn zero_rate_is_never_detected() {
        let sensor = PodSensor::new(0.001, 3.0, 0.1);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(!sensor.measure(0.0, &mut rng).detected);
        }
    }

    #[test]
    fn large_rates_are_detected_and_noised() {
        let sensor = PodSensor::new(0.001, 6.0, 0.2);
        let mut rng = StdRng::seed_from_u64(2);
        let mut detected = 0;
        for _ in 0..200 {
            let m = sensor.measure(100.0, &mut rng);
            if m.detected {
                detected += 1;
                assert!(m.measured_g_per_sec > 0.0);
            }
        }
        assert!(detected > 190, "{detected}/200 detections");
    }

    #[test]
    fn exact_quantification_without_noise() {
        let sensor = PodSensor::new(1e-9, 50.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let m = sensor.measure(4.2, &mut rng);
        assert!(m.detected);
        assert_eq!(m.measured_g_per_sec, 4.2);
    }
}
