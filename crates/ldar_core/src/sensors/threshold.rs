use rand::rngs::StdRng;

use super::model::{Measurement, SensorModel};

/// Hard minimum-detection-limit sensor: anything at or above the MDL is
/// detected and quantified exactly, anything below is missed.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdSensor {
    mdl_g_per_sec: f64,
}

impl ThresholdSensor {
    pub fn new(mdl_g_per_sec: f64) -> Self {
        Self {
            mdl_g_per_sec: mdl_g_per_sec.max(0.0),
        }
    }
}

impl SensorModel for ThresholdSensor {
    fn measure(&self, true_rate_g_per_sec: f64, _rng: &mut StdRng) -> Measurement {
        if true_rate_g_per_sec > 0.0 && true_rate_g_per_sec >= self.mdl_g_per_sec {
            Measurement {
                detected: true,
                measured_g_per_sec: true_rate_g_per_sec,
            }
        } else {
            Measurement::none()
        }
    }
}
