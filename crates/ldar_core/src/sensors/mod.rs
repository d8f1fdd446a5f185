//! Sensor/detection models.
//!
//! Each detection method carries one boxed [SensorModel] resolved by name
//! from the registry at configuration time. An unknown name is a fatal
//! configuration error, not a runtime lookup failure.

pub mod model;
pub mod pod;
pub mod threshold;

pub use model::{Measurement, SensorModel};
pub use pod::PodSensor;
pub use threshold::ThresholdSensor;

use crate::errors::ConfigError;

/// Parameters for a sensor, dispatched on `name`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SensorSpec {
    /// Registered model name: `"threshold"` or `"pod"`.
    pub name: String,
    /// Minimum detection limit in g/s (threshold model) or the rate at which
    /// detection probability is 50% (pod model).
    pub mdl_g_per_sec: f64,
    /// Steepness of the probability-of-detection curve (pod model only).
    pub pod_slope: f64,
    /// Multiplicative lognormal quantification noise, sd of ln(factor).
    pub quant_noise_sd: f64,
}

impl SensorSpec {
    pub fn threshold(mdl_g_per_sec: f64) -> Self {
        Self {
            name: "threshold".to_string(),
            mdl_g_per_sec,
            pod_slope: 0.0,
            quant_noise_sd: 0.0,
        }
    }

    pub fn pod(mdl_g_per_sec: f64, pod_slope: f64, quant_noise_sd: f64) -> Self {
        Self {
            name: "pod".to_string(),
            mdl_g_per_sec,
            pod_slope,
            quant_noise_sd,
        }
    }
}

/// Registered-variant table. Names resolve exactly once, at scenario build.
pub fn build_sensor(spec: &SensorSpec) -> Result<Box<dyn SensorModel>, ConfigError> {
    match spec.name.as_str() {
        "threshold" => Ok(Box::new(ThresholdSensor::new(spec.mdl_g_per_sec))),
        "pod" => Ok(Box::new(PodSensor::new(
            spec.mdl_g_per_sec,
            spec.pod_slope,
            spec.quant_noise_sd,
        ))),
        other => Err(ConfigError::UnknownSensor(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_names() {
        assert!(build_sensor(&SensorSpec::threshold(0.01)).is_ok());
        assert!(build_sensor(&SensorSpec::pod(0.5, 2.0, 0.1)).is_ok());
    }

    #[test]
    fn registry_rejects_unknown_names() {
        let spec = SensorSpec {
            name: "satellite_v2".to_string(),
            ..SensorSpec::threshold(0.01)
        };
        let err = build_sensor(&spec).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSensor(name) if name == "satellite_v2"));
    }
}
