//! Fatal configuration errors. Anything here aborts scenario construction
//! before the first tick; soft conditions (crew shortage, idle days, missed
//! detections) are logged or recorded as metrics instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A resolved work-hour budget must be strictly inside (0, 24).
    #[error("method `{method}` resolved workday of {hours} h is outside (0, 24)")]
    WorkdayOutOfRange { method: String, hours: f64 },

    /// Site coordinates fall outside the weather grid's spatial bounds.
    #[error("site `{facility_id}` at ({lat}, {lon}) is outside the weather grid")]
    SiteOutsideGrid {
        facility_id: String,
        lat: f64,
        lon: f64,
    },

    /// Referenced sensor model is not in the registry.
    #[error("unknown sensor model `{0}`")]
    UnknownSensor(String),

    /// Unrecognized follow-up threshold interaction.
    #[error("unknown follow-up threshold type `{0}`")]
    UnknownFollowUpThreshold(String),

    /// Routed travel needs at least one home base to plan from.
    #[error("method `{0}` uses routed travel with no home bases")]
    NoHomeBase(String),

    /// Weather fields must cover every simulated day.
    #[error("weather covers {available} days but the scenario runs {required}")]
    WeatherTooShort { available: usize, required: u32 },
}
