pub mod clock;
pub mod company;
pub mod crew;
pub mod distributions;
pub mod daylight;
pub mod ecs;
pub mod errors;
pub mod rng;
pub mod runner;
pub mod scenario;
pub mod scheduling;
pub mod sensors;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
pub mod weather;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
