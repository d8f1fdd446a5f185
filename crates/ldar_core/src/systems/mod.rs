//! Daily tick systems, in schedule order: day start, leak aging and natural
//! tagging, leak generation, company deployment, repairs, and the end-of-day
//! telemetry snapshot.

pub mod day_start;
pub mod deploy;
pub mod leaks;
pub mod repair;
pub mod snapshot;

pub use day_start::start_of_day_system;
pub use deploy::deploy_companies_system;
pub use leaks::{age_leaks_system, spawn_leaks_system};
pub use repair::repair_leaks_system;
pub use snapshot::snapshot_timeseries_system;
