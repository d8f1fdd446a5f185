//! Scenario configuration and world construction.

pub mod build;
pub mod params;

pub use build::{build_scenario, DaylightInfo, ProgramConfig};
pub use params::{
    FlagThreshold, FollowUpParams, MethodParams, MethodScale, ProgramParams, RateAggregator,
    ScenarioParams, SiteRecord,
};
