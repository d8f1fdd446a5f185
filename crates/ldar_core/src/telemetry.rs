//! Telemetry: append-only daily time series, per method and program-wide.

use bevy_ecs::prelude::Resource;

/// One method's daily row. Appended by the deploy system for every method on
/// every simulated day, idle days included.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct MethodDayRecord {
    pub day: u32,
    pub method: usize,
    /// Crews that actually worked (visited or progressed a survey).
    pub deployed_crews: usize,
    /// Completed site visits.
    pub sites_visited: usize,
    pub travel_mins: f64,
    pub survey_mins: f64,
    pub flags_raised: u32,
    pub redundant_flags: u32,
    pub redundant_tags: u32,
    pub missed_leaks: u32,
    /// Flags that would not have cleared the threshold without the vented
    /// contribution.
    pub flags_venting_dependent: u32,
    /// Fraction of sites whose weather permitted this method today.
    pub prop_sites_available: f64,
    pub cost: f64,
}

/// Program-wide daily row, appended by the end-of-day snapshot system.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ProgramDayRecord {
    pub day: u32,
    pub new_leaks: u32,
    /// Leaks still emitting (active or tagged-awaiting-repair).
    pub active_leaks: u32,
    pub daily_emissions_kg: f64,
    pub tags_today: u32,
    pub tags_total: u32,
    /// Operator discoveries of leaks a method had already tagged.
    pub redundant_tags: u32,
    pub repairs_today: u32,
    pub cum_repaired: u32,
    pub daily_cost: f64,
    pub cum_cost: f64,
}

/// Collected simulation telemetry.
#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub program_rows: Vec<ProgramDayRecord>,
    pub method_rows: Vec<MethodDayRecord>,
    pub tags_total: u32,
    pub cum_repaired: u32,
    pub cum_cost: f64,
}

/// Per-day scratch counters, reset by the runner at the top of each tick and
/// folded into [SimTelemetry] by the snapshot system.
#[derive(Debug, Default, Clone, Copy, Resource)]
pub struct DailyScratch {
    pub new_leaks: u32,
    pub tags: u32,
    pub redundant_tags: u32,
    pub repairs: u32,
    pub cost: f64,
}

impl DailyScratch {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
