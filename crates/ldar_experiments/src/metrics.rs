//! Summary metrics extracted from a completed simulation world.

use bevy_ecs::prelude::World;
use ldar_core::clock::SimulationClock;
use ldar_core::ecs::{Leak, TagSource};
use ldar_core::telemetry::SimTelemetry;

const G_PER_SEC_TO_KG_PER_DAY: f64 = 86.4;

use crate::parameters::ParameterSet;

/// Aggregated outcomes of one simulation run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub leak_production_rate: f64,
    pub n_crews: usize,
    pub min_interval_days: u32,
    pub follow_up_proportion: Option<f64>,
    /// Simulated days actually executed.
    pub days: usize,
    /// Total emissions over the run in kg.
    pub total_emissions_kg: f64,
    pub mean_daily_emissions_kg: f64,
    /// Emissions avoided by repairs: what each repaired leak would have
    /// emitted from its repair day to the end of the run.
    pub mitigated_emissions_kg: f64,
    pub mean_active_leaks: f64,
    /// Highest single-day count of emitting leaks.
    pub peak_active_leaks: u32,
    pub new_leaks_total: u32,
    pub tags_total: u32,
    pub repaired_total: u32,
    /// Repairs initiated by operator discovery rather than a program.
    pub natural_repairs: u32,
    pub sites_visited_total: u64,
    pub flags_raised_total: u32,
    pub total_cost: f64,
    /// Cost per repaired leak; zero when nothing was repaired.
    pub cost_per_repair: f64,
    /// Cost per kg of mitigated emissions; zero when nothing was mitigated.
    pub cost_per_mitigated_kg: f64,
}

/// Pull summary metrics out of a finished world.
pub fn extract_metrics(world: &mut World, param_set: &ParameterSet) -> SimulationResult {
    let (
        days,
        total_emissions_kg,
        peak_active_leaks,
        new_leaks_total,
        tags_total,
        repaired_total,
        sites_visited_total,
        flags_raised_total,
        total_cost,
    ) = {
        let telemetry = world
            .get_resource::<SimTelemetry>()
            .expect("SimTelemetry resource not found");
        (
            telemetry.program_rows.len(),
            telemetry
                .program_rows
                .iter()
                .map(|r| r.daily_emissions_kg)
                .sum::<f64>(),
            telemetry
                .program_rows
                .iter()
                .map(|r| r.active_leaks)
                .max()
                .unwrap_or(0),
            telemetry.program_rows.iter().map(|r| r.new_leaks).sum(),
            telemetry.tags_total,
            telemetry.cum_repaired,
            telemetry
                .method_rows
                .iter()
                .map(|r| r.sites_visited as u64)
                .sum(),
            telemetry.method_rows.iter().map(|r| r.flags_raised).sum(),
            telemetry.cum_cost,
        )
    };

    let total_days = world
        .get_resource::<SimulationClock>()
        .map(|c| c.total_days())
        .unwrap_or(days as u32);

    let mut natural_repairs = 0u32;
    let mut mitigated_emissions_kg = 0.0;
    let mut query = world.query::<&Leak>();
    for leak in query.iter(world) {
        let Some(repaired) = leak.date_repaired else {
            continue;
        };
        if leak.tagged_by == Some(TagSource::Natural) {
            natural_repairs += 1;
        }
        let days_avoided = total_days.saturating_sub(repaired) as f64;
        mitigated_emissions_kg += leak.rate_g_per_sec * G_PER_SEC_TO_KG_PER_DAY * days_avoided;
    }

    let mean_active_leaks = {
        let telemetry = world
            .get_resource::<SimTelemetry>()
            .expect("SimTelemetry resource not found");
        if telemetry.program_rows.is_empty() {
            0.0
        } else {
            telemetry
                .program_rows
                .iter()
                .map(|r| r.active_leaks as f64)
                .sum::<f64>()
                / telemetry.program_rows.len() as f64
        }
    };

    SimulationResult {
        experiment_id: param_set.experiment_id.clone(),
        run_id: param_set.run_id,
        seed: param_set.seed,
        leak_production_rate: param_set.leak_production_rate,
        n_crews: param_set.n_crews,
        min_interval_days: param_set.min_interval_days,
        follow_up_proportion: param_set.follow_up_proportion,
        days,
        total_emissions_kg,
        mean_daily_emissions_kg: if days > 0 {
            total_emissions_kg / days as f64
        } else {
            0.0
        },
        mitigated_emissions_kg,
        mean_active_leaks,
        peak_active_leaks,
        new_leaks_total,
        tags_total,
        repaired_total,
        natural_repairs,
        sites_visited_total,
        flags_raised_total,
        total_cost,
        cost_per_repair: if repaired_total > 0 {
            total_cost / repaired_total as f64
        } else {
            0.0
        },
        cost_per_mitigated_kg: if mitigated_emissions_kg > 0.0 {
            total_cost / mitigated_emissions_kg
        } else {
            0.0
        },
    }
}
