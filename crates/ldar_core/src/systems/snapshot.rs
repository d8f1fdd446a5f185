//! End-of-day program snapshot into [SimTelemetry].

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{Leak, LeakStatus};
use crate::telemetry::{DailyScratch, ProgramDayRecord, SimTelemetry};

/// g/s to kg/day. Applied exactly once, at this reporting boundary; all
/// internal state stays in g/s.
const G_PER_SEC_TO_KG_PER_DAY: f64 = 86.4;

/// Appends the program-wide daily row: leak census, emissions, and the day's
/// tag/repair/cost counters folded into the running totals.
pub fn snapshot_timeseries_system(
    clock: Res<SimulationClock>,
    scratch: Res<DailyScratch>,
    mut telemetry: ResMut<SimTelemetry>,
    leaks: Query<&Leak>,
) {
    let mut active_leaks = 0u32;
    let mut rate_sum_g_per_sec = 0.0;
    for leak in leaks.iter() {
        if leak.status != LeakStatus::Repaired {
            active_leaks += 1;
            rate_sum_g_per_sec += leak.rate_g_per_sec;
        }
    }

    telemetry.tags_total += scratch.tags;
    telemetry.cum_repaired += scratch.repairs;
    telemetry.cum_cost += scratch.cost;

    let row = ProgramDayRecord {
        day: clock.day_index(),
        new_leaks: scratch.new_leaks,
        active_leaks,
        daily_emissions_kg: rate_sum_g_per_sec * G_PER_SEC_TO_KG_PER_DAY,
        tags_today: scratch.tags,
        tags_total: telemetry.tags_total,
        redundant_tags: scratch.redundant_tags,
        repairs_today: scratch.repairs,
        cum_repaired: telemetry.cum_repaired,
        daily_cost: scratch.cost,
        cum_cost: telemetry.cum_cost,
    };
    telemetry.program_rows.push(row);
}
