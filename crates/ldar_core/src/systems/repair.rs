//! Repair resolution for tagged leaks.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::company::Companies;
use crate::ecs::{Leak, LeakStatus, TagSource};
use crate::scenario::ProgramConfig;
use crate::telemetry::DailyScratch;

/// Repairs every tagged leak whose waiting period has elapsed. A leak tagged
/// by a company on day T waits the tagging method's reporting delay plus the
/// program repair delay and is repaired on exactly day
/// `T + reporting + repair`. Naturally discovered leaks are repaired the day
/// they are found.
pub fn repair_leaks_system(
    clock: Res<SimulationClock>,
    config: Res<ProgramConfig>,
    companies: Res<Companies>,
    mut scratch: ResMut<DailyScratch>,
    mut leaks: Query<&mut Leak>,
) {
    let day = clock.day_index();
    for mut leak in leaks.iter_mut() {
        if leak.status != LeakStatus::Tagged {
            continue;
        }
        let Some(tagged) = leak.date_tagged else {
            continue;
        };
        let due = match leak.tagged_by {
            Some(TagSource::Natural) => tagged,
            Some(TagSource::Company { method, .. }) => {
                let reporting = companies
                    .0
                    .get(method.0)
                    .map(|c| c.params.reporting_delay_days)
                    .unwrap_or(0);
                tagged + reporting + leak.repair_delay_days
            }
            None => tagged + leak.repair_delay_days,
        };
        if day >= due {
            leak.status = LeakStatus::Repaired;
            leak.date_repaired = Some(day);
            scratch.repairs += 1;
            scratch.cost += config.0.repair_cost + config.0.verification_cost;
        }
    }
}
