//! Leak lifecycle systems: aging with natural discovery, and daily leak
//! generation.

use bevy_ecs::prelude::{Commands, Entity, Query, Res, ResMut, With};

use crate::clock::SimulationClock;
use crate::ecs::{Leak, LeakSchedule, LeakStatus, Site, SiteRoster, TagSource};
use crate::rng::SimRng;
use crate::scenario::ProgramConfig;
use crate::telemetry::DailyScratch;

/// Ages every unrepaired leak by one day. An active leak that reaches the
/// natural-discovery threshold is tagged by the operator; the repair system
/// picks it up the same day with no reporting or repair delay. A leak that
/// crosses the threshold while a method already holds its tag keeps that
/// tag, and the discovery is recorded as a redundant tag.
pub fn age_leaks_system(
    clock: Res<SimulationClock>,
    config: Res<ProgramConfig>,
    mut scratch: ResMut<DailyScratch>,
    mut leaks: Query<&mut Leak>,
) {
    let day = clock.day_index();
    let natural_after = config.0.natural_discovery_days;
    for mut leak in leaks.iter_mut() {
        if leak.status == LeakStatus::Repaired {
            continue;
        }
        leak.days_active += 1;
        if leak.days_active == natural_after && leak.status == LeakStatus::Tagged {
            scratch.redundant_tags += 1;
        }
        if leak.status == LeakStatus::Active && leak.days_active >= natural_after {
            leak.status = LeakStatus::Tagged;
            leak.tagged_by = Some(TagSource::Natural);
            leak.date_tagged = Some(day);
            scratch.tags += 1;
        }
    }
}

/// Spawns today's new leaks, site by site in roster order. A site with a
/// pre-generated timeline uses it verbatim; everyone else gets a Bernoulli
/// draw against the program leak-production rate.
pub fn spawn_leaks_system(
    mut commands: Commands,
    clock: Res<SimulationClock>,
    config: Res<ProgramConfig>,
    roster: Res<SiteRoster>,
    mut rng: ResMut<SimRng>,
    mut scratch: ResMut<DailyScratch>,
    schedules: Query<Option<&LeakSchedule>, With<Site>>,
) {
    let day = clock.day_index();
    for &site in &roster.0 {
        let Ok(schedule) = schedules.get(site) else {
            continue;
        };
        match schedule {
            Some(timeline) => {
                if let Some(rates) = timeline.by_day.get(&day) {
                    for &rate in rates {
                        spawn_leak(&mut commands, site, rate, &config, &mut scratch);
                    }
                }
            }
            None => {
                if rng.gen_bool_with(config.0.leak_production_rate) {
                    let rate = config.0.rate_dist.sample(rng.rng());
                    spawn_leak(&mut commands, site, rate, &config, &mut scratch);
                }
            }
        }
    }
}

fn spawn_leak(
    commands: &mut Commands,
    site: Entity,
    rate_g_per_sec: f64,
    config: &ProgramConfig,
    scratch: &mut DailyScratch,
) {
    commands.spawn(Leak::new_active(
        site,
        rate_g_per_sec,
        config.0.repair_delay_days,
    ));
    scratch.new_leaks += 1;
}
