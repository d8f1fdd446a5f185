//! Company deployment: the day's survey work for every configured method.
//!
//! Per company, the system materialises a mutable per-site snapshot from the
//! ECS, hands it to [Company::deploy_crews], then applies the outcome back:
//! survey-state writeback, leak tags, follow-up flag raises and clears.
//! Companies deploy in method order, so a follow-up method configured after
//! a screening method can serve flags raised earlier the same day.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::company::Companies;
use crate::crew::SiteDay;
use crate::ecs::{FlagState, Leak, LeakStatus, MethodStates, Site, SiteRoster, TagSource};
use crate::rng::SimRng;
use crate::scenario::{DaylightInfo, ProgramConfig};
use crate::scheduling::GeoPoint;
use crate::telemetry::{DailyScratch, SimTelemetry};
use crate::weather::DeploymentGrid;

#[allow(clippy::too_many_arguments)]
pub fn deploy_companies_system(
    clock: Res<SimulationClock>,
    grid: Res<DeploymentGrid>,
    config: Res<ProgramConfig>,
    daylight: Res<DaylightInfo>,
    roster: Res<SiteRoster>,
    mut companies: ResMut<Companies>,
    mut rng: ResMut<SimRng>,
    mut scratch: ResMut<DailyScratch>,
    mut telemetry: ResMut<SimTelemetry>,
    mut sites: Query<(&Site, &mut MethodStates, &mut FlagState)>,
    mut leaks: Query<&mut Leak>,
) {
    let day = clock.day_index();
    let daylight_hours = daylight.hours_on(clock.date());

    for company in companies.0.iter_mut() {
        let method = company.method;

        // Aggregates are rebuilt per company so tags applied by an earlier
        // method are visible to the next one.
        let mut emissions: HashMap<Entity, (f64, usize, usize)> = HashMap::new();
        for leak in leaks.iter() {
            if leak.status == LeakStatus::Repaired {
                continue;
            }
            let entry = emissions.entry(leak.site).or_default();
            entry.0 += leak.rate_g_per_sec;
            entry.1 += 1;
            if leak.status == LeakStatus::Active {
                entry.2 += 1;
            }
        }

        let mut day_sites: Vec<SiteDay> = Vec::with_capacity(roster.0.len());
        for &entity in &roster.0 {
            let Ok((site, states, flag)) = sites.get(entity) else {
                continue;
            };
            let (rate, emitting, untagged) = emissions.get(&entity).copied().unwrap_or_default();
            day_sites.push(SiteDay {
                entity,
                geo: GeoPoint {
                    lat: site.lat,
                    lon: site.lon,
                },
                grid_xi: site.grid_xi,
                grid_yi: site.grid_yi,
                state: *states.get(method),
                flagged: flag.flagged,
                emitting_rate_g_per_sec: rate,
                active_leak_count: emitting,
                untagged_leak_count: untagged,
            });
        }

        let mut outcome = company.deploy_crews(
            day,
            daylight_hours,
            &grid,
            &mut day_sites,
            config.0.venting,
            rng.rng(),
        );

        for day_site in &day_sites {
            if let Ok((_, mut states, _)) = sites.get_mut(day_site.entity) {
                *states.get_mut(method) = day_site.state;
            }
        }

        for &(site_idx, crew) in &outcome.tag_sites {
            let site_entity = day_sites[site_idx].entity;
            let mut tagged_any = false;
            for mut leak in leaks.iter_mut() {
                if leak.site == site_entity && leak.status == LeakStatus::Active {
                    leak.status = LeakStatus::Tagged;
                    leak.tagged_by = Some(TagSource::Company { method, crew });
                    leak.date_tagged = Some(day);
                    scratch.tags += 1;
                    tagged_any = true;
                }
            }
            if !tagged_any {
                // Detection on a site whose leaks all carry tags already.
                outcome.record.redundant_tags += 1;
            }
        }

        let decisions = company.flag_sites(&outcome.candidates);
        for decision in &decisions {
            if let Ok((_, _, mut flag)) = sites.get_mut(decision.site) {
                if flag.raise(method, day) {
                    outcome.record.flags_raised += 1;
                    if decision.venting_carried {
                        outcome.record.flags_venting_dependent += 1;
                    }
                    if decision.leaks_already_tagged {
                        outcome.record.redundant_tags += 1;
                    }
                } else {
                    outcome.record.redundant_flags += 1;
                }
            }
        }

        for &site_idx in &outcome.clear_flags {
            if let Ok((_, _, mut flag)) = sites.get_mut(day_sites[site_idx].entity) {
                flag.clear();
            }
        }

        scratch.cost += outcome.record.cost;
        telemetry.method_rows.push(outcome.record);
    }
}
