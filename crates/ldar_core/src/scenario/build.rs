//! Scenario construction: validates parameters and populates a fresh world.
//!
//! All stringly configuration (sensor names, threshold interactions) and all
//! spatial resolution (site to weather-grid cell) happens here, once. After
//! `build_scenario` returns, the tick loop never fails on configuration.

use std::collections::HashMap;

use bevy_ecs::prelude::{Resource, World};
use tracing::{info, warn};

use crate::clock::{SimDate, SimulationClock};
use crate::company::{Companies, Company};
use crate::daylight::daylight_hours;
use crate::ecs::{
    FlagState, LeakSchedule, MethodId, MethodSiteState, MethodStates, Site, SiteRoster,
};
use crate::errors::ConfigError;
use crate::rng::SimRng;
use crate::scenario::params::{ProgramParams, ScenarioParams};
use crate::telemetry::{DailyScratch, SimTelemetry};
use crate::weather::{DeploymentGrid, WeatherFields};

/// Program-wide (method-independent) parameters as a world resource.
#[derive(Debug, Clone, Resource)]
pub struct ProgramConfig(pub ProgramParams);

/// Daylight lookup anchored at the mean site latitude. Site-to-site daylight
/// differences within one program area are well under scheduling noise.
#[derive(Debug, Clone, Copy, Resource)]
pub struct DaylightInfo {
    mean_lat: f64,
}

impl DaylightInfo {
    pub fn new(mean_lat: f64) -> Self {
        Self { mean_lat }
    }

    pub fn hours_on(&self, date: SimDate) -> f64 {
        daylight_hours(self.mean_lat, date.day_of_year())
    }
}

/// Populate `world` with one simulation instance.
///
/// Fatal misconfiguration (workday out of range, a site outside the weather
/// grid, unknown sensor or threshold names, weather shorter than the run)
/// returns a [ConfigError]; soft conditions only log.
pub fn build_scenario(
    world: &mut World,
    params: &ScenarioParams,
    weather: &WeatherFields,
) -> Result<(), ConfigError> {
    if weather.days < params.total_days as usize {
        return Err(ConfigError::WeatherTooShort {
            available: weather.days,
            required: params.total_days,
        });
    }

    let mut rng = SimRng::new(params.seed);

    // Deployment eligibility is precomputed for the whole run; the coverage
    // masks burn their draws here, before day 0 reseeds the stream.
    let envelopes: Vec<_> = params
        .methods
        .iter()
        .map(|m| (m.envelope, m.coverage))
        .collect();
    let grid = DeploymentGrid::build(weather, &envelopes, rng.rng());

    let mut companies = Vec::with_capacity(params.methods.len());
    for (idx, method) in params.methods.iter().enumerate() {
        if method.n_crews == 0 {
            warn!(method = %method.name, "method configured with zero crews; it will never survey");
        } else if method.required_surveys_per_year > 0 {
            // Shortage estimate: annual survey minutes demanded vs crew
            // capacity. The run continues with the configured count.
            let demand_mins = params.sites.len() as f64
                * method.required_surveys_per_year as f64
                * method.survey_minutes;
            let capacity_mins = method.n_crews as f64 * method.max_workday_hours * 60.0 * 365.0;
            if demand_mins > capacity_mins {
                let needed = (demand_mins / (method.max_workday_hours * 60.0 * 365.0)).ceil();
                warn!(
                    method = %method.name,
                    configured = method.n_crews,
                    estimated = needed,
                    "estimated crew requirement exceeds configured count; surveys may be under-served"
                );
            }
        }
        companies.push(Company::build(
            MethodId(idx),
            method.clone(),
            &params.program.rate_dist,
        )?);
    }

    let mut roster = Vec::with_capacity(params.sites.len());
    let mut lat_sum = 0.0;
    for record in &params.sites {
        let (grid_xi, grid_yi) =
            weather.grid_index_for(&record.facility_id, record.lat, record.lon)?;
        lat_sum += record.lat;

        let mut states = HashMap::with_capacity(params.methods.len());
        for (idx, method) in params.methods.iter().enumerate() {
            states.insert(
                MethodId(idx),
                MethodSiteState::new(
                    method.min_interval_days,
                    method.required_surveys_per_year,
                    method.survey_minutes,
                ),
            );
        }

        let site = Site {
            facility_id: record.facility_id.clone(),
            lat: record.lat,
            lon: record.lon,
            grid_xi,
            grid_yi,
        };
        let entity = match &record.leak_timeline {
            Some(timeline) => world
                .spawn((
                    site,
                    MethodStates(states),
                    FlagState::default(),
                    LeakSchedule {
                        by_day: timeline.clone(),
                    },
                ))
                .id(),
            None => world
                .spawn((site, MethodStates(states), FlagState::default()))
                .id(),
        };
        roster.push(entity);
    }
    let mean_lat = if roster.is_empty() {
        0.0
    } else {
        lat_sum / roster.len() as f64
    };

    info!(
        sites = roster.len(),
        methods = params.methods.len(),
        days = params.total_days,
        seed = params.seed,
        "scenario built"
    );

    world.insert_resource(SimulationClock::new(params.start_date, params.total_days));
    world.insert_resource(rng);
    world.insert_resource(grid);
    world.insert_resource(Companies(companies));
    world.insert_resource(SiteRoster(roster));
    world.insert_resource(ProgramConfig(params.program.clone()));
    world.insert_resource(DaylightInfo::new(mean_lat));
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(DailyScratch::default());
    Ok(())
}
