//! Shared fixtures for tests in this crate and downstream crates.

use bevy_ecs::prelude::World;

use crate::clock::SimDate;
use crate::scenario::{build_scenario, MethodParams, ScenarioParams, SiteRecord};
use crate::weather::WeatherFields;

/// Benign weather on a 4x4 grid: every envelope passes on every day.
pub fn calm_weather(days: usize) -> WeatherFields {
    WeatherFields::uniform(4, 4, days, 10.0, 2.0, 0.0)
}

/// `count` sites spread over the calm-weather grid.
pub fn test_sites(count: usize) -> Vec<SiteRecord> {
    (0..count)
        .map(|i| {
            let coord = (i % 4) as f64 * 0.9 + 0.1;
            SiteRecord::new(&format!("F-{i:03}"), coord, coord)
        })
        .collect()
}

/// A small single-method scenario over `days` days, seeded for reproducible
/// tests. Callers tweak the returned params before building.
pub fn test_params(days: u32, n_sites: usize) -> ScenarioParams {
    ScenarioParams::new(SimDate::new(2021, 1, 1), days)
        .with_seed(7)
        .with_method(MethodParams::component("ogi"))
        .with_sites(test_sites(n_sites))
}

/// Build a ready-to-run world from `params` against calm weather.
///
/// # Panics
///
/// Panics on configuration errors; fixtures are expected to be valid.
pub fn create_test_world(params: &ScenarioParams) -> World {
    let mut world = World::new();
    let weather = calm_weather(params.total_days as usize);
    build_scenario(&mut world, params, &weather).expect("test scenario should build");
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulationClock;

    #[test]
    fn fixture_world_is_runnable() {
        let params = test_params(5, 3);
        let mut world = create_test_world(&params);
        let mut schedule = crate::runner::simulation_schedule();
        assert_eq!(crate::runner::run_to_end(&mut world, &mut schedule), 5);
        assert!(world.resource::<SimulationClock>().is_finished());
    }

    #[test]
    fn test_sites_stay_on_the_calm_grid() {
        let weather = calm_weather(1);
        for site in test_sites(10) {
            assert!(weather
                .grid_index_for(&site.facility_id, site.lat, site.lon)
                .is_ok());
        }
    }
}
