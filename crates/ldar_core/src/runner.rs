//! Simulation runner: advances the daily tick loop over a built world.
//!
//! Each day resets the scratch counters, reseeds the random stream for the
//! timestep, runs the schedule, then advances the clock. The fixed system
//! order inside the schedule is the engine's core contract: day start, leak
//! aging and natural tagging, leak generation, deployment, repairs,
//! telemetry snapshot.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::SimulationClock;
use crate::rng::SimRng;
use crate::systems::{
    age_leaks_system, deploy_companies_system, repair_leaks_system, snapshot_timeseries_system,
    spawn_leaks_system, start_of_day_system,
};
use crate::telemetry::DailyScratch;

/// Builds the daily schedule. Systems are strictly chained; [apply_deferred]
/// sits between leak generation and deployment so leaks spawned today are
/// discoverable today.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            start_of_day_system,
            age_leaks_system,
            spawn_leaks_system,
            apply_deferred,
            deploy_companies_system,
            repair_leaks_system,
            snapshot_timeseries_system,
        )
            .chain(),
    );
    schedule
}

/// Runs one simulated day. Returns false once the clock has reached the end
/// of the scenario.
pub fn run_next_day(world: &mut World, schedule: &mut Schedule) -> bool {
    if world.resource::<SimulationClock>().is_finished() {
        return false;
    }
    let day = world.resource::<SimulationClock>().day_index();
    world.resource_mut::<DailyScratch>().reset();
    world.resource_mut::<SimRng>().reseed_for_day(day);
    schedule.run(world);
    world.resource_mut::<SimulationClock>().advance_day();
    true
}

/// Runs every remaining day. Returns the number of days executed.
pub fn run_to_end(world: &mut World, schedule: &mut Schedule) -> usize {
    let mut days = 0;
    while run_next_day(world, schedule) {
        days += 1;
    }
    days
}

/// Runs every remaining day, invoking `hook` after each completed day.
pub fn run_to_end_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> usize
where
    F: FnMut(&World),
{
    let mut days = 0;
    while run_next_day(world, schedule) {
        hook(world);
        days += 1;
    }
    days
}
