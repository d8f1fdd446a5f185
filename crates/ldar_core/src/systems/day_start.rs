//! Start-of-day bookkeeping on per-site survey state.

use bevy_ecs::prelude::{Query, Res};

use crate::clock::SimulationClock;
use crate::ecs::MethodStates;

/// Clears the per-day attempted marks, ages every site's neglect counters
/// and resets annual survey quotas on January 1st.
pub fn start_of_day_system(clock: Res<SimulationClock>, mut sites: Query<&mut MethodStates>) {
    let year_start = clock.is_year_start();
    for mut states in sites.iter_mut() {
        for state in states.0.values_mut() {
            state.attempted_today = false;
            state.days_since_last_survey = state.days_since_last_survey.saturating_add(1);
            if year_start {
                state.surveys_this_year = 0;
            }
        }
    }
}
