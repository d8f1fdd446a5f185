//! Per-crew daily scheduling: candidate selection and visit execution.
//!
//! A crew's day is `StartDay -> {SelectSite -> CheckEligibility ->
//! CheckTimeBudget -> Visit | Rollover | Idle} -> EndDay`. The candidate
//! pool is shared across all crews of a method; the pool owns the
//! sorted-by-neglect order, the claimed set, and the early-exit halt.

use bevy_ecs::prelude::Entity;
use rand::rngs::StdRng;

use crate::ecs::{MethodId, MethodSiteState};
use crate::scheduling::itinerary::{PlanEntry, Rollover, SurveyPlan};
use crate::scheduling::travel::{GeoPoint, TravelModel};
use crate::weather::DeploymentGrid;

/// A crew. The rollover entry is the only state that survives a day.
#[derive(Debug, Clone, Default)]
pub struct Crew {
    pub id: usize,
    pub rollover: Option<Rollover>,
}

impl Crew {
    pub fn new(id: usize) -> Self {
        Self { id, rollover: None }
    }
}

/// Mutable per-method snapshot of one site for a single day. The deploy
/// system materialises these from the ECS, scheduling mutates them, and the
/// system writes the survey state back.
#[derive(Debug, Clone)]
pub struct SiteDay {
    pub entity: Entity,
    pub geo: GeoPoint,
    pub grid_xi: usize,
    pub grid_yi: usize,
    pub state: MethodSiteState,
    pub flagged: bool,
    /// Summed g/s over leaks that are still emitting (active or tagged).
    pub emitting_rate_g_per_sec: f64,
    pub active_leak_count: usize,
    /// Emitting leaks not yet tagged by anyone.
    pub untagged_leak_count: usize,
}

/// Shared candidate pool for one method-day.
#[derive(Debug)]
pub struct CandidatePool {
    /// Site indices in scan order: descending neglect, stable over the
    /// roster (input-row) order for ties.
    order: Vec<usize>,
    claimed: Vec<bool>,
    halted: bool,
}

impl CandidatePool {
    /// Build the day's pool. Follow-up methods only consider currently
    /// flagged sites; everyone else considers the full roster.
    pub fn build(sites: &[SiteDay], follow_up: bool) -> Self {
        let mut order: Vec<usize> = (0..sites.len())
            .filter(|&i| !follow_up || sites[i].flagged)
            .collect();
        order.sort_by(|&a, &b| {
            sites[b]
                .state
                .days_since_last_survey
                .cmp(&sites[a].state.days_since_last_survey)
        });
        Self {
            claimed: vec![false; sites.len()],
            order,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Select the next site for any crew of this method, mutating
    /// attempted-today marks as the scan passes ineligible sites.
    ///
    /// Returns `None` when the scan halts (the most neglected unclaimed site
    /// is still inside its minimum interval, so every later site is too) or
    /// when the pool is exhausted.
    pub fn next_site(
        &mut self,
        sites: &mut [SiteDay],
        method: MethodId,
        follow_up: bool,
        grid: &DeploymentGrid,
        day: u32,
    ) -> Option<usize> {
        if self.halted {
            return None;
        }
        for pos in 0..self.order.len() {
            let idx = self.order[pos];
            if self.claimed[idx] || sites[idx].state.attempted_today {
                continue;
            }
            let state = &sites[idx].state;
            if !follow_up && state.days_since_last_survey < state.min_interval_days {
                // Pool is sorted by neglect: everything after this site is
                // even less due. Stop scanning for the day.
                self.halted = true;
                return None;
            }
            if state.required_surveys_per_year > 0
                && state.surveys_this_year >= state.required_surveys_per_year
            {
                continue;
            }
            if !grid.is_deployable(method, sites[idx].grid_xi, sites[idx].grid_yi, day) {
                sites[idx].state.attempted_today = true;
                continue;
            }
            self.claimed[idx] = true;
            sites[idx].state.attempted_today = true;
            return Some(idx);
        }
        None
    }

    /// Claim a site outside the scan order. A resumed rollover owns its site
    /// for the whole day, even when the resume ends partial again.
    pub fn claim(&mut self, sites: &mut [SiteDay], idx: usize) {
        self.claimed[idx] = true;
        sites[idx].state.attempted_today = true;
    }

    /// Release a claim on a site the crew could not reach today.
    pub fn release(&mut self, sites: &mut [SiteDay], idx: usize) {
        self.claimed[idx] = false;
        sites[idx].state.attempted_today = false;
    }
}

/// How a single visit attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisitOutcome {
    /// Travel + survey (+ travel home) completed; counters reset and the
    /// visit is handed to detection.
    Full,
    /// Day ended mid-survey; `remaining_mins` rolls to the crew's next day.
    Partial { remaining_mins: f64 },
    /// Not even travel-to fits in the remaining budget; the crew's day is
    /// over and the site stays unvisited.
    OutOfTime,
}

/// Execute one visit attempt against the crew's remaining budget.
///
/// On `Full`, survey counters are reset on `site.state` and the crew's
/// position moves to the site. Detection is the caller's job.
pub fn execute_visit(
    site: &mut SiteDay,
    plan: &mut SurveyPlan,
    position: &mut Option<GeoPoint>,
    travel: &dyn TravelModel,
    rng: &mut StdRng,
) -> VisitOutcome {
    let remaining = plan.remaining_mins();
    let travel_to = travel.travel_to_mins(*position, site.geo, rng);
    if travel_to >= remaining {
        plan.entries.push(PlanEntry {
            site: site.entity,
            go: false,
            travel_to_mins: travel_to,
            survey_mins: 0.0,
            travel_home_mins: 0.0,
            remaining_mins: 0.0,
        });
        return VisitOutcome::OutOfTime;
    }

    let survey = site.state.survey_minutes;
    let after_travel = remaining - travel_to;
    if after_travel < survey {
        // Partial visit: burn the whole remaining budget, owe the rest of
        // the survey to tomorrow.
        let owed = survey - after_travel;
        plan.entries.push(PlanEntry {
            site: site.entity,
            go: true,
            travel_to_mins: travel_to,
            survey_mins: after_travel,
            travel_home_mins: 0.0,
            remaining_mins: owed,
        });
        plan.consume(remaining);
        *position = Some(site.geo);
        return VisitOutcome::Partial {
            remaining_mins: owed,
        };
    }

    // Full visit. Travel home is bounded by what is left of the day so the
    // consumed total never exceeds the budget.
    let travel_home = travel
        .travel_home_mins(site.geo, rng)
        .min(after_travel - survey);
    plan.entries.push(PlanEntry {
        site: site.entity,
        go: true,
        travel_to_mins: travel_to,
        survey_mins: survey,
        travel_home_mins: travel_home,
        remaining_mins: 0.0,
    });
    plan.consume(travel_to + survey + travel_home);
    *position = Some(site.geo);
    complete_survey(&mut site.state);
    VisitOutcome::Full
}

/// Resume a rolled-over survey: no travel-to, work up to the day's budget.
/// Returns `Full` when the owed minutes fit, otherwise the updated partial.
pub fn resume_rollover(
    site: &mut SiteDay,
    owed_mins: f64,
    plan: &mut SurveyPlan,
    position: &mut Option<GeoPoint>,
    travel: &dyn TravelModel,
    rng: &mut StdRng,
) -> VisitOutcome {
    let remaining = plan.remaining_mins();
    if remaining <= 0.0 {
        return VisitOutcome::Partial {
            remaining_mins: owed_mins,
        };
    }
    if owed_mins > remaining {
        plan.entries.push(PlanEntry {
            site: site.entity,
            go: true,
            travel_to_mins: 0.0,
            survey_mins: remaining,
            travel_home_mins: 0.0,
            remaining_mins: owed_mins - remaining,
        });
        plan.consume(remaining);
        *position = Some(site.geo);
        return VisitOutcome::Partial {
            remaining_mins: owed_mins - remaining,
        };
    }
    let travel_home = travel
        .travel_home_mins(site.geo, rng)
        .min(remaining - owed_mins);
    plan.entries.push(PlanEntry {
        site: site.entity,
        go: true,
        travel_to_mins: 0.0,
        survey_mins: owed_mins,
        travel_home_mins: travel_home,
        remaining_mins: 0.0,
    });
    plan.consume(owed_mins + travel_home);
    *position = Some(site.geo);
    complete_survey(&mut site.state);
    VisitOutcome::Full
}

fn complete_survey(state: &mut MethodSiteState) {
    state.days_since_last_survey = 0;
    state.surveys_done += 1;
    state.surveys_this_year += 1;
    state.attempted_today = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::scheduling::travel::EmpiricalTravel;
    use crate::weather::{DeploymentGrid, WeatherEnvelope, WeatherFields};

    fn site_day(entity_bits: u32, days_since: u32, min_interval: u32, survey_mins: f64) -> SiteDay {
        let mut state = MethodSiteState::new(min_interval, 0, survey_mins);
        state.days_since_last_survey = days_since;
        SiteDay {
            entity: Entity::from_raw(entity_bits),
            geo: GeoPoint { lat: 0.0, lon: 0.0 },
            grid_xi: 0,
            grid_yi: 0,
            state,
            flagged: false,
            emitting_rate_g_per_sec: 0.0,
            active_leak_count: 0,
            untagged_leak_count: 0,
        }
    }

    fn open_grid() -> DeploymentGrid {
        let weather = WeatherFields::uniform(1, 1, 30, 10.0, 2.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        DeploymentGrid::build(&weather, &[(WeatherEnvelope::default(), None)], &mut rng)
    }

    fn fixed_travel(mins: f64) -> EmpiricalTravel {
        EmpiricalTravel::new(vec![mins])
    }

    #[test]
    fn pool_ranks_by_neglect_with_stable_ties() {
        let sites = vec![
            site_day(0, 5, 0, 60.0),
            site_day(1, 20, 0, 60.0),
            site_day(2, 20, 0, 60.0),
            site_day(3, 11, 0, 60.0),
        ];
        let pool = CandidatePool::build(&sites, false);
        assert_eq!(pool.order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn min_interval_halts_the_scan_instead_of_skipping() {
        // Most neglected site is still inside its interval: nothing later
        // can be due either, so the whole day's scan stops.
        let mut sites = vec![site_day(0, 5, 10, 60.0), site_day(1, 3, 10, 60.0)];
        let mut pool = CandidatePool::build(&sites, false);
        let grid = open_grid();
        assert_eq!(
            pool.next_site(&mut sites, MethodId(0), false, &grid, 0),
            None
        );
        assert!(pool.is_halted());
        // No attempted-today marks from a halted scan.
        assert!(!sites[0].state.attempted_today);
        assert!(!sites[1].state.attempted_today);
    }

    #[test]
    fn annual_quota_skips_without_halting() {
        let mut quota_met = site_day(0, 50, 0, 60.0);
        quota_met.state.required_surveys_per_year = 1;
        quota_met.state.surveys_this_year = 1;
        let mut sites = vec![quota_met, site_day(1, 10, 0, 60.0)];
        let mut pool = CandidatePool::build(&sites, false);
        let grid = open_grid();
        assert_eq!(
            pool.next_site(&mut sites, MethodId(0), false, &grid, 0),
            Some(1)
        );
    }

    #[test]
    fn weather_failure_marks_attempted_and_continues() {
        let weather = WeatherFields::uniform(2, 1, 5, 10.0, 2.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let grid = DeploymentGrid::build(
            &weather,
            &[(
                WeatherEnvelope {
                    max_wind_m_per_s: 1.0,
                    ..WeatherEnvelope::default()
                },
                None,
            )],
            &mut rng,
        );
        // Both cells fail the wind envelope, so every candidate gets marked
        // attempted and the pool exhausts without halting.
        let mut sites = vec![site_day(0, 30, 0, 60.0), site_day(1, 20, 0, 60.0)];
        let mut pool = CandidatePool::build(&sites, false);
        assert_eq!(
            pool.next_site(&mut sites, MethodId(0), false, &grid, 0),
            None
        );
        assert!(!pool.is_halted());
        assert!(sites[0].state.attempted_today);
        assert!(sites[1].state.attempted_today);
    }

    #[test]
    fn follow_up_pool_only_contains_flagged_sites() {
        let mut flagged = site_day(0, 1, 0, 60.0);
        flagged.flagged = true;
        let sites = vec![site_day(1, 99, 0, 60.0), flagged];
        let pool = CandidatePool::build(&sites, true);
        assert_eq!(pool.order, vec![1]);
    }

    #[test]
    fn full_visit_consumes_travel_survey_and_home() {
        let mut site = site_day(0, 10, 0, 60.0);
        let mut plan = SurveyPlan::new(480.0);
        let mut position = None;
        let travel = fixed_travel(30.0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = execute_visit(&mut site, &mut plan, &mut position, &travel, &mut rng);
        assert_eq!(outcome, VisitOutcome::Full);
        assert!((plan.consumed_mins - 120.0).abs() < 1e-9);
        assert_eq!(site.state.days_since_last_survey, 0);
        assert_eq!(site.state.surveys_this_year, 1);
    }

    #[test]
    fn partial_visit_matches_rollover_arithmetic() {
        // Budget 40, travel-to 30, survey 60: partial visit consumes all 40
        // and owes 60 - (40 - 30) = 50 minutes.
        let mut site = site_day(0, 10, 0, 60.0);
        let mut plan = SurveyPlan::new(40.0);
        let mut position = None;
        let travel = fixed_travel(30.0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = execute_visit(&mut site, &mut plan, &mut position, &travel, &mut rng);
        assert_eq!(
            outcome,
            VisitOutcome::Partial {
                remaining_mins: 50.0
            }
        );
        assert_eq!(plan.consumed_mins, 40.0);
        // Survey not complete: counters untouched.
        assert_eq!(site.state.days_since_last_survey, 10);
        assert_eq!(site.state.surveys_this_year, 0);
    }

    #[test]
    fn travel_to_beyond_budget_is_out_of_time() {
        let mut site = site_day(0, 10, 0, 60.0);
        let mut plan = SurveyPlan::new(20.0);
        let mut position = None;
        let travel = fixed_travel(30.0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = execute_visit(&mut site, &mut plan, &mut position, &travel, &mut rng);
        assert_eq!(outcome, VisitOutcome::OutOfTime);
        assert_eq!(plan.consumed_mins, 0.0);
    }

    #[test]
    fn rollover_resume_completes_without_travel_to() {
        let mut site = site_day(0, 10, 0, 60.0);
        let mut plan = SurveyPlan::new(480.0);
        let mut position = None;
        let travel = fixed_travel(30.0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = resume_rollover(&mut site, 50.0, &mut plan, &mut position, &travel, &mut rng);
        assert_eq!(outcome, VisitOutcome::Full);
        // 50 owed survey minutes + 30 travel home; no travel-to.
        assert!((plan.consumed_mins - 80.0).abs() < 1e-9);
        assert_eq!(site.state.surveys_this_year, 1);
    }

    #[test]
    fn rollover_can_spill_across_multiple_days() {
        let mut site = site_day(0, 10, 0, 60.0);
        let mut plan = SurveyPlan::new(15.0);
        let mut position = None;
        let travel = fixed_travel(5.0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = resume_rollover(&mut site, 50.0, &mut plan, &mut position, &travel, &mut rng);
        assert_eq!(
            outcome,
            VisitOutcome::Partial {
                remaining_mins: 35.0
            }
        );
        assert_eq!(plan.consumed_mins, 15.0);
    }
}
