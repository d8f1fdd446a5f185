//! Companies: one per configured method. A company owns its crew pool, runs
//! the daily deploy step, accumulates repeat measurements in a watch-list,
//! and turns the day's candidate flags into final follow-up decisions.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Resource};
use rand::rngs::StdRng;

use crate::crew::{
    execute_visit, resume_rollover, CandidatePool, Crew, SiteDay, VisitOutcome,
};
use crate::distributions::{RateDist, VentingModel};
use crate::ecs::MethodId;
use crate::errors::ConfigError;
use crate::scenario::params::{FlagThreshold, MethodParams, MethodScale, RateAggregator};
use crate::scheduling::itinerary::{Rollover, SurveyPlan};
use crate::scheduling::travel::{build_travel_model, GeoPoint, TravelModel, TravelSpec};
use crate::scheduling::DispatchQueue;
use crate::sensors::{build_sensor, SensorModel};
use crate::telemetry::MethodDayRecord;
use crate::weather::DeploymentGrid;

/// Resolved threshold/proportion interaction priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageOrder {
    /// Filter by threshold, then take the top share by rate.
    ThresholdFirst,
    /// Take the top share by rate, then filter by threshold.
    ProportionFirst,
}

impl TriageOrder {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "threshold_first" => Ok(Self::ThresholdFirst),
            "proportion_first" => Ok(Self::ProportionFirst),
            other => Err(ConfigError::UnknownFollowUpThreshold(other.to_string())),
        }
    }
}

/// A measurable outcome of one day's visit, pending end-of-day triage.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFlag {
    pub site: Entity,
    pub site_idx: usize,
    pub leaks_present: bool,
    pub true_rate_g_per_sec: f64,
    pub measured_g_per_sec: f64,
    /// Measured rate with the vented contribution scaled out.
    pub measured_sans_vent_g_per_sec: f64,
    /// True when the site leaks but every leak already carries a tag.
    pub all_leaks_tagged: bool,
}

/// Final decision to flag a site, with diagnostics for the day's record.
#[derive(Debug, Clone, Copy)]
pub struct FlagDecision {
    pub site: Entity,
    pub site_idx: usize,
    /// Threshold cleared only thanks to venting.
    pub venting_carried: bool,
    /// Flag raised on a site whose leaks are all tagged already.
    pub leaks_already_tagged: bool,
}

#[derive(Debug, Default)]
struct WatchEntry {
    measurements: Vec<f64>,
}

/// Everything the deploy system needs to apply after a company's day.
#[derive(Debug, Default)]
pub struct DeployOutcome {
    pub record: MethodDayRecord,
    pub candidates: Vec<CandidateFlag>,
    /// (site index, crew id) pairs whose active leaks get tagged.
    pub tag_sites: Vec<(usize, usize)>,
    /// Flagged sites served by a completed follow-up visit.
    pub clear_flags: Vec<usize>,
}

pub struct Company {
    pub method: MethodId,
    pub params: MethodParams,
    pub crews: Vec<Crew>,
    sensor: Box<dyn SensorModel>,
    travel: Box<dyn TravelModel>,
    triage: TriageOrder,
    /// Candidate/flagging threshold resolved to g/s at build.
    threshold_g_per_sec: f64,
    watch: HashMap<Entity, WatchEntry>,
}

impl std::fmt::Debug for Company {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Company")
            .field("method", &self.method)
            .field("name", &self.params.name)
            .field("crews", &self.crews.len())
            .finish()
    }
}

impl Company {
    /// Resolve a method's sensor, travel model and follow-up policy. All
    /// stringly configuration collapses to typed variants here; unknown
    /// names are fatal.
    pub fn build(
        method: MethodId,
        params: MethodParams,
        rate_dist: &RateDist,
    ) -> Result<Self, ConfigError> {
        if params.max_workday_hours <= 0.0 || params.max_workday_hours >= 24.0 {
            return Err(ConfigError::WorkdayOutOfRange {
                method: params.name.clone(),
                hours: params.max_workday_hours,
            });
        }
        let sensor = build_sensor(&params.sensor)?;
        if let TravelSpec::Routed { home_bases, .. } = &params.travel {
            if home_bases.is_empty() {
                return Err(ConfigError::NoHomeBase(params.name.clone()));
            }
        }
        let travel = build_travel_model(&params.travel);
        let (triage, threshold_g_per_sec) = match &params.follow_up {
            Some(follow_up) => (
                TriageOrder::from_name(&follow_up.interaction)?,
                match follow_up.threshold {
                    FlagThreshold::Absolute(rate) => rate,
                    FlagThreshold::Proportion(p) => rate_dist.quantile(p),
                },
            ),
            None => (TriageOrder::ThresholdFirst, 0.0),
        };
        let crews = (0..params.n_crews).map(Crew::new).collect();
        Ok(Self {
            method,
            params,
            crews,
            sensor,
            travel,
            triage,
            threshold_g_per_sec,
            watch: HashMap::new(),
        })
    }

    pub fn threshold_g_per_sec(&self) -> f64 {
        self.threshold_g_per_sec
    }

    /// Resolve today's per-crew work budget in minutes. Daylight-sensitive
    /// methods are bounded by the day length; a polar-night zero budget is
    /// an idle day, not an error.
    pub fn workday_minutes(&self, daylight_hours: f64) -> f64 {
        let hours = if self.params.consider_daylight {
            self.params.max_workday_hours.min(daylight_hours)
        } else {
            self.params.max_workday_hours
        };
        (hours * 60.0).max(0.0)
    }

    /// Run all crews for one day over the shared candidate pool.
    pub fn deploy_crews(
        &mut self,
        day: u32,
        daylight_hours: f64,
        grid: &DeploymentGrid,
        sites: &mut [SiteDay],
        venting: Option<VentingModel>,
        rng: &mut StdRng,
    ) -> DeployOutcome {
        let mut outcome = DeployOutcome {
            record: MethodDayRecord {
                day,
                method: self.method.0,
                ..MethodDayRecord::default()
            },
            ..DeployOutcome::default()
        };
        outcome.record.prop_sites_available = if sites.is_empty() {
            0.0
        } else {
            let available = sites
                .iter()
                .filter(|s| grid.is_deployable(self.method, s.grid_xi, s.grid_yi, day))
                .count();
            available as f64 / sites.len() as f64
        };

        let budget_mins = self.workday_minutes(daylight_hours);
        if budget_mins <= 0.0 {
            return outcome;
        }

        let follow_up = self.params.is_follow_up;
        let mut pool = CandidatePool::build(sites, follow_up);
        let mut plans: Vec<SurveyPlan> = self
            .crews
            .iter()
            .map(|_| SurveyPlan::new(budget_mins))
            .collect();
        let mut positions: Vec<Option<GeoPoint>> = vec![None; self.crews.len()];
        let mut queue = DispatchQueue::new();

        // Rollovers resume before any new candidate is considered. The
        // resuming crew owns the site for the rest of the day whatever the
        // outcome; no other crew may start a fresh survey there.
        for crew_idx in 0..self.crews.len() {
            if let Some(rollover) = self.crews[crew_idx].rollover.take() {
                if let Some(site_idx) = sites.iter().position(|s| s.entity == rollover.site) {
                    pool.claim(sites, site_idx);
                    let result = resume_rollover(
                        &mut sites[site_idx],
                        rollover.remaining_mins,
                        &mut plans[crew_idx],
                        &mut positions[crew_idx],
                        self.travel.as_ref(),
                        rng,
                    );
                    match result {
                        VisitOutcome::Full => {
                            self.record_visit(site_idx, crew_idx, sites, venting, rng, &mut outcome);
                        }
                        VisitOutcome::Partial { remaining_mins } => {
                            self.crews[crew_idx].rollover = Some(Rollover {
                                site: rollover.site,
                                remaining_mins,
                            });
                        }
                        VisitOutcome::OutOfTime => {}
                    }
                }
            }
            queue.push(crew_idx, plans[crew_idx].remaining_mins());
        }

        // Greedy LPT dispatch: the crew with the most remaining time takes
        // the next due site.
        while let Some((crew_idx, _remaining)) = queue.pop() {
            let Some(site_idx) = pool.next_site(sites, self.method, follow_up, grid, day) else {
                // Halted or exhausted: no crew will find anything either.
                break;
            };
            let result = execute_visit(
                &mut sites[site_idx],
                &mut plans[crew_idx],
                &mut positions[crew_idx],
                self.travel.as_ref(),
                rng,
            );
            match result {
                VisitOutcome::Full => {
                    self.record_visit(site_idx, crew_idx, sites, venting, rng, &mut outcome);
                    queue.push(crew_idx, plans[crew_idx].remaining_mins());
                }
                VisitOutcome::Partial { remaining_mins } => {
                    self.crews[crew_idx].rollover = Some(Rollover {
                        site: sites[site_idx].entity,
                        remaining_mins,
                    });
                }
                VisitOutcome::OutOfTime => {
                    pool.release(sites, site_idx);
                }
            }
        }

        for (crew_idx, plan) in plans.iter().enumerate() {
            outcome.record.travel_mins += plan
                .entries
                .iter()
                .filter(|e| e.go)
                .map(|e| e.travel_to_mins + e.travel_home_mins)
                .sum::<f64>();
            outcome.record.survey_mins +=
                plan.entries.iter().filter(|e| e.go).map(|e| e.survey_mins).sum::<f64>();
            let worked = plan.consumed_mins > 0.0 || self.crews[crew_idx].rollover.is_some();
            if worked {
                outcome.record.deployed_crews += 1;
                outcome.record.cost += self.params.cost_per_day;
            }
        }
        outcome.record.cost += self.params.cost_per_site * outcome.record.sites_visited as f64;
        outcome
    }

    /// Detection for one completed visit: measure the site, then either tag
    /// (component scale) or queue a candidate flag (site scale).
    fn record_visit(
        &mut self,
        site_idx: usize,
        crew_idx: usize,
        sites: &mut [SiteDay],
        venting: Option<VentingModel>,
        rng: &mut StdRng,
        outcome: &mut DeployOutcome,
    ) {
        outcome.record.sites_visited += 1;
        let site = &mut sites[site_idx];

        let vent = venting.map(|v| v.sample(rng)).unwrap_or(0.0);
        let true_rate = site.emitting_rate_g_per_sec + vent;
        let measurement = self.sensor.measure(true_rate, rng);

        if self.params.is_follow_up && site.flagged {
            // The outstanding follow-up is served by this visit whatever the
            // sensor says, so the site can be flagged again later.
            outcome.clear_flags.push(site_idx);
        }

        if !measurement.detected {
            if site.active_leak_count > 0 {
                site.state.missed_leaks += 1;
                outcome.record.missed_leaks += 1;
            }
            return;
        }

        match self.params.scale {
            MethodScale::Component => {
                outcome.tag_sites.push((site_idx, crew_idx));
            }
            MethodScale::Site => {
                if measurement.measured_g_per_sec >= self.threshold_g_per_sec {
                    let leak_share = if true_rate > 0.0 {
                        site.emitting_rate_g_per_sec / true_rate
                    } else {
                        0.0
                    };
                    outcome.candidates.push(CandidateFlag {
                        site: site.entity,
                        site_idx,
                        leaks_present: site.active_leak_count > 0,
                        true_rate_g_per_sec: true_rate,
                        measured_g_per_sec: measurement.measured_g_per_sec,
                        measured_sans_vent_g_per_sec: measurement.measured_g_per_sec * leak_share,
                        all_leaks_tagged: site.active_leak_count > 0
                            && site.untagged_leak_count == 0,
                    });
                }
            }
        }
    }

    /// End-of-day triage: collapse the day's candidates plus the accumulated
    /// watch-list into the final set of sites to flag.
    pub fn flag_sites(&mut self, candidates: &[CandidateFlag]) -> Vec<FlagDecision> {
        let Some(follow_up) = self.params.follow_up.clone() else {
            return Vec::new();
        };

        let mut decisions = Vec::new();
        let mut delayed: Vec<(&CandidateFlag, f64)> = Vec::new();

        for candidate in candidates {
            let entry = self.watch.entry(candidate.site).or_default();
            entry.measurements.push(candidate.measured_g_per_sec);

            // (a) Instant-threshold fast path: flags now, regardless of
            // repeat count or proportion.
            if let Some(instant) = follow_up.instant_threshold_g_per_sec {
                if candidate.measured_g_per_sec >= instant {
                    decisions.push(self.decision_for(candidate));
                    continue;
                }
            }
            // (b) Repeat-count delay gate over accumulated measurements.
            if (entry.measurements.len() as u32) < follow_up.min_measurements {
                continue;
            }
            let effective = aggregate(&entry.measurements, follow_up.aggregator);
            delayed.push((candidate, effective));
        }

        // (c) Threshold/proportion interaction in the configured priority.
        let survivors: Vec<(&CandidateFlag, f64)> = match self.triage {
            TriageOrder::ThresholdFirst => {
                let filtered: Vec<_> = delayed
                    .into_iter()
                    .filter(|(_, rate)| *rate >= self.threshold_g_per_sec)
                    .collect();
                take_top_share(filtered, follow_up.proportion)
            }
            TriageOrder::ProportionFirst => {
                take_top_share(delayed, follow_up.proportion)
                    .into_iter()
                    .filter(|(_, rate)| *rate >= self.threshold_g_per_sec)
                    .collect()
            }
        };

        for (candidate, _) in survivors {
            decisions.push(self.decision_for(candidate));
        }
        decisions
    }

    fn decision_for(&self, candidate: &CandidateFlag) -> FlagDecision {
        FlagDecision {
            site: candidate.site,
            site_idx: candidate.site_idx,
            venting_carried: candidate.measured_g_per_sec >= self.threshold_g_per_sec
                && candidate.measured_sans_vent_g_per_sec < self.threshold_g_per_sec,
            leaks_already_tagged: candidate.all_leaks_tagged,
        }
    }
}

/// Keep the top `ceil(n * proportion)` entries by effective rate, descending.
/// Sorting is stable so rate ties keep candidate (visit) order.
fn take_top_share<'a>(
    mut entries: Vec<(&'a CandidateFlag, f64)>,
    proportion: f64,
) -> Vec<(&'a CandidateFlag, f64)> {
    if entries.is_empty() {
        return entries;
    }
    let keep = (entries.len() as f64 * proportion.clamp(0.0, 1.0)).ceil() as usize;
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(keep);
    entries
}

fn aggregate(measurements: &[f64], aggregator: RateAggregator) -> f64 {
    match aggregator {
        RateAggregator::MostRecent => *measurements.last().unwrap_or(&0.0),
        RateAggregator::Maximum => measurements.iter().copied().fold(0.0, f64::max),
        RateAggregator::Mean => {
            if measurements.is_empty() {
                0.0
            } else {
                measurements.iter().sum::<f64>() / measurements.len() as f64
            }
        }
    }
}

/// All companies, in method order. Deployed sequentially each day.
#[derive(Debug, Default, Resource)]
pub struct Companies(pub Vec<Company>);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::distributions::LognormalRate;
    use crate::ecs::MethodSiteState;
    use crate::scenario::params::FollowUpParams;
    use crate::weather::{WeatherEnvelope, WeatherFields};

    fn candidate(idx: usize, measured: f64) -> CandidateFlag {
        CandidateFlag {
            site: Entity::from_raw(idx as u32),
            site_idx: idx,
            leaks_present: true,
            true_rate_g_per_sec: measured,
            measured_g_per_sec: measured,
            measured_sans_vent_g_per_sec: measured,
            all_leaks_tagged: false,
        }
    }

    fn screening_company(follow_up: FollowUpParams) -> Company {
        let mut params = MethodParams::screening("screen");
        params.follow_up = Some(follow_up);
        Company::build(
            MethodId(0),
            params,
            &RateDist::Lognormal(LognormalRate::new(0.0, 1.0)),
        )
        .expect("company builds")
    }

    #[test]
    fn proportion_triage_takes_top_share_by_rate() {
        let mut company = screening_company(FollowUpParams {
            proportion: 0.3,
            threshold: FlagThreshold::Absolute(0.0),
            ..FollowUpParams::default()
        });
        let candidates: Vec<CandidateFlag> =
            (0..10).map(|i| candidate(i, (i + 1) as f64)).collect();
        let decisions = company.flag_sites(&candidates);
        // ceil(10 * 0.3) = 3, and they are the three highest rates.
        assert_eq!(decisions.len(), 3);
        let mut picked: Vec<usize> = decisions.iter().map(|d| d.site_idx).collect();
        picked.sort_unstable();
        assert_eq!(picked, vec![7, 8, 9]);
    }

    #[test]
    fn threshold_first_filters_before_proportion() {
        let mut company = screening_company(FollowUpParams {
            proportion: 0.5,
            threshold: FlagThreshold::Absolute(5.0),
            interaction: "threshold_first".to_string(),
            ..FollowUpParams::default()
        });
        let candidates: Vec<CandidateFlag> =
            (0..10).map(|i| candidate(i, (i + 1) as f64)).collect();
        // Threshold keeps rates 5..=10 (6 sites), proportion keeps top 3.
        let decisions = company.flag_sites(&candidates);
        assert_eq!(decisions.len(), 3);
    }

    #[test]
    fn proportion_first_can_yield_fewer_flags() {
        let mut company = screening_company(FollowUpParams {
            proportion: 0.5,
            threshold: FlagThreshold::Absolute(9.0),
            interaction: "proportion_first".to_string(),
            ..FollowUpParams::default()
        });
        let candidates: Vec<CandidateFlag> =
            (0..10).map(|i| candidate(i, (i + 1) as f64)).collect();
        // Proportion keeps top 5 (rates 6..=10), threshold then keeps 9, 10.
        let decisions = company.flag_sites(&candidates);
        assert_eq!(decisions.len(), 2);
    }

    #[test]
    fn repeat_count_gate_delays_flagging() {
        let mut company = screening_company(FollowUpParams {
            min_measurements: 2,
            ..FollowUpParams::default()
        });
        assert!(company.flag_sites(&[candidate(0, 3.0)]).is_empty());
        // Second measurement of the same site clears the gate.
        let decisions = company.flag_sites(&[candidate(0, 3.5)]);
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn instant_threshold_bypasses_repeat_gate() {
        let mut company = screening_company(FollowUpParams {
            min_measurements: 5,
            instant_threshold_g_per_sec: Some(10.0),
            ..FollowUpParams::default()
        });
        let decisions = company.flag_sites(&[candidate(0, 50.0)]);
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn venting_carried_diagnostic_is_set() {
        let mut company = screening_company(FollowUpParams {
            threshold: FlagThreshold::Absolute(2.0),
            ..FollowUpParams::default()
        });
        let mut c = candidate(0, 3.0);
        c.measured_sans_vent_g_per_sec = 1.0;
        let decisions = company.flag_sites(&[c]);
        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].venting_carried);
    }

    #[test]
    fn proportion_threshold_resolves_against_rate_distribution() {
        let mut params = MethodParams::screening("screen");
        params.follow_up = Some(FollowUpParams {
            threshold: FlagThreshold::Proportion(0.5),
            ..FollowUpParams::default()
        });
        let company = Company::build(
            MethodId(0),
            params,
            &RateDist::Lognormal(LognormalRate::new(0.0, 1.0)),
        )
        .expect("company builds");
        // Median of lognormal(mu = 0) is 1.
        assert!((company.threshold_g_per_sec() - 1.0).abs() < 1e-6);
    }

    fn lone_site(survey_mins: f64) -> SiteDay {
        let mut state = MethodSiteState::new(0, 0, survey_mins);
        state.days_since_last_survey = 30;
        SiteDay {
            entity: Entity::from_raw(1),
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

    #[test]
    fn resumed_rollover_site_is_closed_to_other_crews() {
        // Two crews, one site needing 1000 survey minutes against 480-minute
        // days. The crew that started the survey keeps it across days; the
        // other crew must never open a second survey of the same site.
        let mut params = MethodParams::component("ogi");
        params.n_crews = 2;
        params.max_workday_hours = 8.0;
        params.travel = TravelSpec::Empirical {
            samples_mins: vec![30.0],
        };
        let mut company = Company::build(
            MethodId(0),
            params,
            &RateDist::Lognormal(LognormalRate::new(0.0, 1.0)),
        )
        .expect("company builds");

        let weather = WeatherFields::uniform(1, 1, 10, 10.0, 2.0, 0.0);
        let mut grid_rng = StdRng::seed_from_u64(0);
        let grid =
            DeploymentGrid::build(&weather, &[(WeatherEnvelope::default(), None)], &mut grid_rng);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sites = vec![lone_site(1000.0)];

        company.deploy_crews(0, 24.0, &grid, &mut sites, None, &mut rng);
        let rollovers: Vec<_> = company
            .crews
            .iter()
            .filter_map(|c| c.rollover.as_ref())
            .collect();
        assert_eq!(rollovers.len(), 1);
        // 480 - 30 travel leaves 450 of the 1000 minutes done.
        assert!((rollovers[0].remaining_mins - 550.0).abs() < 1e-9);

        // Next day the idle crew scans the pool again.
        sites[0].state.attempted_today = false;
        sites[0].state.days_since_last_survey += 1;
        company.deploy_crews(1, 24.0, &grid, &mut sites, None, &mut rng);
        let rollovers: Vec<_> = company
            .crews
            .iter()
            .filter_map(|c| c.rollover.as_ref())
            .collect();
        assert_eq!(rollovers.len(), 1);
        assert!((rollovers[0].remaining_mins - 70.0).abs() < 1e-9);
        // The survey has completed zero times so far.
        assert_eq!(sites[0].state.surveys_done, 0);
    }

    #[test]
    fn workday_rejects_out_of_range_hours() {
        let mut params = MethodParams::component("ogi");
        params.max_workday_hours = 24.0;
        let err = Company::build(
            MethodId(0),
            params,
            &RateDist::Lognormal(LognormalRate::new(0.0, 1.0)),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::WorkdayOutOfRange { .. }));
    }

    #[test]
    fn routed_travel_without_home_bases_is_fatal() {
        let mut params = MethodParams::component("ogi");
        params.travel = TravelSpec::Routed {
            home_bases: Vec::new(),
            speed_kmh: 80.0,
        };
        let err = Company::build(
            MethodId(0),
            params,
            &RateDist::Lognormal(LognormalRate::new(0.0, 1.0)),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoHomeBase(_)));
    }

    #[test]
    fn daylight_bounds_the_workday() {
        let mut params = MethodParams::component("ogi");
        params.consider_daylight = true;
        params.max_workday_hours = 10.0;
        let company = Company::build(
            MethodId(0),
            params,
            &RateDist::Lognormal(LognormalRate::new(0.0, 1.0)),
        )
        .expect("company builds");
        assert_eq!(company.workday_minutes(6.0), 360.0);
        assert_eq!(company.workday_minutes(14.0), 600.0);
        assert_eq!(company.workday_minutes(0.0), 0.0);
    }
}
