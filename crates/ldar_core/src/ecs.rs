use std::collections::HashMap;

use bevy_ecs::prelude::{Component, Entity, Resource};

/// Index of a detection method in `ScenarioParams::methods`. Stable for the
/// whole run; companies, site state maps and telemetry rows key on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub usize);

/// Leak lifecycle. Transitions are one-way: Active -> Tagged -> Repaired,
/// or Active -> Tagged(Natural) -> Repaired within the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeakStatus {
    Active,
    Tagged,
    Repaired,
}

/// Who tagged a leak for repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    /// Operator/venting discovery after the natural-discovery threshold.
    Natural,
    /// A company crew tagged this leak on a site visit.
    Company { method: MethodId, crew: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Leak {
    pub site: Entity,
    /// True emission rate in grams per second. Converted to kg/day only at
    /// the reporting/repair boundary (x 86.4).
    pub rate_g_per_sec: f64,
    pub status: LeakStatus,
    pub days_active: u32,
    pub tagged_by: Option<TagSource>,
    /// Timestep index when tagged / repaired.
    pub date_tagged: Option<u32>,
    pub date_repaired: Option<u32>,
    /// Days from tagging until repair eligibility, excluding the tagging
    /// company's reporting delay.
    pub repair_delay_days: u32,
}

impl Leak {
    pub fn new_active(site: Entity, rate_g_per_sec: f64, repair_delay_days: u32) -> Self {
        Self {
            site,
            rate_g_per_sec,
            status: LeakStatus::Active,
            days_active: 0,
            tagged_by: None,
            date_tagged: None,
            date_repaired: None,
            repair_delay_days,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == LeakStatus::Active
    }
}

/// Static site attributes, fixed at scenario build.
#[derive(Debug, Clone, Component)]
pub struct Site {
    pub facility_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Resolved weather-grid cell indices (longitude, latitude).
    pub grid_xi: usize,
    pub grid_yi: usize,
}

/// Per-method dynamic survey state for one site.
#[derive(Debug, Clone, Copy)]
pub struct MethodSiteState {
    pub days_since_last_survey: u32,
    pub surveys_done: u32,
    pub surveys_this_year: u32,
    pub attempted_today: bool,
    /// Minimum days between surveys by this method.
    pub min_interval_days: u32,
    /// Required surveys per calendar year; once met, the site is skipped.
    pub required_surveys_per_year: u32,
    /// On-site survey time in minutes.
    pub survey_minutes: f64,
    pub missed_leaks: u32,
}

impl MethodSiteState {
    pub fn new(min_interval_days: u32, required_surveys_per_year: u32, survey_minutes: f64) -> Self {
        Self {
            // Every site starts maximally neglected so first-year scheduling
            // is not gated by the minimum interval.
            days_since_last_survey: min_interval_days,
            surveys_done: 0,
            surveys_this_year: 0,
            attempted_today: false,
            min_interval_days,
            required_surveys_per_year,
            survey_minutes,
            missed_leaks: 0,
        }
    }
}

/// Map of per-method survey state, one entry per configured method.
#[derive(Debug, Clone, Default, Component)]
pub struct MethodStates(pub HashMap<MethodId, MethodSiteState>);

impl MethodStates {
    pub fn get(&self, method: MethodId) -> &MethodSiteState {
        self.0.get(&method).expect("method state missing for site")
    }

    pub fn get_mut(&mut self, method: MethodId) -> &mut MethodSiteState {
        self.0
            .get_mut(&method)
            .expect("method state missing for site")
    }
}

/// Cross-method follow-up flag state. At most one outstanding flag per site;
/// repeat candidates only bump `redundant_flags`.
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct FlagState {
    pub flagged: bool,
    pub flagged_by: Option<MethodId>,
    pub date_flagged: Option<u32>,
    pub redundant_flags: u32,
}

impl FlagState {
    /// Raise the flag if not already raised. Returns false (and counts a
    /// redundant flag) when the site is already flagged.
    pub fn raise(&mut self, method: MethodId, day: u32) -> bool {
        if self.flagged {
            self.redundant_flags += 1;
            return false;
        }
        self.flagged = true;
        self.flagged_by = Some(method);
        self.date_flagged = Some(day);
        true
    }

    /// Clear a served flag after a completed follow-up visit.
    pub fn clear(&mut self) {
        self.flagged = false;
        self.flagged_by = None;
        self.date_flagged = None;
    }
}

/// Pre-generated leak timeline for a site: new-leak rates (g/s) keyed by
/// timestep index. When present, replaces the Bernoulli draw for that site.
#[derive(Debug, Clone, Default, Component)]
pub struct LeakSchedule {
    pub by_day: HashMap<u32, Vec<f64>>,
}

/// Site entities in input-row order. Candidate ranking sorts stably over this
/// order so ties on neglect reproduce the pre-shuffled legacy behaviour.
#[derive(Debug, Default, Resource)]
pub struct SiteRoster(pub Vec<Entity>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_raise_is_exclusive() {
        let mut flag = FlagState::default();
        assert!(flag.raise(MethodId(0), 5));
        assert_eq!(flag.date_flagged, Some(5));
        assert_eq!(flag.flagged_by, Some(MethodId(0)));

        // Second candidate is redundant and must not overwrite provenance.
        assert!(!flag.raise(MethodId(1), 9));
        assert_eq!(flag.redundant_flags, 1);
        assert_eq!(flag.date_flagged, Some(5));
        assert_eq!(flag.flagged_by, Some(MethodId(0)));
    }

    #[test]
    fn new_site_state_starts_due() {
        let state = MethodSiteState::new(30, 2, 120.0);
        assert_eq!(state.days_since_last_survey, 30);
        assert_eq!(state.surveys_this_year, 0);
        assert!(!state.attempted_today);
    }
}
