//! Ephemeral per-crew, per-day itinerary records.

use bevy_ecs::prelude::Entity;

/// One planned stop in a crew's day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanEntry {
    pub site: Entity,
    /// False when the stop was abandoned (weather or budget).
    pub go: bool,
    pub travel_to_mins: f64,
    pub survey_mins: f64,
    pub travel_home_mins: f64,
    /// Survey minutes still owed when the day ended mid-visit; zero for a
    /// completed stop.
    pub remaining_mins: f64,
}

/// A crew's executed itinerary for one day. Built fresh each morning; the
/// only thing that survives the day is a [Rollover].
#[derive(Debug, Clone, Default)]
pub struct SurveyPlan {
    pub entries: Vec<PlanEntry>,
    pub budget_mins: f64,
    pub consumed_mins: f64,
}

impl SurveyPlan {
    pub fn new(budget_mins: f64) -> Self {
        Self {
            entries: Vec::new(),
            budget_mins,
            consumed_mins: 0.0,
        }
    }

    pub fn remaining_mins(&self) -> f64 {
        (self.budget_mins - self.consumed_mins).max(0.0)
    }

    pub fn consume(&mut self, mins: f64) {
        self.consumed_mins += mins;
        debug_assert!(
            self.consumed_mins <= self.budget_mins + 1e-6,
            "itinerary overran its day budget"
        );
    }

    /// Number of completed site visits (full surveys) in this plan.
    pub fn completed_visits(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.go && e.remaining_mins == 0.0)
            .count()
    }
}

/// A survey left unfinished at day's end. The same crew resumes this site
/// first on its next working day, with no new travel-to time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rollover {
    pub site: Entity,
    pub remaining_mins: f64,
}
