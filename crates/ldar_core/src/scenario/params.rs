use crate::clock::SimDate;
use crate::distributions::{RateDist, VentingModel};
use crate::scheduling::travel::TravelSpec;
use crate::sensors::SensorSpec;
use crate::weather::{CoverageSampling, WeatherEnvelope};

use std::collections::HashMap;

/// What a method reports on: component-scale methods pinpoint and tag
/// individual leaks; site-scale methods can only flag the whole site for a
/// follow-up survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MethodScale {
    Component,
    Site,
}

/// Follow-up flagging threshold, resolved to an absolute g/s value once at
/// scenario build.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FlagThreshold {
    /// Fixed rate in g/s.
    Absolute(f64),
    /// Quantile of the program's leak-rate distribution (0..1).
    Proportion(f64),
}

/// How repeated watch-list measurements collapse into one effective rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RateAggregator {
    MostRecent,
    Maximum,
    Mean,
}

/// End-of-day triage policy for site-scale (screening) methods.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FollowUpParams {
    /// Share of surviving candidates flagged per day (top-N by rate).
    pub proportion: f64,
    /// Candidate/flagging threshold.
    pub threshold: FlagThreshold,
    /// Fast path: a measurement at or above this flags immediately,
    /// regardless of repeat count or proportion.
    pub instant_threshold_g_per_sec: Option<f64>,
    /// Minimum accumulated measurements before a site may be flagged.
    pub min_measurements: u32,
    pub aggregator: RateAggregator,
    /// Threshold/proportion interaction priority, resolved by name at build:
    /// `"threshold_first"` or `"proportion_first"`.
    pub interaction: String,
}

impl Default for FollowUpParams {
    fn default() -> Self {
        Self {
            proportion: 1.0,
            threshold: FlagThreshold::Absolute(0.0),
            instant_threshold_g_per_sec: None,
            min_measurements: 1,
            aggregator: RateAggregator::MostRecent,
            interaction: "threshold_first".to_string(),
        }
    }
}

/// Configuration of one detection method (one company).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodParams {
    pub name: String,
    pub sensor: SensorSpec,
    pub travel: TravelSpec,
    pub envelope: WeatherEnvelope,
    pub coverage: Option<CoverageSampling>,
    pub n_crews: usize,
    pub max_workday_hours: f64,
    /// Bound the workday by available daylight at the program latitude.
    pub consider_daylight: bool,
    /// Accrued per crew per worked day; idle days accrue nothing.
    pub cost_per_day: f64,
    /// Accrued per completed site visit.
    pub cost_per_site: f64,
    /// Days between a crew tagging a leak and the repair timer starting.
    pub reporting_delay_days: u32,
    pub min_interval_days: u32,
    /// 0 = unlimited surveys per year.
    pub required_surveys_per_year: u32,
    pub survey_minutes: f64,
    /// Follow-up methods survey only currently flagged sites.
    pub is_follow_up: bool,
    pub scale: MethodScale,
    /// Required for site-scale methods; ignored for component scale.
    pub follow_up: Option<FollowUpParams>,
}

impl MethodParams {
    /// A component-scale baseline method (e.g. an OGI crew on a fixed
    /// schedule) with conservative defaults; tests and fixtures tweak from
    /// here.
    pub fn component(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sensor: SensorSpec::threshold(0.01),
            travel: TravelSpec::Empirical {
                samples_mins: vec![30.0],
            },
            envelope: WeatherEnvelope::default(),
            coverage: None,
            n_crews: 1,
            max_workday_hours: 8.0,
            consider_daylight: false,
            cost_per_day: 2500.0,
            cost_per_site: 0.0,
            reporting_delay_days: 2,
            min_interval_days: 0,
            required_surveys_per_year: 0,
            survey_minutes: 120.0,
            is_follow_up: false,
            scale: MethodScale::Component,
            follow_up: None,
        }
    }

    /// A site-scale screening method that produces follow-up flags.
    pub fn screening(name: &str) -> Self {
        Self {
            scale: MethodScale::Site,
            follow_up: Some(FollowUpParams::default()),
            survey_minutes: 20.0,
            ..Self::component(name)
        }
    }

    /// A component-scale follow-up method serving flagged sites.
    pub fn follow_up(name: &str) -> Self {
        Self {
            is_follow_up: true,
            ..Self::component(name)
        }
    }
}

/// Program-wide (method-independent) parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProgramParams {
    /// Daily per-site Bernoulli probability of a new leak.
    pub leak_production_rate: f64,
    pub rate_dist: RateDist,
    /// Days from tag to repair eligibility (added to the tagging company's
    /// reporting delay).
    pub repair_delay_days: u32,
    pub repair_cost: f64,
    pub verification_cost: f64,
    /// Days an emitting leak survives before operator/venting processes tag
    /// it regardless of any program.
    pub natural_discovery_days: u32,
    pub venting: Option<VentingModel>,
}

impl Default for ProgramParams {
    fn default() -> Self {
        Self {
            leak_production_rate: 0.0065,
            rate_dist: RateDist::Lognormal(crate::distributions::LognormalRate::new(-2.4, 1.9)),
            repair_delay_days: 14,
            repair_cost: 200.0,
            verification_cost: 100.0,
            natural_discovery_days: 365,
            venting: None,
        }
    }
}

/// One input site row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SiteRecord {
    pub facility_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Optional pre-generated leak timeline: new-leak rates (g/s) keyed by
    /// timestep. Replaces the Bernoulli draw for this site when present.
    pub leak_timeline: Option<HashMap<u32, Vec<f64>>>,
}

impl SiteRecord {
    pub fn new(facility_id: &str, lat: f64, lon: f64) -> Self {
        Self {
            facility_id: facility_id.to_string(),
            lat,
            lon,
            leak_timeline: None,
        }
    }
}

/// Everything needed to build one simulation instance.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub seed: u64,
    pub start_date: SimDate,
    pub total_days: u32,
    pub program: ProgramParams,
    pub methods: Vec<MethodParams>,
    pub sites: Vec<SiteRecord>,
}

impl ScenarioParams {
    pub fn new(start_date: SimDate, total_days: u32) -> Self {
        Self {
            seed: 0,
            start_date,
            total_days,
            program: ProgramParams::default(),
            methods: Vec::new(),
            sites: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_method(mut self, method: MethodParams) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_sites(mut self, sites: Vec<SiteRecord>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_program(mut self, program: ProgramParams) -> Self {
        self.program = program;
        self
    }
}
