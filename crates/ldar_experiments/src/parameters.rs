//! Parameter space definition for simulation sweeps.
//!
//! A [ParameterSpace] starts from one base scenario and lists the values to
//! vary on each axis; [ParameterSpace::generate] takes the Cartesian product
//! and yields one [ParameterSet] per combination. Empty axes fall back to
//! the base scenario's value, so a seeds-only sweep is just
//! `space.seeds(vec![1, 2, 3]).generate()`.

use std::sync::Arc;

use ldar_core::scenario::ScenarioParams;
use ldar_core::weather::WeatherFields;

/// One runnable parameter combination.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub leak_production_rate: f64,
    pub n_crews: usize,
    pub min_interval_days: u32,
    pub follow_up_proportion: Option<f64>,
    params: ScenarioParams,
    weather: Arc<WeatherFields>,
}

impl ParameterSet {
    pub fn scenario_params(&self) -> ScenarioParams {
        self.params.clone()
    }

    pub fn weather(&self) -> &WeatherFields {
        &self.weather
    }
}

/// A grid of scenario variations around one base scenario.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: ScenarioParams,
    weather: Arc<WeatherFields>,
    experiment_id: String,
    seeds: Vec<u64>,
    leak_production_rates: Vec<f64>,
    n_crews: Vec<usize>,
    min_interval_days: Vec<u32>,
    follow_up_proportions: Vec<f64>,
}

impl ParameterSpace {
    pub fn grid(base: ScenarioParams, weather: WeatherFields) -> Self {
        Self {
            base,
            weather: Arc::new(weather),
            experiment_id: "experiment".to_string(),
            seeds: Vec::new(),
            leak_production_rates: Vec::new(),
            n_crews: Vec::new(),
            min_interval_days: Vec::new(),
            follow_up_proportions: Vec::new(),
        }
    }

    pub fn experiment_id(mut self, id: &str) -> Self {
        self.experiment_id = id.to_string();
        self
    }

    /// Monte Carlo replicates: one run per seed.
    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn leak_production_rates(mut self, rates: Vec<f64>) -> Self {
        self.leak_production_rates = rates;
        self
    }

    /// Crew counts, applied to every configured method.
    pub fn n_crews(mut self, crews: Vec<usize>) -> Self {
        self.n_crews = crews;
        self
    }

    /// Minimum survey intervals, applied to every configured method.
    pub fn min_interval_days(mut self, days: Vec<u32>) -> Self {
        self.min_interval_days = days;
        self
    }

    /// Follow-up proportions, applied to methods that have a follow-up
    /// policy; component-only scenarios ignore this axis.
    pub fn follow_up_proportions(mut self, proportions: Vec<f64>) -> Self {
        self.follow_up_proportions = proportions;
        self
    }

    /// Expand the grid into runnable parameter sets.
    pub fn generate(&self) -> Vec<ParameterSet> {
        let seeds = non_empty(&self.seeds, self.base.seed);
        let rates = non_empty(
            &self.leak_production_rates,
            self.base.program.leak_production_rate,
        );
        let base_crews = self.base.methods.first().map(|m| m.n_crews).unwrap_or(1);
        let crews = non_empty(&self.n_crews, base_crews);
        let base_interval = self
            .base
            .methods
            .first()
            .map(|m| m.min_interval_days)
            .unwrap_or(0);
        let intervals = non_empty(&self.min_interval_days, base_interval);
        let proportions: Vec<Option<f64>> = if self.follow_up_proportions.is_empty() {
            vec![None]
        } else {
            self.follow_up_proportions.iter().copied().map(Some).collect()
        };

        let mut sets = Vec::new();
        for &seed in &seeds {
            for &rate in &rates {
                for &n_crews in &crews {
                    for &interval in &intervals {
                        for &proportion in &proportions {
                            let mut params = self.base.clone();
                            params.seed = seed;
                            params.program.leak_production_rate = rate;
                            for method in &mut params.methods {
                                method.n_crews = n_crews;
                                method.min_interval_days = interval;
                                if let (Some(p), Some(follow_up)) =
                                    (proportion, method.follow_up.as_mut())
                                {
                                    follow_up.proportion = p;
                                }
                            }
                            sets.push(ParameterSet {
                                experiment_id: self.experiment_id.clone(),
                                run_id: sets.len(),
                                seed,
                                leak_production_rate: rate,
                                n_crews,
                                min_interval_days: interval,
                                follow_up_proportion: proportion,
                                params,
                                weather: Arc::clone(&self.weather),
                            });
                        }
                    }
                }
            }
        }
        sets
    }
}

fn non_empty<T: Copy>(values: &[T], fallback: T) -> Vec<T> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldar_core::test_helpers::{calm_weather, test_params};

    #[test]
    fn empty_axes_produce_the_base_scenario() {
        let space = ParameterSpace::grid(test_params(10, 2), calm_weather(10));
        let sets = space.generate();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].seed, 7);
        assert_eq!(sets[0].run_id, 0);
    }

    #[test]
    fn grid_takes_the_cartesian_product() {
        let space = ParameterSpace::grid(test_params(10, 2), calm_weather(10))
            .seeds(vec![1, 2, 3])
            .n_crews(vec![1, 2])
            .min_interval_days(vec![0, 30]);
        let sets = space.generate();
        assert_eq!(sets.len(), 12);
        // run_id is the generation index.
        for (i, set) in sets.iter().enumerate() {
            assert_eq!(set.run_id, i);
        }
    }

    #[test]
    fn overrides_land_in_the_scenario_params() {
        let space = ParameterSpace::grid(test_params(10, 2), calm_weather(10))
            .seeds(vec![99])
            .leak_production_rates(vec![0.02])
            .n_crews(vec![5]);
        let sets = space.generate();
        let params = sets[0].scenario_params();
        assert_eq!(params.seed, 99);
        assert_eq!(params.program.leak_production_rate, 0.02);
        assert_eq!(params.methods[0].n_crews, 5);
    }
}
