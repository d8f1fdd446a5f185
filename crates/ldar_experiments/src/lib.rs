//! Parallel experimentation over LDAR program configurations.
//!
//! This crate sweeps program parameters (seeds for Monte Carlo replicates,
//! leak production rates, crew counts, survey intervals, follow-up
//! proportions), runs the simulations in parallel, extracts per-run summary
//! metrics and exports them for analysis.
//!
//! # Quick Start
//!
//! ```no_run
//! use ldar_core::test_helpers::{calm_weather, test_params};
//! use ldar_experiments::{run_parallel_experiments, ParameterSpace};
//!
//! let base = test_params(365, 20);
//! let weather = calm_weather(365);
//!
//! let sets = ParameterSpace::grid(base, weather)
//!     .seeds(vec![1, 2, 3, 4, 5])
//!     .n_crews(vec![1, 2, 4])
//!     .generate();
//!
//! let results = run_parallel_experiments(sets, None);
//! ```

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;

pub use export::{export_to_csv, export_to_json, export_to_parquet};
pub use metrics::{extract_metrics, SimulationResult};
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{
    run_parallel_experiments, run_parallel_experiments_with_progress, run_single_simulation,
};
