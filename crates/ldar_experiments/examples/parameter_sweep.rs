//! Example: sweep crew counts and survey intervals for one program.
//!
//! This example demonstrates how to:
//! 1. Define a parameter space around a base scenario
//! 2. Run the combinations in parallel with a progress bar
//! 3. Pick the cheapest configuration per kilogram of methane mitigated
//! 4. Export the full result table to CSV

use ldar_core::test_helpers::{calm_weather, test_params};
use ldar_experiments::{export_to_csv, run_parallel_experiments_with_progress, ParameterSpace};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("Starting parameter sweep experiment...");

    let days = 365;
    let space = ParameterSpace::grid(test_params(days, 50), calm_weather(days as usize))
        .experiment_id("crew_interval_sweep")
        .seeds(vec![1, 2, 3])
        .n_crews(vec![1, 2, 4])
        .min_interval_days(vec![0, 30, 90]);

    println!("Generating parameter sets...");
    let parameter_sets = space.generate();
    println!("Generated {} parameter combinations", parameter_sets.len());

    println!("Running simulations in parallel...");
    let results = run_parallel_experiments_with_progress(parameter_sets, None, true);
    println!("Completed {} simulations", results.len());

    let best = results
        .iter()
        .filter(|r| r.mitigated_emissions_kg > 0.0)
        .min_by(|a, b| a.cost_per_mitigated_kg.total_cmp(&b.cost_per_mitigated_kg))
        .expect("no run mitigated any emissions");

    println!("\n=== Best Configuration ===");
    println!("Crews: {}", best.n_crews);
    println!("Survey interval: {} days", best.min_interval_days);
    println!("Seed: {}", best.seed);
    println!("Total emissions: {:.1} kg", best.total_emissions_kg);
    println!("Mitigated emissions: {:.1} kg", best.mitigated_emissions_kg);
    println!("Total cost: ${:.2}", best.total_cost);
    println!("Cost per mitigated kg: ${:.2}", best.cost_per_mitigated_kg);
    println!("Repairs: {}", best.repaired_total);

    println!("\nExporting results...");
    export_to_csv(&results, "experiment_results.csv")?;
    println!("Exported to experiment_results.csv");

    println!("\nExperiment complete!");

    Ok(())
}
