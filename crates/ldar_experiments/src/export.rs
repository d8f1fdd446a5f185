//! Sweep result export: CSV for quick inspection, JSON for pipelines,
//! Parquet for analysis notebooks.

use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::metrics::SimulationResult;

/// One CSV row per run, parameters and metrics side by side.
pub fn export_to_csv(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}

/// All runs as one JSON array.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// All runs as one Parquet record batch.
pub fn export_to_parquet(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    if results.is_empty() {
        return Err("no results to export".into());
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("experiment_id", DataType::Utf8, false),
        Field::new("run_id", DataType::UInt64, false),
        Field::new("seed", DataType::UInt64, false),
        Field::new("leak_production_rate", DataType::Float64, false),
        Field::new("n_crews", DataType::UInt64, false),
        Field::new("min_interval_days", DataType::UInt32, false),
        Field::new("follow_up_proportion", DataType::Float64, true),
        Field::new("days", DataType::UInt64, false),
        Field::new("total_emissions_kg", DataType::Float64, false),
        Field::new("mean_daily_emissions_kg", DataType::Float64, false),
        Field::new("mitigated_emissions_kg", DataType::Float64, false),
        Field::new("mean_active_leaks", DataType::Float64, false),
        Field::new("peak_active_leaks", DataType::UInt32, false),
        Field::new("new_leaks_total", DataType::UInt32, false),
        Field::new("tags_total", DataType::UInt32, false),
        Field::new("repaired_total", DataType::UInt32, false),
        Field::new("natural_repairs", DataType::UInt32, false),
        Field::new("sites_visited_total", DataType::UInt64, false),
        Field::new("flags_raised_total", DataType::UInt32, false),
        Field::new("total_cost", DataType::Float64, false),
        Field::new("cost_per_repair", DataType::Float64, false),
        Field::new("cost_per_mitigated_kg", DataType::Float64, false),
    ]));

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            results
                .iter()
                .map(|r| r.experiment_id.as_str())
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results.iter().map(|r| r.run_id as u64).collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results.iter().map(|r| r.seed).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.leak_production_rate)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results.iter().map(|r| r.n_crews as u64).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results
                .iter()
                .map(|r| r.min_interval_days)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.follow_up_proportion)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results.iter().map(|r| r.days as u64).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.total_emissions_kg)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.mean_daily_emissions_kg)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.mitigated_emissions_kg)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.mean_active_leaks)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results
                .iter()
                .map(|r| r.peak_active_leaks)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results
                .iter()
                .map(|r| r.new_leaks_total)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results.iter().map(|r| r.tags_total).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results.iter().map(|r| r.repaired_total).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results
                .iter()
                .map(|r| r.natural_repairs)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.sites_visited_total)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            results
                .iter()
                .map(|r| r.flags_raised_total)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.total_cost).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.cost_per_repair)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.cost_per_mitigated_kg)
                .collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterSpace;
    use crate::runner::run_parallel_experiments_with_progress;
    use ldar_core::test_helpers::{calm_weather, test_params};

    fn small_results() -> Vec<SimulationResult> {
        let sets = ParameterSpace::grid(test_params(5, 2), calm_weather(5))
            .seeds(vec![1, 2])
            .generate();
        run_parallel_experiments_with_progress(sets, None, false)
    }

    #[test]
    fn csv_and_json_exports_round_trip_row_counts() {
        let results = small_results();
        let dir = tempfile::tempdir().expect("tempdir");

        let csv_path = dir.path().join("results.csv");
        export_to_csv(&results, &csv_path).expect("csv export");
        let contents = std::fs::read_to_string(&csv_path).expect("csv readable");
        // Header plus one line per run.
        assert_eq!(contents.lines().count(), results.len() + 1);

        let json_path = dir.path().join("results.json");
        export_to_json(&results, &json_path).expect("json export");
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).expect("json readable"))
                .expect("valid json");
        assert_eq!(parsed.as_array().map(|a| a.len()), Some(results.len()));
    }

    #[test]
    fn parquet_export_writes_a_file() {
        let results = small_results();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.parquet");
        export_to_parquet(&results, &path).expect("parquet export");
        assert!(std::fs::metadata(&path).expect("file exists").len() > 0);
    }

    #[test]
    fn parquet_export_rejects_empty_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(export_to_parquet(&[], dir.path().join("empty.parquet")).is_err());
    }
}
