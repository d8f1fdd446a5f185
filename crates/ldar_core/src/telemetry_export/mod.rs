//! Parquet export of simulation outputs: the program and per-method daily
//! time series plus the final leak table.

pub mod leaks;
pub mod sites;
pub mod timeseries;
mod utils;

pub use leaks::write_leaks_parquet;
pub use sites::write_sites_parquet;
pub use timeseries::{write_method_timeseries_parquet, write_program_timeseries_parquet};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{run_to_end, simulation_schedule};
    use crate::test_helpers::{create_test_world, test_params};

    #[test]
    fn exports_write_non_empty_files() {
        let params = test_params(10, 3);
        let mut world = create_test_world(&params);
        let mut schedule = simulation_schedule();
        run_to_end(&mut world, &mut schedule);

        let dir = tempfile::tempdir().expect("tempdir");
        let program = dir.path().join("program.parquet");
        let methods = dir.path().join("methods.parquet");
        let leaks = dir.path().join("leaks.parquet");
        let sites = dir.path().join("sites.parquet");

        {
            let telemetry = world.resource::<crate::telemetry::SimTelemetry>();
            write_program_timeseries_parquet(&program, telemetry).expect("program export");
            write_method_timeseries_parquet(&methods, telemetry).expect("method export");
        }
        write_leaks_parquet(&leaks, &mut world).expect("leak export");
        write_sites_parquet(&sites, &mut world).expect("site export");

        for path in [&program, &methods, &leaks, &sites] {
            let meta = std::fs::metadata(path).expect("exported file exists");
            assert!(meta.len() > 0, "{path:?} should not be empty");
        }
    }
}
