use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::telemetry::SimTelemetry;

use super::utils::{f64_field, u32_field, u64_field, write_record_batch};

/// One row per simulated day: the program-wide time series.
pub fn write_program_timeseries_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &SimTelemetry,
) -> Result<(), Box<dyn Error>> {
    let rows = &telemetry.program_rows;
    let mut day = Vec::with_capacity(rows.len());
    let mut new_leaks = Vec::with_capacity(rows.len());
    let mut active_leaks = Vec::with_capacity(rows.len());
    let mut daily_emissions_kg = Vec::with_capacity(rows.len());
    let mut tags_today = Vec::with_capacity(rows.len());
    let mut tags_total = Vec::with_capacity(rows.len());
    let mut redundant_tags = Vec::with_capacity(rows.len());
    let mut repairs_today = Vec::with_capacity(rows.len());
    let mut cum_repaired = Vec::with_capacity(rows.len());
    let mut daily_cost = Vec::with_capacity(rows.len());
    let mut cum_cost = Vec::with_capacity(rows.len());

    for row in rows {
        day.push(row.day);
        new_leaks.push(row.new_leaks);
        active_leaks.push(row.active_leaks);
        daily_emissions_kg.push(row.daily_emissions_kg);
        tags_today.push(row.tags_today);
        tags_total.push(row.tags_total);
        redundant_tags.push(row.redundant_tags);
        repairs_today.push(row.repairs_today);
        cum_repaired.push(row.cum_repaired);
        daily_cost.push(row.daily_cost);
        cum_cost.push(row.cum_cost);
    }

    let schema = Schema::new(vec![
        u32_field("day"),
        u32_field("new_leaks"),
        u32_field("active_leaks"),
        f64_field("daily_emissions_kg"),
        u32_field("tags_today"),
        u32_field("tags_total"),
        u32_field("redundant_tags"),
        u32_field("repairs_today"),
        u32_field("cum_repaired"),
        f64_field("daily_cost"),
        f64_field("cum_cost"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(day)),
        Arc::new(UInt32Array::from(new_leaks)),
        Arc::new(UInt32Array::from(active_leaks)),
        Arc::new(Float64Array::from(daily_emissions_kg)),
        Arc::new(UInt32Array::from(tags_today)),
        Arc::new(UInt32Array::from(tags_total)),
        Arc::new(UInt32Array::from(redundant_tags)),
        Arc::new(UInt32Array::from(repairs_today)),
        Arc::new(UInt32Array::from(cum_repaired)),
        Arc::new(Float64Array::from(daily_cost)),
        Arc::new(Float64Array::from(cum_cost)),
    ];

    write_record_batch(path, schema, arrays)
}

/// One row per (method, day): crew activity, flags and costs.
pub fn write_method_timeseries_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &SimTelemetry,
) -> Result<(), Box<dyn Error>> {
    let rows = &telemetry.method_rows;
    let mut day = Vec::with_capacity(rows.len());
    let mut method = Vec::with_capacity(rows.len());
    let mut deployed_crews = Vec::with_capacity(rows.len());
    let mut sites_visited = Vec::with_capacity(rows.len());
    let mut travel_mins = Vec::with_capacity(rows.len());
    let mut survey_mins = Vec::with_capacity(rows.len());
    let mut flags_raised = Vec::with_capacity(rows.len());
    let mut redundant_flags = Vec::with_capacity(rows.len());
    let mut redundant_tags = Vec::with_capacity(rows.len());
    let mut missed_leaks = Vec::with_capacity(rows.len());
    let mut flags_venting_dependent = Vec::with_capacity(rows.len());
    let mut prop_sites_available = Vec::with_capacity(rows.len());
    let mut cost = Vec::with_capacity(rows.len());

    for row in rows {
        day.push(row.day);
        method.push(row.method as u64);
        deployed_crews.push(row.deployed_crews as u64);
        sites_visited.push(row.sites_visited as u64);
        travel_mins.push(row.travel_mins);
        survey_mins.push(row.survey_mins);
        flags_raised.push(row.flags_raised);
        redundant_flags.push(row.redundant_flags);
        redundant_tags.push(row.redundant_tags);
        missed_leaks.push(row.missed_leaks);
        flags_venting_dependent.push(row.flags_venting_dependent);
        prop_sites_available.push(row.prop_sites_available);
        cost.push(row.cost);
    }

    let schema = Schema::new(vec![
        u32_field("day"),
        u64_field("method"),
        u64_field("deployed_crews"),
        u64_field("sites_visited"),
        f64_field("travel_mins"),
        f64_field("survey_mins"),
        u32_field("flags_raised"),
        u32_field("redundant_flags"),
        u32_field("redundant_tags"),
        u32_field("missed_leaks"),
        u32_field("flags_venting_dependent"),
        f64_field("prop_sites_available"),
        f64_field("cost"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(day)),
        Arc::new(UInt64Array::from(method)),
        Arc::new(UInt64Array::from(deployed_crews)),
        Arc::new(UInt64Array::from(sites_visited)),
        Arc::new(Float64Array::from(travel_mins)),
        Arc::new(Float64Array::from(survey_mins)),
        Arc::new(UInt32Array::from(flags_raised)),
        Arc::new(UInt32Array::from(redundant_flags)),
        Arc::new(UInt32Array::from(redundant_tags)),
        Arc::new(UInt32Array::from(missed_leaks)),
        Arc::new(UInt32Array::from(flags_venting_dependent)),
        Arc::new(Float64Array::from(prop_sites_available)),
        Arc::new(Float64Array::from(cost)),
    ];

    write_record_batch(path, schema, arrays)
}
