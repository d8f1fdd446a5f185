use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use bevy_ecs::prelude::{Entity, World};

use crate::ecs::{FlagState, MethodStates, Site};

use super::utils::{f64_field, u32_field, u64_field, write_record_batch};

/// Final per-site survey state, one row per (site, method) pair.
pub fn write_sites_parquet<P: AsRef<Path>>(
    path: P,
    world: &mut World,
) -> Result<(), Box<dyn Error>> {
    let mut query = world.query::<(Entity, &Site, &MethodStates, &FlagState)>();

    let mut site_entity = Vec::new();
    let mut facility_id = Vec::new();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    let mut method = Vec::new();
    let mut surveys_done = Vec::new();
    let mut missed_leaks = Vec::new();
    let mut days_since_last_survey = Vec::new();
    let mut flagged = Vec::new();
    let mut redundant_flags = Vec::new();

    for (entity, site, states, flag) in query.iter(world) {
        // Stable method order within a site.
        let mut method_ids: Vec<_> = states.0.keys().copied().collect();
        method_ids.sort();
        for method_id in method_ids {
            let state = states.get(method_id);
            site_entity.push(entity.to_bits());
            facility_id.push(site.facility_id.clone());
            lat.push(site.lat);
            lon.push(site.lon);
            method.push(method_id.0 as u64);
            surveys_done.push(state.surveys_done);
            missed_leaks.push(state.missed_leaks);
            days_since_last_survey.push(state.days_since_last_survey);
            flagged.push(flag.flagged);
            redundant_flags.push(flag.redundant_flags);
        }
    }

    let schema = Schema::new(vec![
        u64_field("site_entity"),
        Field::new("facility_id", DataType::Utf8, false),
        f64_field("lat"),
        f64_field("lon"),
        u64_field("method"),
        u32_field("surveys_done"),
        u32_field("missed_leaks"),
        u32_field("days_since_last_survey"),
        Field::new("flagged", DataType::Boolean, false),
        u32_field("redundant_flags"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(site_entity)),
        Arc::new(StringArray::from(facility_id)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(lon)),
        Arc::new(UInt64Array::from(method)),
        Arc::new(UInt32Array::from(surveys_done)),
        Arc::new(UInt32Array::from(missed_leaks)),
        Arc::new(UInt32Array::from(days_since_last_survey)),
        Arc::new(BooleanArray::from(flagged)),
        Arc::new(UInt32Array::from(redundant_flags)),
    ];

    write_record_batch(path, schema, arrays)
}
