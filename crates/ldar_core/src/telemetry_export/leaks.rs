use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::Schema;
use bevy_ecs::prelude::{Entity, World};

use crate::ecs::{Leak, TagSource};

use super::utils::{
    f64_field, leak_status_code, nullable_u32_field, nullable_u8_field, tag_source_code, u32_field,
    u64_field, u8_field, write_record_batch,
};

/// Final per-leak state at end of run, one row per leak ever spawned.
pub fn write_leaks_parquet<P: AsRef<Path>>(
    path: P,
    world: &mut World,
) -> Result<(), Box<dyn Error>> {
    let mut query = world.query::<(Entity, &Leak)>();
    let rows: Vec<(Entity, Leak)> = query.iter(world).map(|(e, l)| (e, *l)).collect();

    let mut leak_entity = Vec::with_capacity(rows.len());
    let mut site_entity = Vec::with_capacity(rows.len());
    let mut rate_g_per_sec = Vec::with_capacity(rows.len());
    let mut status = Vec::with_capacity(rows.len());
    let mut days_active = Vec::with_capacity(rows.len());
    let mut date_tagged = Vec::with_capacity(rows.len());
    let mut date_repaired = Vec::with_capacity(rows.len());
    let mut tag_source = Vec::with_capacity(rows.len());
    let mut tag_method = Vec::with_capacity(rows.len());
    let mut tag_crew = Vec::with_capacity(rows.len());

    for (entity, leak) in &rows {
        leak_entity.push(entity.to_bits());
        site_entity.push(leak.site.to_bits());
        rate_g_per_sec.push(leak.rate_g_per_sec);
        status.push(leak_status_code(leak.status));
        days_active.push(leak.days_active);
        date_tagged.push(leak.date_tagged);
        date_repaired.push(leak.date_repaired);
        tag_source.push(leak.tagged_by.map(tag_source_code));
        match leak.tagged_by {
            Some(TagSource::Company { method, crew }) => {
                tag_method.push(Some(method.0 as u32));
                tag_crew.push(Some(crew as u32));
            }
            _ => {
                tag_method.push(None);
                tag_crew.push(None);
            }
        }
    }

    let schema = Schema::new(vec![
        u64_field("leak_entity"),
        u64_field("site_entity"),
        f64_field("rate_g_per_sec"),
        u8_field("status"),
        u32_field("days_active"),
        nullable_u32_field("date_tagged"),
        nullable_u32_field("date_repaired"),
        nullable_u8_field("tag_source"),
        nullable_u32_field("tag_method"),
        nullable_u32_field("tag_crew"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(leak_entity)),
        Arc::new(UInt64Array::from(site_entity)),
        Arc::new(Float64Array::from(rate_g_per_sec)),
        Arc::new(UInt8Array::from(status)),
        Arc::new(UInt32Array::from(days_active)),
        Arc::new(UInt32Array::from(date_tagged)),
        Arc::new(UInt32Array::from(date_repaired)),
        Arc::new(UInt8Array::from(tag_source)),
        Arc::new(UInt32Array::from(tag_method)),
        Arc::new(UInt32Array::from(tag_crew)),
    ];

    write_record_batch(path, schema, arrays)
}
