use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::ecs::{LeakStatus, TagSource};

pub(super) const TAG_NATURAL: u8 = 0;
pub(super) const TAG_COMPANY: u8 = 1;

pub(super) fn u32_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt32, false)
}

pub(super) fn nullable_u32_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt32, true)
}

pub(super) fn u64_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt64, false)
}

pub(super) fn u8_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt8, false)
}

pub(super) fn nullable_u8_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt8, true)
}

pub(super) fn f64_field(name: &'static str) -> Field {
    Field::new(name, DataType::Float64, false)
}

pub(super) fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub(super) fn leak_status_code(status: LeakStatus) -> u8 {
    match status {
        LeakStatus::Active => 0,
        LeakStatus::Tagged => 1,
        LeakStatus::Repaired => 2,
    }
}

pub(super) fn tag_source_code(source: TagSource) -> u8 {
    match source {
        TagSource::Natural => TAG_NATURAL,
        TagSource::Company { .. } => TAG_COMPANY,
    }
}
