//! Reading persisted tables back into typed rows
//!
//! Partition columns live in the file path rather than the file body, so
//! they are restored from the `<col>=<value>` segments using the table's
//! declared schema.

use super::cloud::StorageLocation;
use super::partitioned::{unescape_partition_value, STAGING_DIR, SUCCESS_MARKER};
use crate::error::{Error, Result};
use crate::schema::Table;
use arrow::array::{
    Array, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Convert an Arrow RecordBatch to JSON records
///
/// Returns a vector of JSON objects, one per row in the batch.
pub fn arrow_to_json(batch: &RecordBatch) -> Result<Vec<Value>> {
    let schema = batch.schema();
    let num_rows = batch.num_rows();
    let mut records = Vec::with_capacity(num_rows);

    for row_idx in 0..num_rows {
        let mut record = serde_json::Map::new();

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let column = batch.column(col_idx);
            let value = array_value_to_json(column.as_ref(), row_idx)?;
            record.insert(field.name().clone(), value);
        }

        records.push(Value::Object(record));
    }

    Ok(records)
}

fn downcast<'a, A: 'static>(array: &'a dyn Array, name: &str) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| Error::Output {
        message: format!("Failed to downcast to {name}"),
    })
}

/// Convert a single array element to JSON
fn array_value_to_json(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Null => Ok(Value::Null),

        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(array, "BooleanArray")?;
            Ok(Value::Bool(arr.value(row)))
        }

        DataType::Int32 => {
            let arr = downcast::<Int32Array>(array, "Int32Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Int64 => {
            let arr = downcast::<Int64Array>(array, "Int64Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Float64 => {
            let arr = downcast::<Float64Array>(array, "Float64Array")?;
            Ok(serde_json::Number::from_f64(arr.value(row)).map_or(Value::Null, Value::Number))
        }

        DataType::Utf8 => {
            let arr = downcast::<StringArray>(array, "StringArray")?;
            Ok(Value::String(arr.value(row).to_string()))
        }

        DataType::Timestamp(TimeUnit::Second, _) => {
            let arr = downcast::<TimestampSecondArray>(array, "TimestampSecondArray")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        other => Err(Error::output(format!("Unsupported column type: {other}"))),
    }
}

/// Parse `<table>/<col>=<value>/.../<file>` into partition values
fn partition_values(table: &str, key: &str) -> Result<Vec<(String, Option<String>)>> {
    let rest = key
        .strip_prefix(table)
        .and_then(|r| r.strip_prefix('/'))
        .ok_or_else(|| Error::schema_mismatch(table, format!("'{key}' is outside the table")))?;

    let Some((dir, _file)) = rest.rsplit_once('/') else {
        return Ok(Vec::new());
    };

    dir.split('/')
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(col, value)| (col.to_string(), unescape_partition_value(value)))
                .ok_or_else(|| {
                    Error::schema_mismatch(table, format!("bad partition segment '{segment}'"))
                })
        })
        .collect()
}

/// Typed JSON value for a partition column
fn typed_partition_value(
    schema: &Schema,
    table: &str,
    column: &str,
    value: Option<&str>,
) -> Result<Value> {
    let field = schema
        .field_with_name(column)
        .map_err(|_| Error::schema_mismatch(table, format!("unknown partition column '{column}'")))?;

    let Some(value) = value else {
        return Ok(Value::Null);
    };

    match field.data_type() {
        DataType::Int32 | DataType::Int64 => value
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|e| {
                Error::schema_mismatch(table, format!("partition {column}={value}: {e}"))
            }),
        DataType::Utf8 => Ok(Value::String(value.to_string())),
        other => Err(Error::schema_mismatch(
            table,
            format!("partition column '{column}' has unsupported type {other}"),
        )),
    }
}

/// Read a committed table back into typed rows.
///
/// Fails with [`Error::TableNotFound`] when the table has no commit marker.
pub async fn read_table<T: Table + DeserializeOwned>(location: &StorageLocation) -> Result<Vec<T>> {
    let table = T::NAME.as_str();
    let schema = T::schema();
    let keys = location.list(table).await?;

    let marker = format!("{table}/{SUCCESS_MARKER}");
    if !keys.iter().any(|k| *k == marker) {
        return Err(Error::table_not_found(table, location.url()));
    }

    let mut rows = Vec::new();
    for key in keys
        .iter()
        .filter(|k| k.ends_with(".parquet") && !k.contains(STAGING_DIR))
    {
        let partitions = partition_values(table, key)?;
        let bytes = location.get(key).await?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)?.build()?;

        for batch in reader {
            for mut record in arrow_to_json(&batch?)? {
                if let Value::Object(obj) = &mut record {
                    for (column, value) in &partitions {
                        let typed = typed_partition_value(&schema, table, column, value.as_deref())?;
                        obj.insert(column.clone(), typed);
                    }
                }
                let row = serde_json::from_value(record)
                    .map_err(|e| Error::schema_mismatch(table, e.to_string()))?;
                rows.push(row);
            }
        }
        debug!(table, file = %key, "Read table file");
    }

    Ok(rows)
}
