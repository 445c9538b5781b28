//! Hive-partitioned table writer
//!
//! A table is written as `<table>/<col>=<value>/.../part-00000.parquet`.
//! Every partition file is staged under `_staging/<run-id>/` first and only
//! renamed into place once the whole table has been staged, so a failed
//! run leaves the live table untouched.

use super::cloud::StorageLocation;
use super::writer::{write_parquet_bytes, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::schema::Table;
use crate::types::{OverwriteMode, TableName};
use arrow::array::{Array, ArrayRef, Int32Array, Int64Array, StringArray, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory holding staged files
pub const STAGING_DIR: &str = "_staging";

/// File name of each partition's data file
pub const PART_FILE: &str = "part-00000.parquet";

/// Marker written after a table has been committed
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Path segment used for null partition values
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Result of writing one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableWriteSummary {
    /// Table name
    pub table: String,
    /// Rows written
    pub rows: usize,
    /// Partition directories written, relative to the table
    pub partitions: Vec<String>,
    /// Stale files removed from the table
    pub removed: usize,
}

/// Characters that must be escaped in a partition path segment
fn needs_escape(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

/// Escape a partition value for use in a path segment
pub fn escape_partition_value(value: &str) -> String {
    if value.is_empty() {
        return DEFAULT_PARTITION.to_string();
    }

    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{byte:02X}"));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse [`escape_partition_value`]; `None` for the null partition
pub fn unescape_partition_value(segment: &str) -> Option<String> {
    if segment == DEFAULT_PARTITION {
        return None;
    }

    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            if let Ok(byte) = u8::from_str_radix(&segment[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

/// String form of a partition column value, `None` when null
fn partition_value(column: &ArrayRef, row: usize) -> Result<Option<String>> {
    if column.is_null(row) {
        return Ok(None);
    }

    let value = match column.data_type() {
        DataType::Utf8 => column
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string()),
        DataType::Int32 => column
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row).to_string()),
        DataType::Int64 => column
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row).to_string()),
        other => {
            return Err(Error::output(format!(
                "Unsupported partition column type: {other}"
            )))
        }
    };

    value
        .map(Some)
        .ok_or_else(|| Error::output("Failed to downcast partition column"))
}

/// Split a batch into one batch per partition.
///
/// Returns `(directory, batch)` pairs ordered by directory; partition
/// columns are removed from each batch. With no partition columns the whole
/// batch is returned under an empty directory.
pub fn split_partitions(
    batch: &RecordBatch,
    partition_columns: &[&str],
) -> Result<Vec<(String, RecordBatch)>> {
    if partition_columns.is_empty() {
        return Ok(vec![(String::new(), batch.clone())]);
    }

    let schema = batch.schema();
    let key_indices = partition_columns
        .iter()
        .map(|name| schema.index_of(name))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !key_indices.contains(i))
        .collect();
    let data_schema = Arc::new(Schema::new(
        data_indices
            .iter()
            .map(|i| schema.field(*i).clone())
            .collect::<Vec<_>>(),
    ));

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut segments = Vec::with_capacity(key_indices.len());
        for (name, index) in partition_columns.iter().zip(&key_indices) {
            let value = partition_value(batch.column(*index), row)?;
            let segment = value.map_or_else(
                || DEFAULT_PARTITION.to_string(),
                |v| escape_partition_value(&v),
            );
            segments.push(format!("{name}={segment}"));
        }
        groups.entry(segments.join("/")).or_default().push(row as u32);
    }

    let mut partitions = Vec::with_capacity(groups.len());
    for (dir, rows) in groups {
        let indices = UInt32Array::from(rows);
        let columns = data_indices
            .iter()
            .map(|i| take(batch.column(*i).as_ref(), &indices, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        partitions.push((dir, RecordBatch::try_new(data_schema.clone(), columns)?));
    }

    Ok(partitions)
}

/// Key of a table-relative file
fn table_key(table: &str, dir: &str, file: &str) -> String {
    if dir.is_empty() {
        format!("{table}/{file}")
    } else {
        format!("{table}/{dir}/{file}")
    }
}

/// Partition directory of a table-relative data key
fn partition_dir_of<'a>(table: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(table)?.strip_prefix('/')?;
    Some(rest.rsplit_once('/').map_or("", |(dir, _)| dir))
}

/// Writes tables to a storage location with overwrite semantics
pub struct PartitionedWriter {
    location: StorageLocation,
    config: ParquetWriterConfig,
    mode: OverwriteMode,
    run_id: String,
}

impl PartitionedWriter {
    /// Create a writer for one pipeline run
    pub fn new(location: StorageLocation, config: ParquetWriterConfig, mode: OverwriteMode) -> Self {
        let now = chrono::Utc::now();
        let run_id = format!(
            "{}-{}",
            now.format("%Y%m%dT%H%M%S%.f"),
            std::process::id()
        );
        Self {
            location,
            config,
            mode,
            run_id,
        }
    }

    /// Use a fixed run id for staging paths
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// The location tables are written to
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Write typed rows as a table
    pub async fn write_table<T: Table>(&self, rows: &[T]) -> Result<TableWriteSummary> {
        let batch = T::to_batch(rows)?;
        self.write_batch(T::NAME, &batch, T::PARTITION_COLUMNS).await
    }

    /// Write a batch as a table partitioned by `partition_columns`
    pub async fn write_batch(
        &self,
        table: TableName,
        batch: &RecordBatch,
        partition_columns: &[&str],
    ) -> Result<TableWriteSummary> {
        let table_name = table.as_str();
        let partitions = split_partitions(batch, partition_columns)?;
        let staging_root = format!("{STAGING_DIR}/{}/{table_name}", self.run_id);

        // Stage everything first; nothing live is touched on failure.
        let mut staged = Vec::with_capacity(partitions.len());
        for (dir, part) in &partitions {
            let encoded = write_parquet_bytes(part, &self.config);
            let staged_key = table_key(&staging_root, dir, PART_FILE);
            let result = match encoded {
                Ok(bytes) => self.location.put(&staged_key, bytes).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                self.discard(&staging_root).await;
                return Err(e);
            }
            debug!(table = table_name, partition = %dir, rows = part.num_rows(), "Staged partition");
            staged.push((staged_key, table_key(table_name, dir, PART_FILE)));
        }

        let existing = self.location.list(table_name).await?;
        self.location
            .delete(&format!("{table_name}/{SUCCESS_MARKER}"))
            .await?;

        for (from, to) in &staged {
            self.location.rename(from, to).await?;
        }

        let written_dirs: BTreeSet<&str> = partitions.iter().map(|(dir, _)| dir.as_str()).collect();
        let written_keys: BTreeSet<&str> = staged.iter().map(|(_, to)| to.as_str()).collect();
        let mut removed = 0;
        for key in &existing {
            if written_keys.contains(key.as_str()) || key.ends_with(SUCCESS_MARKER) {
                continue;
            }
            let in_written_partition = partition_dir_of(table_name, key)
                .is_some_and(|dir| written_dirs.contains(dir));
            if in_written_partition || self.mode == OverwriteMode::Table {
                self.location.delete(key).await?;
                removed += 1;
            }
        }

        self.location
            .put(&format!("{table_name}/{SUCCESS_MARKER}"), Bytes::new())
            .await?;
        self.discard(&staging_root).await;

        let summary = TableWriteSummary {
            table: table_name.to_string(),
            rows: batch.num_rows(),
            partitions: partitions.into_iter().map(|(dir, _)| dir).collect(),
            removed,
        };
        info!(
            table = table_name,
            rows = summary.rows,
            partitions = summary.partitions.len(),
            removed = summary.removed,
            "Wrote table"
        );
        Ok(summary)
    }

    /// Best-effort removal of staged files
    async fn discard(&self, staging_root: &str) {
        if let Err(e) = self.location.delete_prefix(staging_root).await {
            warn!(prefix = staging_root, error = %e, "Failed to clean up staged files");
        }
    }
}
