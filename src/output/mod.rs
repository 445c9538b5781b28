//! Output module
//!
//! Handles Parquet encoding, storage locations and partitioned table writes.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Encoding Arrow RecordBatches as Parquet
//! - Reaching storage locations (local, S3, R2, GCS, Azure)
//! - Writing Hive-partitioned tables with staged, overwrite-on-rebuild commits
//! - Reading committed tables back into typed rows

mod cloud;
mod partitioned;
mod reader;
mod writer;

pub use cloud::StorageLocation;
pub use partitioned::{
    escape_partition_value, split_partitions, unescape_partition_value, PartitionedWriter,
    TableWriteSummary, DEFAULT_PARTITION, PART_FILE, STAGING_DIR, SUCCESS_MARKER,
};
pub use reader::{arrow_to_json, read_table};
pub use writer::{write_parquet_bytes, ParquetCompression, ParquetWriter, ParquetWriterConfig};
