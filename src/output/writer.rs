//! Parquet encoder
//!
//! Encodes Arrow RecordBatches into in-memory Parquet files ready to be
//! uploaded to a storage location.

use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use serde::{Deserialize, Serialize};

/// Compression codec for Parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

impl ParquetCompression {
    /// Parquet codec with its default level
    pub fn codec(self) -> Compression {
        match self {
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCompression::Gzip => Compression::GZIP(GzipLevel::default()),
            ParquetCompression::None => Compression::UNCOMPRESSED,
        }
    }
}

/// Encoding settings shared by every file of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParquetWriterConfig {
    codec: ParquetCompression,
    row_group_size: usize,
    dictionary_enabled: bool,
    statistics_enabled: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            codec: ParquetCompression::default(),
            row_group_size: 1024 * 1024,
            dictionary_enabled: true,
            statistics_enabled: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Snappy, dictionary encoding and statistics on
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression codec
    #[must_use]
    pub fn with_codec(mut self, codec: ParquetCompression) -> Self {
        self.codec = codec;
        self
    }

    /// Cap rows per row group
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Toggle dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Toggle column statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    pub fn codec(&self) -> ParquetCompression {
        self.codec
    }

    pub fn compression(&self) -> Compression {
        self.codec.codec()
    }

    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    pub fn is_dictionary_enabled(&self) -> bool {
        self.dictionary_enabled
    }

    pub fn is_statistics_enabled(&self) -> bool {
        self.statistics_enabled
    }

    fn properties(&self) -> WriterProperties {
        let statistics = if self.statistics_enabled {
            EnabledStatistics::Page
        } else {
            EnabledStatistics::None
        };
        WriterProperties::builder()
            .set_compression(self.compression())
            .set_max_row_group_size(self.row_group_size)
            .set_dictionary_enabled(self.dictionary_enabled)
            .set_statistics_enabled(statistics)
            .build()
    }
}

/// In-memory Parquet file writer
pub struct ParquetWriter {
    /// Arrow writer over the output buffer
    writer: ArrowWriter<Vec<u8>>,
    /// Number of rows written
    rows_written: usize,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        let props = config.properties();
        let writer = ArrowWriter::try_new(Vec::new(), schema, Some(props)).map_err(|e| {
            Error::Output {
                message: format!("Failed to create Parquet writer: {e}"),
            }
        })?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch to the buffer
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Finalize the file and return its bytes
    pub fn finish(self) -> Result<Bytes> {
        let buf = self.writer.into_inner().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok(Bytes::from(buf))
    }
}

/// Encode a single RecordBatch as a Parquet file
pub fn write_parquet_bytes(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut writer = ParquetWriter::new(batch.schema(), config)?;
    writer.write(batch)?;
    writer.finish()
}
