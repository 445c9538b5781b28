//! Pipeline types
//!
//! Phase handoff and run statistics.

use crate::error::{Error, Result};
use crate::facts::JoinStats;
use crate::output::{StorageLocation, TableWriteSummary, SUCCESS_MARKER};
use crate::types::TableName;

/// Proof that the `song` and `artist` tables are committed.
///
/// The log phase takes one of these, so it cannot run before the
/// dimensions it joins against have been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionCommit {
    song_rows: Option<usize>,
    artist_rows: Option<usize>,
}

impl DimensionCommit {
    pub(crate) fn written(song_rows: usize, artist_rows: usize) -> Self {
        Self {
            song_rows: Some(song_rows),
            artist_rows: Some(artist_rows),
        }
    }

    /// Find dimensions committed by an earlier run
    pub async fn discover(output: &StorageLocation) -> Result<Self> {
        for table in [TableName::Song, TableName::Artist] {
            let marker = format!("{table}/{SUCCESS_MARKER}");
            if !output.exists(&marker).await? {
                return Err(Error::config(format!(
                    "Table '{table}' is not committed in {}; process song data first",
                    output.url()
                )));
            }
        }

        Ok(Self {
            song_rows: None,
            artist_rows: None,
        })
    }

    /// Rows written to `song`, when committed by this process
    pub fn song_rows(&self) -> Option<usize> {
        self.song_rows
    }

    /// Rows written to `artist`, when committed by this process
    pub fn artist_rows(&self) -> Option<usize> {
        self.artist_rows
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// One summary per table written, in write order
    pub tables: Vec<TableWriteSummary>,
    /// Input records and files skipped as malformed
    pub skipped_records: usize,
    /// Song-play join counters
    pub join: Option<JoinStats>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written table
    pub fn add_table(&mut self, summary: TableWriteSummary) {
        self.tables.push(summary);
    }

    /// Rows written to a table, if it was written
    pub fn rows(&self, table: TableName) -> Option<usize> {
        self.table(table).map(|t| t.rows)
    }

    /// Summary of a written table
    pub fn table(&self, table: TableName) -> Option<&TableWriteSummary> {
        self.tables.iter().rev().find(|t| t.table == table.as_str())
    }

    /// Total rows across all written tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
