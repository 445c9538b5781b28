//! Common types used throughout songplay-lake
//!
//! This module contains shared enums used across
//! the reader, extractor, resolver and writer modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Table Names
// ============================================================================

/// Tables of the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    /// Song dimension
    Song,
    /// Artist dimension
    Artist,
    /// User dimension
    User,
    /// Time dimension
    Time,
    /// Song-play fact table
    Songplay,
}

impl TableName {
    /// All tables in build order
    pub const ALL: [TableName; 5] = [
        TableName::Song,
        TableName::Artist,
        TableName::User,
        TableName::Time,
        TableName::Songplay,
    ];

    /// Directory name under the output root
    pub fn as_str(self) -> &'static str {
        match self {
            TableName::Song => "song",
            TableName::Artist => "artist",
            TableName::User => "user",
            TableName::Time => "time",
            TableName::Songplay => "songplay",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Surrogate Keys
// ============================================================================

/// How `songplay_id` values are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurrogateKeyStrategy {
    /// Stable hash of (user, session, timestamp, item in session)
    #[default]
    Composite,
    /// Strictly increasing counter in event order, starting at 0.
    /// Not stable across runs.
    Sequential,
}

// ============================================================================
// Overwrite Mode
// ============================================================================

/// How a rebuild replaces an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteMode {
    /// Replace the whole table; partitions absent from the rebuild are removed
    #[default]
    Table,
    /// Replace only the partitions produced by the rebuild
    Partition,
}

// ============================================================================
// Malformed Input
// ============================================================================

/// What to do with input files or records that fail to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Drop the file or record, log a warning and keep going
    #[default]
    Skip,
    /// Abort the run
    Fail,
}
