//! Star schema tables
//!
//! Row types for the four dimension tables and the song-play fact table,
//! together with their fixed Arrow schemas.
//!
//! # Overview
//!
//! Every table implements [`Table`], which names the table, declares its
//! Hive partition columns and converts rows into an Arrow `RecordBatch`.
//! Tables that are read back from storage also implement `Deserialize`.

mod tables;
mod types;

pub use tables::{Table, UTC};
pub use types::{ArtistDimension, SongDimension, SongplayFact, TimeDimension, UserDimension};

#[cfg(test)]
mod tests;
