//! Dimension extraction
//!
//! Projects raw records into the `song`, `artist`, `user` and `time`
//! dimension tables.
//!
//! # Overview
//!
//! - `extract_songs` / `extract_users` drop rows without a key and keep one
//!   row per key, chosen by a content-based rule (see [`dedup`])
//! - `extract_artists` projects every song document, without deduplication
//! - `extract_time` emits one row per event

pub mod dedup;
mod extract;

pub use extract::{extract_artists, extract_songs, extract_time, extract_users};
