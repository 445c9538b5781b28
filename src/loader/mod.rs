//! Record readers
//!
//! Turn the files of an input tree into typed record streams.
//!
//! # Overview
//!
//! The loader module provides:
//! - `GlobPattern` - Directory conventions such as `song_data/*/*/*/*.json`
//! - `RecordReader` - Lazy, ordered record streams over a storage location

mod glob;
mod reader;

pub use glob::GlobPattern;
pub use reader::RecordReader;
