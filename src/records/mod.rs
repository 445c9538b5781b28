//! Raw input records
//!
//! Typed views of the two JSON feeds: song metadata files and
//! application event logs.
//!
//! # Overview
//!
//! Both record types are deliberately lenient: every attribute except the
//! event timestamp is optional, so a record missing a key field still
//! decodes and is filtered later by the dimension extractor.

mod types;

pub use types::{EventRecord, SongMetadataRecord, NEXT_SONG_PAGE};

#[cfg(test)]
mod tests;
