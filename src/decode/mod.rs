//! Input decoder module
//!
//! Supports: JSON (arrays, single documents, concatenated documents), JSONL
//!
//! # Overview
//!
//! The decode module turns the body of one input file into JSON values and
//! then into typed records. Bad records are dropped or fail the run
//! according to the configured [`MalformedPolicy`](crate::types::MalformedPolicy).

mod decoders;
mod types;

pub use decoders::{decode_typed, decoder_for, JsonDecoder, JsonlDecoder};
pub use types::{DecodedRecords, DecoderFormat, RecordDecoder};
