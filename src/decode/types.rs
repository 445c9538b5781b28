//! Decoder types and traits
//!
//! Defines the core decoder abstractions.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format of the input files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderFormat {
    /// JSON: an array of records, one document, or several concatenated
    /// documents (which also covers newline-delimited files)
    #[default]
    Json,
    /// Strict JSON Lines (one record per line)
    Jsonl,
}

/// Trait for decoding a file body into JSON records
pub trait RecordDecoder: Send + Sync {
    /// Decode the body of `source` into a list of records
    fn decode(&self, source: &str, body: &str) -> Result<Vec<Value>>;
}

/// Typed records decoded from one file
#[derive(Debug, Clone)]
pub struct DecodedRecords<T> {
    /// Records that matched the target type
    pub records: Vec<T>,
    /// Records dropped because they did not match
    pub skipped: usize,
}

impl<T> DecodedRecords<T> {
    /// An empty result with a skip count
    pub fn skipped(count: usize) -> Self {
        Self {
            records: Vec::new(),
            skipped: count,
        }
    }
}
