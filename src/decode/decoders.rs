//! Decoder implementations
//!
//! Each decoder handles a specific file layout.

use super::types::{DecodedRecords, DecoderFormat, RecordDecoder};
use crate::error::{Error, Result};
use crate::types::MalformedPolicy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder
///
/// Accepts a top-level array of records, a single record, or a sequence of
/// concatenated records separated by any whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, source: &str, body: &str) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        for value in serde_json::Deserializer::from_str(body).into_iter::<Value>() {
            let value = value.map_err(|e| Error::decode(source, format!("invalid JSON: {e}")))?;
            match value {
                Value::Array(items) => records.extend(items),
                other => records.push(other),
            }
        }

        Ok(records)
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonlDecoder {
    fn decode(&self, source: &str, body: &str) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| {
                Error::decode(source, format!("invalid JSONL at line {}: {e}", line_num + 1))
            })?;

            records.push(value);
        }

        Ok(records)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Get the decoder for a format
pub fn decoder_for(format: DecoderFormat) -> Box<dyn RecordDecoder> {
    match format {
        DecoderFormat::Json => Box::new(JsonDecoder::new()),
        DecoderFormat::Jsonl => Box::new(JsonlDecoder::new()),
    }
}

/// Parse each non-blank line on its own, keeping the lines that parse.
///
/// Returns the parsed records and the number of lines that did not parse.
fn decode_lines(source: &str, body: &str) -> (Vec<Value>, usize) {
    let mut records = Vec::new();
    let mut bad_lines = 0;

    for (line_num, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Array(items)) => records.extend(items),
            Ok(value) => records.push(value),
            Err(e) => {
                warn!(file = source, line = line_num + 1, error = %e, "Skipping malformed line");
                bad_lines += 1;
            }
        }
    }

    (records, bad_lines)
}

/// Decode a file body and convert each record to `T`.
///
/// With [`MalformedPolicy::Skip`] a body that fails to parse is retried line
/// by line: lines that parse are kept and each line that does not is counted
/// as one skipped record. A file with no parseable line counts once. A record
/// that does not fit `T` is counted and dropped. With
/// [`MalformedPolicy::Fail`] every one of these cases returns an error.
pub fn decode_typed<T: DeserializeOwned>(
    decoder: &dyn RecordDecoder,
    source: &str,
    body: &str,
    policy: MalformedPolicy,
) -> Result<DecodedRecords<T>> {
    let mut skipped = 0;

    let values = match decoder.decode(source, body) {
        Ok(values) => values,
        Err(e) if policy == MalformedPolicy::Skip => {
            let (values, bad_lines) = decode_lines(source, body);
            if values.is_empty() {
                warn!(file = source, error = %e, "Skipping undecodable file");
                return Ok(DecodedRecords::skipped(1));
            }
            warn!(
                file = source,
                kept = values.len(),
                bad_lines,
                "Recovered records from partially malformed file"
            );
            skipped = bad_lines;
            values
        }
        Err(e) => return Err(e),
    };

    let mut records = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(e) => match policy {
                MalformedPolicy::Skip => {
                    warn!(file = source, index, error = %e, "Skipping malformed record");
                    skipped += 1;
                }
                MalformedPolicy::Fail => {
                    return Err(Error::decode(
                        source,
                        format!("record {index} does not match schema: {e}"),
                    ));
                }
            },
        }
    }

    Ok(DecodedRecords { records, skipped })
}
