//! Record reader over a storage location

use super::glob::GlobPattern;
use crate::decode::{decode_typed, decoder_for, DecodedRecords, DecoderFormat};
use crate::error::{Error, Result};
use crate::output::StorageLocation;
use crate::types::MalformedPolicy;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads typed records from the files matching a glob
#[derive(Debug, Clone)]
pub struct RecordReader {
    location: StorageLocation,
    format: DecoderFormat,
    policy: MalformedPolicy,
    skipped: Arc<AtomicUsize>,
}

impl RecordReader {
    /// Create a reader with the default format and malformed-input policy
    pub fn new(location: StorageLocation) -> Self {
        Self {
            location,
            format: DecoderFormat::default(),
            policy: MalformedPolicy::default(),
            skipped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the file format
    #[must_use]
    pub fn with_format(mut self, format: DecoderFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the malformed-input policy
    #[must_use]
    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The location being read
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Records and files skipped so far by every stream of this reader
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Keys matching a glob, in lexicographic order
    pub async fn matching_files(&self, glob: &str) -> Result<Vec<String>> {
        let pattern = GlobPattern::new(glob)?;
        let keys = self.location.list(pattern.literal_prefix()).await?;
        let files: Vec<String> = keys.into_iter().filter(|k| pattern.matches(k)).collect();

        debug!(glob = pattern.as_str(), files = files.len(), "Matched input files");
        if files.is_empty() {
            warn!(glob = pattern.as_str(), location = self.location.url(), "No input files matched");
        }
        Ok(files)
    }

    /// Lazy stream of records from every file matching `glob`.
    ///
    /// Files are fetched one at a time in key order. Skipped records are
    /// added to [`skipped`](Self::skipped) as the stream advances.
    pub async fn records<T>(&self, glob: &str) -> Result<BoxStream<'static, Result<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let files = self.matching_files(glob).await?;
        let location = self.location.clone();
        let format = self.format;
        let policy = self.policy;
        let skipped = Arc::clone(&self.skipped);

        let stream = stream::iter(files)
            .then(move |key| {
                let location = location.clone();
                let skipped = Arc::clone(&skipped);
                async move {
                    let decoded = read_file::<T>(&location, &key, format, policy).await?;
                    skipped.fetch_add(decoded.skipped, Ordering::Relaxed);
                    Ok::<_, Error>(stream::iter(decoded.records.into_iter().map(Ok)))
                }
            })
            .try_flatten();

        Ok(stream.boxed())
    }

    /// Collect every record matching `glob`
    ///
    /// The returned `skipped` count covers this call only.
    pub async fn read_all<T>(&self, glob: &str) -> Result<DecodedRecords<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let before = self.skipped();
        let records: Vec<T> = self.records(glob).await?.try_collect().await?;
        Ok(DecodedRecords {
            records,
            skipped: self.skipped() - before,
        })
    }
}

async fn read_file<T: DeserializeOwned>(
    location: &StorageLocation,
    key: &str,
    format: DecoderFormat,
    policy: MalformedPolicy,
) -> Result<DecodedRecords<T>> {
    let bytes = location.get(key).await?;

    let body = match std::str::from_utf8(&bytes) {
        Ok(body) => body,
        Err(e) if policy == MalformedPolicy::Skip => {
            warn!(file = key, error = %e, "Skipping file that is not UTF-8");
            return Ok(DecodedRecords::skipped(1));
        }
        Err(e) => return Err(Error::decode(key, format!("not UTF-8: {e}"))),
    };

    let decoder = decoder_for(format);
    let decoded = decode_typed(decoder.as_ref(), key, body, policy)?;
    debug!(
        file = key,
        records = decoded.records.len(),
        skipped = decoded.skipped,
        "Read input file"
    );
    Ok(decoded)
}
