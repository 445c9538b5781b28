//! Pipeline orchestration
//!
//! Runs the two phases of a rebuild.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Pipeline` - Reads the input tree and writes the star schema
//! - `DimensionCommit` - Handoff from the song phase to the log phase
//! - `PipelineStats` - Row counts, skips and join counters of a run
//!
//! The song phase writes `song` and `artist`. The log phase writes `user`
//! and `time`, then re-reads `song` and `artist` from storage to resolve
//! `songplay`.

mod types;

pub use types::{DimensionCommit, PipelineStats};

use crate::config::PipelineConfig;
use crate::dimension::{extract_artists, extract_songs, extract_time, extract_users};
use crate::error::Result;
use crate::facts::resolve_songplays;
use crate::loader::RecordReader;
use crate::output::{read_table, PartitionedWriter, StorageLocation};
use crate::records::{EventRecord, SongMetadataRecord};
use crate::schema::{ArtistDimension, SongDimension};
use std::time::Instant;
use tracing::info;

/// Star schema pipeline over one input and one output location
pub struct Pipeline {
    /// Pipeline configuration
    config: PipelineConfig,
    /// Reader over the input root
    reader: RecordReader,
    /// Writer over the output root
    writer: PartitionedWriter,
    /// Statistics
    stats: PipelineStats,
}

impl Pipeline {
    /// Validate the configuration and open the input and output locations
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let credentials = config.credentials.as_ref();
        let input = StorageLocation::open(config.input()?, credentials)?;
        let output = StorageLocation::create(config.output()?, credentials)?;
        Ok(Self::with_locations(config, input, output))
    }

    /// Build a pipeline over already opened locations
    pub fn with_locations(
        config: PipelineConfig,
        input: StorageLocation,
        output: StorageLocation,
    ) -> Self {
        let reader = RecordReader::new(input)
            .with_format(config.format)
            .with_policy(config.malformed);
        let writer = PartitionedWriter::new(output, config.writer_config(), config.overwrite);
        Self {
            config,
            reader,
            writer,
            stats: PipelineStats::new(),
        }
    }

    /// The pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The output location
    pub fn output(&self) -> &StorageLocation {
        self.writer.location()
    }

    /// Statistics collected so far
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Build and persist the `song` and `artist` dimensions
    pub async fn process_song_data(&mut self) -> Result<DimensionCommit> {
        info!(
            input = self.reader.location().url(),
            glob = %self.config.song_glob,
            "Processing song data"
        );

        let raw = self
            .reader
            .read_all::<SongMetadataRecord>(&self.config.song_glob)
            .await?;
        info!(records = raw.records.len(), skipped = raw.skipped, "Read song metadata");
        self.stats.skipped_records += raw.skipped;

        let songs = extract_songs(&raw.records);
        let artists = extract_artists(&raw.records);

        let song_summary = self.writer.write_table(&songs).await?;
        let artist_summary = self.writer.write_table(&artists).await?;
        let commit = DimensionCommit::written(song_summary.rows, artist_summary.rows);

        self.stats.add_table(song_summary);
        self.stats.add_table(artist_summary);
        Ok(commit)
    }

    /// Build and persist `user`, `time` and `songplay`
    ///
    /// `songplay` is resolved against the `song` and `artist` tables read
    /// back from the output location.
    pub async fn process_log_data(&mut self, commit: &DimensionCommit) -> Result<()> {
        info!(
            input = self.reader.location().url(),
            glob = %self.config.log_glob,
            "Processing log data"
        );

        let raw = self
            .reader
            .read_all::<EventRecord>(&self.config.log_glob)
            .await?;
        self.stats.skipped_records += raw.skipped;

        let total = raw.records.len();
        let plays: Vec<EventRecord> = raw
            .records
            .into_iter()
            .filter(EventRecord::is_song_play)
            .collect();
        info!(events = total, song_plays = plays.len(), skipped = raw.skipped, "Read event log");

        let users = extract_users(&plays);
        let times = extract_time(&plays);
        let user_summary = self.writer.write_table(&users).await?;
        self.stats.add_table(user_summary);
        let time_summary = self.writer.write_table(&times).await?;
        self.stats.add_table(time_summary);

        let songs: Vec<SongDimension> = read_table(self.writer.location()).await?;
        let artists: Vec<ArtistDimension> = read_table(self.writer.location()).await?;
        info!(
            songs = songs.len(),
            artists = artists.len(),
            committed_songs = ?commit.song_rows(),
            "Loaded persisted dimensions"
        );

        let resolution = resolve_songplays(&plays, &songs, &artists, self.config.surrogate_key);
        let fact_summary = self.writer.write_table(&resolution.facts).await?;
        info!(
            facts = resolution.stats.facts,
            matched_songs = resolution.stats.matched_songs,
            matched_artists = resolution.stats.matched_artists,
            "Resolved song plays"
        );

        self.stats.add_table(fact_summary);
        self.stats.join = Some(resolution.stats);
        Ok(())
    }

    /// Run both phases in order
    pub async fn run(&mut self) -> Result<PipelineStats> {
        let start = Instant::now();

        let commit = self.process_song_data().await?;
        self.process_log_data(&commit).await?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            tables = self.stats.tables.len(),
            rows = self.stats.total_rows(),
            skipped = self.stats.skipped_records,
            duration_ms = self.stats.duration_ms,
            "Pipeline complete"
        );
        Ok(self.stats.clone())
    }
}
