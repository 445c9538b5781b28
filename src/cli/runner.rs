//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::engine::{DimensionCommit, Pipeline, PipelineStats};
use crate::error::{Error, Result};
use crate::output::TableWriteSummary;
use serde_json::{json, Value};
use tracing::error;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let result = match self.cli.command {
            Commands::Run => self.run_all().await,
            Commands::Songs => self.songs().await,
            Commands::Logs => self.logs().await,
            Commands::Validate => self.validate(),
        };

        if let Some(hint) = result.as_ref().err().and_then(failure_hint) {
            error!("{hint}");
        }
        result
    }

    /// Load the config file, if any, and apply command-line overrides
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = &self.cli.input {
            config = config.with_input(input.clone());
        }
        if let Some(output) = &self.cli.output {
            config = config.with_output(output.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Run both phases
    async fn run_all(&self) -> Result<()> {
        let mut pipeline = Pipeline::new(self.load_config()?)?;
        let stats = pipeline.run().await?;
        self.output_stats(&stats);
        Ok(())
    }

    /// Run the song phase
    async fn songs(&self) -> Result<()> {
        let mut pipeline = Pipeline::new(self.load_config()?)?;
        pipeline.process_song_data().await?;
        self.output_stats(pipeline.stats());
        Ok(())
    }

    /// Run the log phase against dimensions committed earlier
    async fn logs(&self) -> Result<()> {
        let mut pipeline = Pipeline::new(self.load_config()?)?;
        let commit = DimensionCommit::discover(pipeline.output()).await?;
        pipeline.process_log_data(&commit).await?;
        self.output_stats(pipeline.stats());
        Ok(())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        let mut resolved = serde_json::to_value(&config)?;

        if let Some(credentials) = resolved.get_mut("credentials").and_then(Value::as_object_mut) {
            for secret in ["access_key_id", "secret_access_key", "session_token"] {
                if let Some(value) = credentials.get_mut(secret) {
                    if !value.is_null() {
                        *value = json!("***");
                    }
                }
            }
        }

        self.output_message(&json!({
            "type": "CONFIG",
            "config": resolved,
        }));
        Ok(())
    }

    /// Output table summaries and run totals
    fn output_stats(&self, stats: &PipelineStats) {
        for table in &stats.tables {
            self.output_message(&table_message(table));
        }

        let mut summary = json!({
            "type": "STATS",
            "stats": {
                "tables": stats.tables.len(),
                "rows": stats.total_rows(),
                "skipped_records": stats.skipped_records,
                "duration_ms": stats.duration_ms,
            }
        });
        if let Some(join) = &stats.join {
            summary["stats"]["join"] = json!({
                "events": join.events,
                "facts": join.facts,
                "matched_songs": join.matched_songs,
                "matched_artists": join.matched_artists,
                "ambiguous_titles": join.ambiguous_titles,
                "ambiguous_artists": join.ambiguous_artists,
                "skipped_events": join.skipped_events,
                "repeated_keys": join.repeated_keys,
            });
        }
        self.output_message(&summary);
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// What a failure left behind in the output location
fn failure_hint(error: &Error) -> Option<&'static str> {
    if error.is_startup() {
        Some("Invalid configuration; nothing was read or written")
    } else if error.is_storage() {
        Some(
            "Storage failure; the table being written may be uncommitted \
             (no _SUCCESS marker) with some partitions replaced, rerun the pipeline",
        )
    } else {
        None
    }
}

fn table_message(table: &TableWriteSummary) -> Value {
    json!({
        "type": "TABLE",
        "table": {
            "name": table.table,
            "rows": table.rows,
            "partitions": table.partitions.len(),
            "removed": table.removed,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "input: ./raw\noutput: ./lake\noverwrite: partition\n").unwrap();

        let cli = Cli::parse_from([
            "songplay-lake",
            "--config",
            path.to_str().unwrap(),
            "--output",
            "/tmp/other",
            "validate",
        ]);
        let config = Runner::new(cli).load_config().unwrap();
        assert_eq!(config.input().unwrap(), "./raw");
        assert_eq!(config.output().unwrap(), "/tmp/other");
        assert_eq!(config.overwrite, crate::types::OverwriteMode::Partition);
    }

    #[test]
    fn test_validate_without_paths_fails() {
        let cli = Cli::parse_from(["songplay-lake", "validate"]);
        let err = Runner::new(cli).validate().unwrap_err();
        assert!(err.is_startup());
    }

    #[test]
    fn test_failure_hint() {
        let storage = failure_hint(&Error::storage("rename failed")).unwrap();
        assert!(storage.contains("may be uncommitted"));
        assert!(!storage.contains("unchanged"));

        let startup = failure_hint(&Error::missing_field("output")).unwrap();
        assert!(startup.contains("nothing was read or written"));

        assert!(failure_hint(&Error::output("no rows")).is_none());
    }

    #[test]
    fn test_table_message() {
        let summary = TableWriteSummary {
            table: "time".to_string(),
            rows: 87,
            partitions: vec!["year=2018/month=11".to_string()],
            removed: 0,
        };
        let msg = table_message(&summary);
        assert_eq!(msg["table"]["name"], "time");
        assert_eq!(msg["table"]["rows"], 87);
        assert_eq!(msg["table"]["partitions"], 1);
    }
}
