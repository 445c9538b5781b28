//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build a song-play star schema lake from song metadata and event logs
#[derive(Parser, Debug)]
#[command(name = "songplay-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Input root (local path or cloud URL)
    /// Supports: /path, s3://bucket/path, s3a://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Output root (local path or cloud URL)
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Rebuild every table: song data first, then log data
    Run,

    /// Rebuild the song and artist tables only
    Songs,

    /// Rebuild the user, time and songplay tables from committed dimensions
    Logs,

    /// Validate the configuration and print the resolved settings
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "songplay-lake",
            "--input",
            "s3a://udacity-dend/",
            "run",
            "-o",
            "./lake",
            "-v",
        ]);
        assert_eq!(cli.command, Commands::Run);
        assert_eq!(cli.input.as_deref(), Some("s3a://udacity-dend/"));
        assert_eq!(cli.output.as_deref(), Some("./lake"));
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_logs_with_config() {
        let cli = Cli::parse_from(["songplay-lake", "logs", "--config", "pipeline.yaml"]);
        assert_eq!(cli.command, Commands::Logs);
        assert_eq!(cli.config, Some(PathBuf::from("pipeline.yaml")));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["songplay-lake", "serve"]).is_err());
    }
}
