//! CLI module
//!
//! Command-line driver for the pipeline.
//!
//! # Commands
//!
//! - `run` - Rebuild every table
//! - `songs` - Rebuild `song` and `artist`
//! - `logs` - Rebuild `user`, `time` and `songplay`
//! - `validate` - Check the configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
