//! Pipeline configuration
//!
//! Settings are loaded from a YAML file and may be overridden from the
//! command line. Every field except `input` and `output` has a default.
//!
//! ```yaml
//! input: s3a://udacity-dend/
//! output: ./lake
//! surrogate_key: composite
//! overwrite: table
//! parquet:
//!   compression: snappy
//! ```

use crate::decode::DecoderFormat;
use crate::error::{Error, Result, ResultExt};
use crate::loader::GlobPattern;
use crate::output::{ParquetCompression, ParquetWriterConfig};
use crate::types::{MalformedPolicy, OverwriteMode, SurrogateKeyStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Default glob for song metadata files
pub const DEFAULT_SONG_GLOB: &str = "song_data/*/*/*/*.json";

/// Default glob for event log files
pub const DEFAULT_LOG_GLOB: &str = "log_data/*/*/*.json";

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root of the raw input tree
    pub input: Option<String>,

    /// Root of the output lake
    pub output: Option<String>,

    /// Glob selecting song metadata files, relative to `input`
    pub song_glob: String,

    /// Glob selecting event log files, relative to `input`
    pub log_glob: String,

    /// Input file format
    pub format: DecoderFormat,

    /// What to do with records that cannot be decoded
    pub malformed: MalformedPolicy,

    /// How songplay ids are generated
    pub surrogate_key: SurrogateKeyStrategy,

    /// What a rewrite replaces
    pub overwrite: OverwriteMode,

    /// Parquet encoding settings
    pub parquet: ParquetSettings,

    /// Object store credentials; the environment is used when absent
    pub credentials: Option<StorageCredentials>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            song_glob: DEFAULT_SONG_GLOB.to_string(),
            log_glob: DEFAULT_LOG_GLOB.to_string(),
            format: DecoderFormat::default(),
            malformed: MalformedPolicy::default(),
            surrogate_key: SurrogateKeyStrategy::default(),
            overwrite: OverwriteMode::default(),
            parquet: ParquetSettings::default(),
            credentials: None,
        }
    }
}

impl PipelineConfig {
    /// Create a config for an input and output root with default settings
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            output: Some(output.into()),
            ..Self::default()
        }
    }

    /// Load a config from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                )));
            }
        };
        Self::from_yaml_str(&content).with_context(|| path.display().to_string())
    }

    /// Parse a config from a YAML string
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse config YAML")
    }

    /// Override the input root
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Override the output root
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set the surrogate key strategy
    #[must_use]
    pub fn with_surrogate_key(mut self, strategy: SurrogateKeyStrategy) -> Self {
        self.surrogate_key = strategy;
        self
    }

    /// Set the overwrite mode
    #[must_use]
    pub fn with_overwrite(mut self, mode: OverwriteMode) -> Self {
        self.overwrite = mode;
        self
    }

    /// Input root; fails when unset
    pub fn input(&self) -> Result<&str> {
        required(self.input.as_deref(), "input")
    }

    /// Output root; fails when unset
    pub fn output(&self) -> Result<&str> {
        required(self.output.as_deref(), "output")
    }

    /// Check the configuration before any record is read
    pub fn validate(&self) -> Result<()> {
        self.input()?;
        self.output()?;

        if self.song_glob.trim().is_empty() {
            return Err(Error::invalid_value("song_glob", "glob cannot be empty"));
        }
        if self.log_glob.trim().is_empty() {
            return Err(Error::invalid_value("log_glob", "glob cannot be empty"));
        }
        GlobPattern::new(&self.song_glob)?;
        GlobPattern::new(&self.log_glob)?;

        self.parquet.validate()?;

        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }

        Ok(())
    }

    /// Parquet writer settings
    pub fn writer_config(&self) -> ParquetWriterConfig {
        self.parquet.to_writer_config()
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::missing_field(field)),
    }
}

// ============================================================================
// Parquet Settings
// ============================================================================

/// Parquet encoding settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetSettings {
    /// Compression codec
    pub compression: ParquetCompression,

    /// Maximum rows per row group
    pub row_group_size: usize,

    /// Dictionary encoding
    pub dictionary: bool,

    /// Column statistics
    pub statistics: bool,
}

impl Default for ParquetSettings {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: default_row_group_size(),
            dictionary: true,
            statistics: true,
        }
    }
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

impl ParquetSettings {
    fn validate(&self) -> Result<()> {
        if self.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Build the writer config
    pub fn to_writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::new()
            .with_codec(self.compression)
            .with_row_group_size(self.row_group_size)
            .with_dictionary(self.dictionary)
            .with_statistics(self.statistics)
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Explicit object store credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCredentials {
    /// Access key id
    pub access_key_id: Option<String>,

    /// Secret access key
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    pub session_token: Option<String>,

    /// Region
    pub region: Option<String>,

    /// Custom endpoint (R2, MinIO)
    pub endpoint: Option<String>,
}

impl StorageCredentials {
    fn validate(&self) -> Result<()> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(Error::invalid_value(
                "credentials",
                "access_key_id is set but secret_access_key is missing",
            )),
            (None, Some(_)) => Err(Error::invalid_value(
                "credentials",
                "secret_access_key is set but access_key_id is missing",
            )),
            _ => Ok(()),
        }
    }
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "***")
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &redact(self.access_key_id.as_ref()))
            .field("secret_access_key", &redact(self.secret_access_key.as_ref()))
            .field("session_token", &redact(self.session_token.as_ref()))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
input: s3a://udacity-dend/
output: ./lake
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.input().unwrap(), "s3a://udacity-dend/");
        assert_eq!(config.output().unwrap(), "./lake");
        assert_eq!(config.song_glob, DEFAULT_SONG_GLOB);
        assert_eq!(config.log_glob, DEFAULT_LOG_GLOB);
        assert_eq!(config.surrogate_key, SurrogateKeyStrategy::Composite);
        assert_eq!(config.overwrite, OverwriteMode::Table);
        assert_eq!(config.malformed, MalformedPolicy::Skip);
        assert_eq!(config.parquet, ParquetSettings::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
input: /data/raw
output: s3://lake/sparkify/
song_glob: "songs/*.json"
log_glob: "events/*/*.jsonl"
format: jsonl
malformed: fail
surrogate_key: sequential
overwrite: partition
parquet:
  compression: zstd
  row_group_size: 5000
  dictionary: false
credentials:
  access_key_id: AKIDEXAMPLE
  secret_access_key: wJalrXUtnFEMI
  region: us-west-2
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.format, DecoderFormat::Jsonl);
        assert_eq!(config.malformed, MalformedPolicy::Fail);
        assert_eq!(config.surrogate_key, SurrogateKeyStrategy::Sequential);
        assert_eq!(config.overwrite, OverwriteMode::Partition);
        assert_eq!(config.parquet.compression, ParquetCompression::Zstd);
        assert_eq!(config.parquet.row_group_size, 5000);
        assert!(!config.parquet.dictionary);
        assert!(config.parquet.statistics);

        let writer = config.writer_config();
        assert_eq!(writer.row_group_size(), 5000);
        assert!(!writer.is_dictionary_enabled());

        let credentials = config.credentials.as_ref().unwrap();
        assert_eq!(credentials.region.as_deref(), Some("us-west-2"));
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = PipelineConfig::from_yaml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_missing_output_is_startup_error() {
        let config = PipelineConfig::from_yaml_str("input: ./raw\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "output"));
        assert!(err.is_startup());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::default()
            .with_input("./raw")
            .with_output("./lake")
            .with_overwrite(OverwriteMode::Partition);
        config.validate().unwrap();
        assert_eq!(config.overwrite, OverwriteMode::Partition);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = PipelineConfig::new("./raw", "./lake");
        config.log_glob = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfigValue { .. })
        ));

        let mut config = PipelineConfig::new("./raw", "./lake");
        config.parquet.row_group_size = 0;
        assert!(config.validate().unwrap_err().is_startup());
    }

    #[test]
    fn test_bad_glob_rejected_up_front() {
        let mut config = PipelineConfig::new("./raw", "./lake");
        config.log_glob = "log_data//*.json".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Glob { .. }));
    }

    #[test]
    fn test_half_specified_credentials() {
        let mut config = PipelineConfig::new("s3://bucket/", "./lake");
        config.credentials = Some(StorageCredentials {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_enum_value() {
        let result = PipelineConfig::from_yaml_str("surrogate_key: random\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = StorageCredentials {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("wJalrXUtnFEMI".to_string()),
            region: Some("us-west-2".to_string()),
            ..Default::default()
        };
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(debug.contains("us-west-2"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "input: ./raw\noutput: ./lake\n").unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.output().unwrap(), "./lake");

        let missing = PipelineConfig::load(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_load_names_file_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "overwrite: [table\n").unwrap();

        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(err.is_startup());
        assert!(err.to_string().contains("broken.yaml"));
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
