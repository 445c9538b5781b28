//! Error types for songplay-lake
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for songplay-lake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("Failed to decode '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Schema mismatch in table '{table}': {message}")]
    SchemaMismatch { table: String, message: String },

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Table '{table}' has not been written to {location}")]
    TableNotFound { table: String, location: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a glob error
    pub fn glob(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Glob {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a missing table error
    pub fn table_not_found(table: impl Into<String>, location: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
            location: location.into(),
        }
    }

    /// Check if this error belongs to startup validation
    ///
    /// Startup errors are raised before any record is read, so nothing
    /// in the output location has been touched.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::YamlParse(_)
                | Error::Glob { .. }
                | Error::FileNotFound { .. }
        )
    }

    /// Check if this error came from the storage layer
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::ObjectStore(_) | Error::Storage { .. } | Error::Io(_)
        )
    }
}

/// Result type alias for songplay-lake
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
///
/// The wrapped error keeps its category: storage failures stay storage
/// failures and startup failures stay configuration errors.
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), message.into()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

fn wrap(inner: Error, message: String) -> Error {
    let message = format!("{message}: {inner}");
    if inner.is_storage() {
        Error::storage(message)
    } else if inner.is_startup() {
        Error::config(message)
    } else {
        Error::Other(message)
    }
}
