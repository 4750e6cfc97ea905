//! # Engine Errors
//!
//! Error type for the service layer: configuration, catalog sources, cart
//! input and the database underneath.
//!
//! ```text
//! DbError ─────────────┐
//! std::io::Error ──────┤
//! serde_json::Error ───┼──► EngineError ──► apply_promotions logs it and
//! toml::de::Error ─────┤                    returns the cart unchanged
//! ValidationError ─────┘                    (try_apply_promotions returns it)
//! ```

use std::path::PathBuf;

use tally_core::ValidationError;
use tally_db::DbError;
use thiserror::Error;

/// Errors raised by the promotion engine service.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The promotion catalog could not be read from the database.
    #[error("Promotion source unavailable: {0}")]
    Source(#[from] DbError),

    /// A JSON catalog is not a list of promotions.
    #[error("Invalid promotion catalog: {0}")]
    Catalog(String),

    /// Reading a config, catalog or cart file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON (cart or catalog).
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML config file.
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A config value parsed but is unusable.
    #[error("Invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// No home directory to derive config/data paths from.
    #[error("Could not determine platform config/data directories")]
    NoPlatformDirs,

    /// A cart line failed input validation.
    #[error("Invalid cart line {line_id}: {source}")]
    InvalidCart {
        line_id: String,
        #[source]
        source: ValidationError,
    },
}

impl EngineError {
    /// Wraps an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
