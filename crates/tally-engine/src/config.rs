//! # Engine Configuration
//!
//! Which store's catalog to read, where it lives, and how the store's clock
//! is read.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_WORKSPACE_ID, TALLY_DB_PATH,                                 │
//! │     TALLY_UTC_OFFSET_MINUTES, TALLY_LOG                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/promotions.toml (Linux)                              │
//! │     ~/Library/Application Support/com.tally.pos/promotions.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     default workspace, host timezone, platform data dir database       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! workspace_id = "store-downtown"
//! utc_offset_minutes = 300  # optional, minutes east of UTC
//!
//! [database]
//! path = "/var/lib/tally/tally.db"
//! max_connections = 5
//!
//! [logging]
//! filter = "info,tally=debug"
//! ```

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tally_core::{SystemClock, DEFAULT_WORKSPACE_ID};
use tally_db::DbConfig;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

/// Largest offset any real timezone uses (UTC+14).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Sections
// =============================================================================

/// Which store this till prices for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Workspace whose promotion catalog is evaluated.
    #[serde(default = "default_workspace_id")]
    pub workspace_id: String,

    /// Minutes east of UTC used for weekday and time-of-day conditions.
    /// Unset: the host's local timezone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_workspace_id() -> String {
    DEFAULT_WORKSPACE_ID.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            workspace_id: default_workspace_id(),
            utc_offset_minutes: None,
        }
    }
}

/// Promotion catalog database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Unset: `tally.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Log filter (`RUST_LOG` syntax). `RUST_LOG` itself still wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`path`, or the platform default if it exists)
    /// 3. Environment variables
    ///
    /// An explicitly given file must exist; the platform default is optional.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn read_file(path: &Path) -> EngineResult<Self> {
        info!(?path, "Loading engine config from file");
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    ///
    /// `load` passes the process environment; tests pass a map.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("TALLY_WORKSPACE_ID") {
            debug!(workspace_id = %id, "Overriding workspace from environment");
            self.store.workspace_id = id;
        }

        if let Some(path) = lookup("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(offset) = lookup("TALLY_UTC_OFFSET_MINUTES") {
            match offset.trim().parse::<i32>() {
                Ok(minutes) => self.store.utc_offset_minutes = Some(minutes),
                Err(_) => warn!(value = %offset, "Ignoring unparseable TALLY_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(filter) = lookup("TALLY_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.store.workspace_id.trim().is_empty() {
            return Err(EngineError::invalid_config(
                "store.workspace_id",
                "must not be empty",
            ));
        }

        if let Some(minutes) = self.store.utc_offset_minutes {
            if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) {
                return Err(EngineError::invalid_config(
                    "store.utc_offset_minutes",
                    format!(
                        "{} is outside ±{} minutes",
                        minutes, MAX_UTC_OFFSET_MINUTES
                    ),
                ));
            }
        }

        if self.database.max_connections == 0 {
            return Err(EngineError::invalid_config(
                "database.max_connections",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Default config file path (`promotions.toml` in the platform config dir).
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("promotions.toml"))
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// The configured store offset, if any.
    pub fn utc_offset(&self) -> EngineResult<Option<FixedOffset>> {
        match self.store.utc_offset_minutes {
            None => Ok(None),
            Some(minutes) => FixedOffset::east_opt(minutes * 60).map(Some).ok_or_else(|| {
                EngineError::invalid_config("store.utc_offset_minutes", minutes.to_string())
            }),
        }
    }

    /// System clock reading in the store's offset.
    pub fn clock(&self) -> EngineResult<SystemClock> {
        Ok(match self.utc_offset()? {
            Some(offset) => SystemClock::with_offset(offset),
            None => SystemClock::new(),
        })
    }

    /// Database file path.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/com.tally.pos/tally.db`
    /// - **Windows**: `%APPDATA%\tally\pos\data\tally.db`
    /// - **Linux**: `~/.local/share/pos/tally.db`
    ///
    /// The platform data directory is created when it doesn't exist.
    pub fn database_path(&self) -> EngineResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or(EngineError::NoPlatformDirs)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|e| EngineError::io(data_dir, e))?;

        Ok(data_dir.join("tally.db"))
    }

    /// Pool configuration for the catalog database.
    pub fn db_config(&self) -> EngineResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?).max_connections(self.database.max_connections))
    }

    /// Workspace whose catalog is evaluated.
    pub fn workspace_id(&self) -> &str {
        &self.store.workspace_id
    }

    /// Configured log filter, if any.
    pub fn log_filter(&self) -> Option<&str> {
        self.logging.filter.as_deref()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tally", "pos")
}
