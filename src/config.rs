//! Configuration for the ebivis ingestion core
//!
//! Settings load from a TOML file; every field has a default matching the
//! deployed instrument (loopback listener on port 5005, 7x7 grid, unbounded
//! trail, 15-entry frequency label table), so an empty or absent file yields
//! a working configuration.
//!
//! # Config Location
//!
//! With no explicit path, the platform config directory is probed:
//! - **Linux**: `~/.config/dev.ebivis/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.ebivis/config.toml`
//! - **Windows**: `%APPDATA%\dev.ebivis\config.toml`
//!
//! # Example
//!
//! ```toml
//! [listen]
//! addr = "127.0.0.1:5005"
//!
//! [grid]
//! width = 7
//! height = 7
//!
//! [trail]
//! max_points = 100000
//!
//! [ingest]
//! read_buffer_size = 16384
//! read_timeout_ms = 30000
//! ```

use crate::error::{Result, VisError};
use crate::types::{FrequencyLabels, DEFAULT_FREQUENCY_LABELS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "dev.ebivis";

/// Config filename inside the app config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Listener address used by the deployed instrument
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5005";

/// Grid dimension used by the deployed instrument
pub const DEFAULT_GRID_DIM: usize = 7;

/// Default size of one socket read in bytes
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// TCP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Address and port to bind
    pub addr: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_LISTEN_ADDR.parse().expect("default addr is valid"),
        }
    }
}

/// Prediction grid dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_DIM,
            height: DEFAULT_GRID_DIM,
        }
    }
}

/// Trail retention settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrailConfig {
    /// Maximum points to retain; `None` keeps everything for the process
    /// lifetime (the deployed behavior)
    pub max_points: Option<usize>,
}

/// Socket read settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Size of one socket read; one read is one message
    pub read_buffer_size: usize,
    /// Optional read timeout in milliseconds; `None` lets a silent client
    /// hold the connection forever (the deployed behavior)
    pub read_timeout_ms: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            read_timeout_ms: None,
        }
    }
}

impl IngestConfig {
    /// The configured read timeout as a `Duration`
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Frequency labels by bin position; indices past the end get a
    /// synthesized label
    pub frequency_labels: Vec<String>,
    pub listen: ListenConfig,
    pub grid: GridConfig,
    pub trail: TrailConfig,
    pub ingest: IngestConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frequency_labels: DEFAULT_FREQUENCY_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            listen: ListenConfig::default(),
            grid: GridConfig::default(),
            trail: TrailConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| VisError::Config(format!("failed to read {}: {}", path.display(), e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| VisError::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Check invariants the type system cannot express
    pub fn validate(&self) -> Result<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(VisError::Config(format!(
                "grid dimensions must be nonzero, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if self.ingest.read_buffer_size == 0 {
            return Err(VisError::Config(
                "read_buffer_size must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// The label table as a presentation type
    pub fn frequency_labels(&self) -> FrequencyLabels {
        FrequencyLabels::new(self.frequency_labels.clone())
    }
}

/// The platform config file path, if a config directory exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}
