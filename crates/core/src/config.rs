//! Engine configuration
//!
//! Loaded from TOML; every field has a default so a missing or partial file
//! still yields a working engine. The active configuration lives behind a
//! process-wide lock and is consulted at resolution time, so changes take
//! effect for subsequent lookups (memoized resolutions keep the behavior
//! they were resolved under).

use std::path::Path;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level engine configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub resolver: ResolverSection,
}

/// Name-resolution behavior
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResolverSection {
    /// Consult attribute aliases (display, serialized, column, table,
    /// schema) when no structural member matches
    pub alias_fallback: bool,
    /// Retry alias comparison with spaces, hyphens, underscores, and dots
    /// stripped from both sides
    pub fold_punctuation: bool,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            alias_fallback: true,
            fold_punctuation: true,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Write the current values out as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

static ACTIVE: LazyLock<RwLock<EngineConfig>> = LazyLock::new(|| RwLock::new(EngineConfig::default()));

/// Snapshot of the active configuration
pub fn engine_config() -> EngineConfig {
    ACTIVE.read().clone()
}

/// Replace the active configuration
pub fn set_engine_config(config: EngineConfig) {
    *ACTIVE.write() = config;
}
