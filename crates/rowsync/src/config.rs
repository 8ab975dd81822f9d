//! Coordinator configuration.
//!
//! [`CoordinatorConfig`] can be built in code or loaded from TOML or JSON.
//! Missing keys take their defaults.
//!
//! # Example
//!
//! ```
//! use rowsync::CoordinatorConfig;
//!
//! let config = CoordinatorConfig::from_toml_str("default_row_height = 44.0").unwrap();
//! assert_eq!(config.default_row_height, 44.0);
//! assert!(config.cache_row_sizes);
//!
//! let config = CoordinatorConfig::default().with_verify_batches(false);
//! assert!(!config.verify_batches);
//! ```
//!
//! # File Format
//!
//! ```toml
//! default_row_height = 30.0
//! cache_row_sizes = true
//! verify_batches = true
//! ```

use std::path::Path;

use rowsync_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::DEFAULT_ROW_HEIGHT;

/// Tunables for an [`UpdateCoordinator`](crate::model::UpdateCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Row height for items whose renderer has no height function.
    pub default_row_height: f32,
    /// Remember row heights per address until the address's section changes.
    pub cache_row_sizes: bool,
    /// Check every batch against the host's mirrored row counts before the
    /// host sees it.
    pub verify_batches: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_row_height: DEFAULT_ROW_HEIGHT,
            cache_row_sizes: true,
            verify_batches: true,
        }
    }
}

impl CoordinatorConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str::<Self>(source)
            .map_err(|e| Error::config(format!("invalid TOML: {e}")))
            .and_then(Self::validated)
    }

    /// Parses a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str::<Self>(source)
            .map_err(|e| Error::config(format!("invalid JSON: {e}")))
            .and_then(Self::validated)
    }

    /// Loads a configuration file, choosing the format by extension
    /// (`.toml` or `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(Error::config(format!(
                    "unsupported configuration format: {}",
                    path.display()
                )));
            }
        };

        tracing::debug!(
            target: targets::CONFIG,
            path = %path.display(),
            ?config,
            "loaded coordinator configuration"
        );
        Ok(config)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(format!("failed to serialize: {e}")))
    }

    /// Set the default row height.
    pub fn with_default_row_height(mut self, height: f32) -> Self {
        self.default_row_height = height;
        self
    }

    /// Enable or disable the per-address size cache.
    pub fn with_cache_row_sizes(mut self, enabled: bool) -> Self {
        self.cache_row_sizes = enabled;
        self
    }

    /// Enable or disable batch verification.
    pub fn with_verify_batches(mut self, enabled: bool) -> Self {
        self.verify_batches = enabled;
        self
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.default_row_height.is_finite() || self.default_row_height < 0.0 {
            return Err(Error::config(format!(
                "default_row_height must be a non-negative number, got {}",
                self.default_row_height
            )));
        }
        Ok(())
    }

    fn validated(self) -> Result<Self> {
        self.validate().map(|()| self)
    }
}
