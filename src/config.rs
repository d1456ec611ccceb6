//! Engine configuration
//!
//! Both the column normalizer and the layout engine are tuned through plain
//! structs with defaults. A TOML file can override any subset of keys:
//!
//! ```toml
//! [normalizer]
//! sample_rows = 10
//!
//! [layout]
//! node_width = 240.0
//! max_children_per_row = 6
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::ingest::normalizer::NormalizerConfig;
use crate::layout::{LayoutConfig, LayoutError};

/// Errors that can occur when loading or parsing a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid layout settings: {0}")]
    Layout(#[from] LayoutError),
}

/// Configuration for the complete engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Column inference settings
    pub normalizer: NormalizerConfig,
    /// Tree layout settings
    pub layout: LayoutConfig,
}

impl EngineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: EngineConfig = toml::from_str(content)?;
        parsed.layout.validate()?;
        Ok(parsed)
    }

    /// Set the normalizer configuration
    pub fn with_normalizer(mut self, config: NormalizerConfig) -> Self {
        self.normalizer = config;
        self
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }
}
