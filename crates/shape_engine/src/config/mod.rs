//! Configuration system
//!
//! Handler settings can be kept in `.toml` or `.ron` files and loaded through
//! the [`Config`] trait.

pub use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_str_with_format(&contents, format)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = self.to_string_with_format(ConfigFormat::from_path(path)?)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from an in-memory string
    fn from_str_with_format(contents: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Serialize configuration into a string
    fn to_string_with_format(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string())),
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }
}

/// On-disk configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (`.toml`)
    Toml,
    /// Rusty Object Notation (`.ron`)
    Ron,
}

impl ConfigFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            Ok(Self::Toml)
        } else if path.ends_with(".ron") {
            Ok(Self::Ron)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// World-space rectangle covered by the spatial hash
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsConfig {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl From<BoundsConfig> for Rect {
    fn from(bounds: BoundsConfig) -> Self {
        Rect::new(bounds.x, bounds.y, bounds.width, bounds.height)
    }
}

impl From<Rect> for BoundsConfig {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Collision handler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Region covered by the spatial hash grid
    pub bounds: BoundsConfig,

    /// Grid rows
    pub rows: usize,

    /// Grid columns
    pub cols: usize,

    /// Initial capacity of the handler's internal collections
    pub start_capacity: usize,

    /// Edge count used when a circle has to be turned into a polygon
    pub circle_edge_count: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsConfig::default(),
            rows: 10,
            cols: 10,
            start_capacity: 1024,
            circle_edge_count: 16,
        }
    }
}

impl Config for CollisionConfig {}
