use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{Error, Result};

/// Minimap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    /// Free text stored in the OTMM header
    pub description: String,
    /// zlib level used for each block
    pub compression_level: u32,
    /// A saved file must be larger than this to replace the previous save
    pub min_save_size: u64,
    /// Sprite atlas holding the marker icons
    pub marker_atlas: String,
    /// Edge of one marker icon in the atlas, in pixels
    pub marker_icon_size: i32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            description: "OTMM 1.0".into(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            min_save_size: 1024,
            marker_atlas: "/images/game/minimap/mapflags".into(),
            marker_icon_size: 11,
        }
    }
}

impl MinimapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    pub fn min_save_size(mut self, bytes: u64) -> Self {
        self.min_save_size = bytes;
        self
    }

    pub fn marker_atlas(mut self, path: impl Into<String>, icon_size: i32) -> Self {
        self.marker_atlas = path.into();
        self.marker_icon_size = icon_size;
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        if config.compression_level > 9 {
            return Err(Error::Config(format!(
                "compression_level {} out of range 0..=9",
                config.compression_level
            )));
        }
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MinimapConfig::from_json(r#"{ "min_save_size": 0, "description": "test" }"#).unwrap();
        assert_eq!(config.min_save_size, 0);
        assert_eq!(config.description, "test");
        assert_eq!(config.compression_level, 3);
        assert_eq!(config.marker_icon_size, 11);
    }

    #[test]
    fn test_rejects_bad_level() {
        assert!(matches!(
            MinimapConfig::from_json(r#"{ "compression_level": 12 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(MinimapConfig::from_json("[1, 2]"), Err(Error::Config(_))));
    }

    #[test]
    fn test_builder() {
        let config = MinimapConfig::new().compression_level(42).min_save_size(7).description("x");
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.min_save_size, 7);
        assert_eq!(config.description, "x");
    }
}
