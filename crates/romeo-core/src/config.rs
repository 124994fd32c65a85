//! Runtime configuration, loaded from JSON.
//!
//! Every field has a default, so an empty object is a valid configuration:
//!
//! ```json
//! { "recorder": { "base_thickness": 12.0 }, "link": { "room": "kitchen" } }
//! ```

use crate::presence::PresenceConfig;
use crate::recorder::RecorderConfig;
use crate::stroke::StrokeColor;
use crate::touch_through::TouchThroughConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the peer link connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub relay_url: String,
    pub room: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://localhost:3030/ws".to_string(),
            room: "romeo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomeoConfig {
    pub recorder: RecorderConfig,
    pub presence: PresenceConfig,
    pub touch_through: TouchThroughConfig,
    pub link: LinkConfig,
    /// Pen colors offered to the user. The first one is selected at start.
    pub palette: Vec<StrokeColor>,
}

impl Default for RomeoConfig {
    fn default() -> Self {
        Self {
            recorder: RecorderConfig::default(),
            presence: PresenceConfig::default(),
            touch_through: TouchThroughConfig::default(),
            link: LinkConfig::default(),
            palette: vec![
                StrokeColor::BLACK,
                StrokeColor::RED,
                StrokeColor::GREEN,
                StrokeColor::BLUE,
            ],
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

impl RomeoConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("recorder.base_thickness", self.recorder.base_thickness)?;
        positive("recorder.density", self.recorder.density)?;
        positive("recorder.tap_offset", self.recorder.tap_offset)?;
        positive("touch_through.radius_x", self.touch_through.radius_x)?;
        positive("touch_through.radius_y", self.touch_through.radius_y)?;

        if self.palette.is_empty() {
            return Err(ConfigError::Invalid("palette is empty".to_string()));
        }
        let url = &self.link.relay_url;
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "link.relay_url must use ws:// or wss://, got {url}"
            )));
        }
        if self.link.room.trim().is_empty() {
            return Err(ConfigError::Invalid("link.room is empty".to_string()));
        }
        Ok(())
    }

    /// Default pen color.
    pub fn default_color(&self) -> StrokeColor {
        self.palette.first().copied().unwrap_or_default()
    }
}
