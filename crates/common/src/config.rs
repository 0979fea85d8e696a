//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ClipdeckError, ClipdeckResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where rendered assets are written.
    pub output_dir: PathBuf,

    /// Default recording settings.
    pub recording: RecordingDefaults,

    /// Animated-quote defaults.
    pub animation: AnimationDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Encoder quality tier, chosen before a recording starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    /// Parse a tier name as typed on the command line.
    pub fn parse(name: &str) -> ClipdeckResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ClipdeckError::invalid_input(format!(
                "Unknown quality tier '{other}'. Use: low, medium, high"
            ))),
        }
    }
}

/// Target video bit-rate per quality tier, in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateTiers {
    pub low_bps: u32,
    pub medium_bps: u32,
    pub high_bps: u32,
}

impl BitrateTiers {
    pub fn for_quality(&self, quality: Quality) -> u32 {
        match quality {
            Quality::Low => self.low_bps,
            Quality::Medium => self.medium_bps,
            Quality::High => self.high_bps,
        }
    }
}

impl Default for BitrateTiers {
    fn default() -> Self {
        Self {
            low_bps: 1_000_000,
            medium_bps: 2_500_000,
            high_bps: 5_000_000,
        }
    }
}

/// Default recording parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingDefaults {
    /// Capture frame rate.
    pub fps: u32,

    /// Quality tier used when the caller does not pick one.
    pub quality: Quality,

    /// Bit-rate for each tier.
    pub bitrates: BitrateTiers,
}

/// Animated-quote rendering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationDefaults {
    /// Total animation length in milliseconds.
    pub duration_ms: u64,

    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// Background theme name.
    pub theme: String,

    /// TrueType/OpenType font used for title and author text.
    pub font_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipdeck=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            recording: RecordingDefaults::default(),
            animation: AnimationDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RecordingDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            quality: Quality::Medium,
            bitrates: BitrateTiers::default(),
        }
    }
}

impl Default for AnimationDefaults {
    fn default() -> Self {
        Self {
            duration_ms: 5000,
            width: 1280,
            height: 720,
            theme: "sunset".to_string(),
            font_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse a config document; missing fields take their defaults.
    pub fn from_json(content: &str) -> ClipdeckResult<Self> {
        serde_json::from_str(content).map_err(|e| ClipdeckError::config(e.to_string()))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipdeck").join("config.json")
}
