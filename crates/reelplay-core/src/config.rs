//! Configuration management for reelplay
//!
//! Handles loading and validation of reelplay.toml configuration files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LogConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayConfig {
    /// Scheduler settings
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Audio sync settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Spacing of the frame timeline in milliseconds
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Upper bound on ticks delivered per second
    #[serde(default = "default_max_ticks")]
    pub max_ticks_per_sec: u32,

    /// Delay between a segment handoff and the renderer view reset
    #[serde(default = "default_switch_grace")]
    pub switch_grace_ms: u64,

    /// Number of heatmap buckets across the whole recording
    #[serde(default = "default_heat_buckets")]
    pub heat_buckets: usize,

    /// Speed used by `play()` when no speed was chosen yet
    #[serde(default = "default_speed")]
    pub initial_speed: f64,

    /// How long a pending segment fetch may hold playback before a stall is reported
    #[serde(default = "default_stall_report")]
    pub stall_report_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            max_ticks_per_sec: default_max_ticks(),
            switch_grace_ms: default_switch_grace(),
            heat_buckets: default_heat_buckets(),
            initial_speed: default_speed(),
            stall_report_ms: default_stall_report(),
        }
    }
}

impl PlaybackConfig {
    /// Tick period derived from the tick-rate cap.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.max_ticks_per_sec.max(1)
    }

    #[must_use]
    pub fn switch_grace(&self) -> Duration {
        Duration::from_millis(self.switch_grace_ms)
    }
}

fn default_frame_interval() -> u64 {
    crate::timeline::DEFAULT_FRAME_INTERVAL_MS
}

fn default_max_ticks() -> u32 {
    crate::tick::MAX_TICKS_PER_SEC
}

fn default_switch_grace() -> u64 {
    300
}

fn default_heat_buckets() -> usize {
    crate::heatmap::DEFAULT_HEAT_BUCKETS
}

fn default_speed() -> f64 {
    1.0
}

fn default_stall_report() -> u64 {
    1000
}

/// Audio sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Lead applied when positioning audio against elapsed time
    #[serde(default = "default_audio_offset")]
    pub offset_ms: u64,

    /// Drift tolerated on top of the offset before a resync
    #[serde(default = "default_allowed_diff")]
    pub allowed_diff_ms: u64,

    /// Wall-clock window between drift checks
    #[serde(default = "default_drift_check")]
    pub drift_check_ms: u64,

    /// Origin that relative audio references resolve against
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            offset_ms: default_audio_offset(),
            allowed_diff_ms: default_allowed_diff(),
            drift_check_ms: default_drift_check(),
            origin: default_origin(),
        }
    }
}

fn default_audio_offset() -> u64 {
    500
}

fn default_allowed_diff() -> u64 {
    200
}

fn default_drift_check() -> u64 {
    2000
}

fn default_origin() -> String {
    "http://localhost/".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected pretty or json")),
        }
    }
}

impl ReplayConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let playback = &self.playback;
        if playback.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("playback.frame_interval_ms must be > 0".into()));
        }
        if playback.max_ticks_per_sec == 0 {
            return Err(ConfigError::Invalid("playback.max_ticks_per_sec must be > 0".into()));
        }
        if playback.heat_buckets == 0 {
            return Err(ConfigError::Invalid("playback.heat_buckets must be > 0".into()));
        }
        if !playback.initial_speed.is_finite() || playback.initial_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "playback.initial_speed must be > 0, got {}",
                playback.initial_speed
            )));
        }
        if self.audio.drift_check_ms == 0 {
            return Err(ConfigError::Invalid("audio.drift_check_ms must be > 0".into()));
        }
        url::Url::parse(&self.audio.origin)
            .map_err(|e| ConfigError::Invalid(format!("audio.origin: {e}")))?;
        Ok(())
    }
}
