//! Error types for reelplay-core

use std::fmt::Write;
use thiserror::Error;

/// Remediation command for resolving an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a suggested command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for reelplay-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Playback control errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Audio asset errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Runtime errors (segment loading, channel failures, etc.)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::Config(err) => Some(err.remediation()),
            Self::Playback(err) => Some(err.remediation()),
            Self::Audio(err) => Some(err.remediation()),
            Self::Io(_) => Some(
                Remediation::new("Check that the recording path exists and is readable.")
                    .alternative("Pass an absolute path to the recording file."),
            ),
            Self::Json(_) => Some(
                Remediation::new("Validate the recording JSON and retry.")
                    .command("Validate JSON", "python -m json.tool < recording.json")
                    .alternative("A recording is a JSON array of segments with `records`."),
            ),
            Self::Runtime(_) => None,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Read { .. } => Remediation::new("Check the config path and permissions.")
                .alternative("Omit --config to run with built-in defaults."),
            Self::Parse(_) => Remediation::new("Fix the TOML syntax in the config file.")
                .alternative("Every section ([playback], [audio], [logging]) is optional."),
            Self::Invalid(_) => Remediation::new(
                "Use positive values for intervals, tick rates and bucket counts.",
            ),
        }
    }
}

/// Playback control errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("invalid playback speed {0}; speed must be finite and >= 0")]
    InvalidSpeed(f64),

    #[error("playback was stopped; restart is required to replay from the beginning")]
    RestartRequired,

    #[error("records can only be pushed while the active segment is live")]
    NotLive,

    #[error("segment source has no initial segment")]
    NoSegments,

    #[error("failed to load segment {index}: {message}")]
    SegmentLoad { index: usize, message: String },
}

impl PlaybackError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::InvalidSpeed(_) => Remediation::new("Pass a speed such as 0.5, 1, 2 or 4.")
                .alternative("Speed 0 pauses playback."),
            Self::RestartRequired => Remediation::new("Call restart() to replay from segment 0."),
            Self::NotLive => {
                Remediation::new("Recorded segments advance on the frame timeline; push records only in live mode.")
            }
            Self::NoSegments => Remediation::new("Provide a recording with at least one segment."),
            Self::SegmentLoad { .. } => Remediation::new("Check the segment source and retry."),
        }
    }
}

/// Audio asset resolution errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("invalid base64 audio buffer: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("audio buffer of {len} bytes is not a whole number of f32 samples")]
    MisalignedBuffer { len: usize },

    #[error("unsupported sample width: {0} bits (expected 8 or 16)")]
    UnsupportedSampleBits(u16),

    #[error("audio must declare at least one channel")]
    NoChannels,

    #[error("failed to encode WAV container: {0}")]
    Encode(#[from] hound::Error),

    #[error("invalid audio url: {0}")]
    Url(#[from] url::ParseError),
}

impl AudioError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        Remediation::new("Audio is disabled for this segment; visual playback continues.")
            .alternative("Re-export the recording with a direct audio `src` reference.")
    }
}
