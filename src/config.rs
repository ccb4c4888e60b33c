//! Recorder configuration and quality presets
//!
//! Configuration is in-memory only; nothing is persisted between runs.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// Quality preset for the final encode
///
/// Maps to the encoder's constant rate factor; lower CRF means higher quality
/// and a larger file. Applied once, at transcode time: re-encoding is lossy
/// and one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    /// CRF 28, smallest file
    Low,
    /// CRF 23, balanced
    #[default]
    Medium,
    /// CRF 18, largest file
    High,
}

impl Quality {
    /// Constant rate factor handed to the encoder
    pub fn crf(self) -> u32 {
        match self {
            Quality::Low => 28,
            Quality::Medium => 23,
            Quality::High => 18,
        }
    }
}

impl FromStr for Quality {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            _ => Err(EncodeError::InvalidQuality(s.to_string())),
        }
    }
}

/// Video container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Container {
    /// Stays readable even when the recorder is killed mid-write
    #[default]
    Mkv,
    Mp4,
}

impl Container {
    /// Get file extension for this container
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mkv => "mkv",
            Container::Mp4 => "mp4",
        }
    }
}

/// Recorder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Encoder program name or path, resolved on PATH at use time
    pub ffmpeg_program: String,
    /// X11 display to capture from (None = $DISPLAY, then ":0.0")
    pub display: Option<String>,
    /// Capture framerate
    pub framerate: u32,
    /// Container for the raw intermediate file
    pub intermediate_container: Container,
}

impl Config {
    /// Display string handed to the capture leg
    pub fn display(&self) -> String {
        self.display
            .clone()
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_else(|| ":0.0".to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_program: "ffmpeg".to_string(),
            display: None,
            framerate: 30,
            intermediate_container: Container::Mkv,
        }
    }
}
