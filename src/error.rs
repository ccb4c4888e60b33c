//! Error taxonomy for the capture and transcode pipelines
//!
//! Every variant is a recoverable-by-the-caller condition; nothing here ever
//! terminates the host process. App-level composition errors (workspace
//! creation, CLI flow) use `anyhow` instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the capture process lifecycle.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The encoder binary could not be resolved before spawning.
    #[error("encoder `{0}` not found on PATH")]
    ToolNotFound(String),

    /// A capture process is already running; the existing session is untouched.
    #[error("a capture is already running (pid {0})")]
    AlreadyRunning(u32),

    /// The OS-level spawn failed; the session stays idle.
    #[error("failed to spawn encoder: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

/// Errors from the post-capture re-encode.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The encoder binary could not be resolved before spawning.
    #[error("encoder `{0}` not found on PATH")]
    ToolNotFound(String),

    /// The intermediate file to re-encode does not exist.
    #[error("source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A quality level string outside the three recognized presets.
    #[error("unrecognized quality level `{0}` (expected low, medium or high)")]
    InvalidQuality(String),

    /// The encoder ran and failed; `diagnostics` carries its exit status and
    /// combined stdout/stderr for surfacing to the user.
    #[error("transcode failed: {diagnostics}")]
    TranscodeFailed { diagnostics: String },
}
