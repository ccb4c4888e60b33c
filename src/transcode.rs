//! Post-capture re-encode pipeline
//!
//! Converts the raw intermediate into the final deliverable at a requested
//! quality, synchronously, via the external encoder. The blocking contract
//! is deliberate: callers that need responsiveness go through
//! [`crate::session::Recorder::commit_background`].

use std::path::Path;
use std::process::Command;

use crate::config::{Config, Quality};
use crate::error::EncodeError;
use crate::ffmpeg;

/// Blocking front end for the external re-encode
#[derive(Debug, Clone)]
pub struct TranscodePipeline {
    program: String,
}

impl TranscodePipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.ffmpeg_program.clone(),
        }
    }

    /// Re-encode `source` into `dest` at `quality`
    ///
    /// Blocks the calling thread for the full encode. On success `dest` is a
    /// complete, independently playable artifact; `source` is left untouched
    /// either way (cleanup is a separate explicit step, see
    /// [`delete_intermediate`]). A non-zero encoder exit is not retried.
    pub fn encode(&self, source: &Path, dest: &Path, quality: Quality) -> Result<(), EncodeError> {
        let program = ffmpeg::resolve_tool(&self.program)
            .ok_or_else(|| EncodeError::ToolNotFound(self.program.clone()))?;
        if !source.exists() {
            return Err(EncodeError::SourceMissing(source.to_path_buf()));
        }

        log::info!(
            "re-encoding {} -> {} (crf {})",
            source.display(),
            dest.display(),
            quality.crf()
        );
        let output = Command::new(&program)
            .args(ffmpeg::transcode_args(source, dest, quality))
            .output()
            .map_err(|e| EncodeError::TranscodeFailed {
                diagnostics: format!("failed to run {}: {e}", program.display()),
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostics = format!(
                "{}: {}",
                output.status,
                [stdout.trim(), stderr.trim()].join("\n").trim()
            );
            log::error!("encoder failed: {diagnostics}");
            return Err(EncodeError::TranscodeFailed { diagnostics });
        }

        log::info!("re-encode finished: {}", dest.display());
        Ok(())
    }
}

/// Best-effort intermediate cleanup
///
/// A missing file is a no-op; any other failure is logged and swallowed so
/// cleanup can never block the commit/discard flow the user is waiting on.
pub fn delete_intermediate(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::info!("deleted intermediate {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("intermediate {} already gone", path.display());
        }
        Err(e) => log::warn!("failed to delete intermediate {}: {e}", path.display()),
    }
}
