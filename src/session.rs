//! Recording session coordination
//!
//! Thin composition layer over the capture and transcode components. Owns
//! the process-lifetime temp workspace that intermediate captures land in;
//! the workspace is removed wholesale on shutdown.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, bounded};
use tempfile::TempDir;

use crate::capture::{CaptureSession, Started};
use crate::config::{Config, Quality};
use crate::domain::Region;
use crate::error::{CaptureError, EncodeError};
use crate::transcode::{self, TranscodePipeline};

/// One application run's recorder: workspace, capture session, transcoder
pub struct Recorder {
    config: Config,
    workdir: TempDir,
    capture: CaptureSession,
    transcode: TranscodePipeline,
}

impl Recorder {
    /// Create the recorder and its temp workspace
    pub fn new(config: Config) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("grabcast-")
            .tempdir()
            .context("failed to create capture workspace")?;
        log::debug!("capture workspace: {}", workdir.path().display());
        Ok(Self {
            capture: CaptureSession::new(&config),
            transcode: TranscodePipeline::new(&config),
            config,
            workdir,
        })
    }

    /// Unique intermediate path for one recording
    ///
    /// Timestamped to the millisecond so repeated recordings in one session
    /// never collide.
    fn intermediate_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
        self.workdir.path().join(format!(
            "capture-{stamp}.{}",
            self.config.intermediate_container.extension()
        ))
    }

    /// Start recording `region` into a fresh intermediate file
    pub fn start(&mut self, region: Region) -> Result<(Started, PathBuf), CaptureError> {
        let path = self.intermediate_path();
        let started = self.capture.start(region, &path)?;
        Ok((started, path))
    }

    /// Stop the capture; returns the intermediate path if one was running
    pub fn stop(&mut self) -> Option<PathBuf> {
        self.capture.stop()
    }

    pub fn is_recording(&mut self) -> bool {
        self.capture.is_active()
    }

    /// Blocking encode, then intermediate cleanup on success
    pub fn commit(&self, source: &Path, dest: &Path, quality: Quality) -> Result<(), EncodeError> {
        self.transcode.encode(source, dest, quality)?;
        transcode::delete_intermediate(source);
        Ok(())
    }

    /// Run [`Recorder::commit`] on a worker thread
    ///
    /// The encode contract stays blocking; this is the offload seam for
    /// interactive callers, which receive the result over the returned
    /// channel instead of stalling their control thread. An in-flight encode
    /// cannot be cancelled.
    pub fn commit_background(
        &self,
        source: PathBuf,
        dest: PathBuf,
        quality: Quality,
    ) -> Receiver<Result<(), EncodeError>> {
        let pipeline = self.transcode.clone();
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let result = pipeline
                .encode(&source, &dest, quality)
                .map(|()| transcode::delete_intermediate(&source));
            let _ = tx.send(result);
        });
        rx
    }

    /// Drop the intermediate without encoding (the user discarded the take)
    pub fn discard(&self, source: &Path) {
        transcode::delete_intermediate(source);
    }

    /// Stop any in-flight capture and remove the workspace wholesale
    ///
    /// Missing files and directories are tolerated; failures are logged,
    /// never raised.
    pub fn shutdown(mut self) {
        if let Some(path) = self.capture.stop() {
            log::warn!("capture was still running at shutdown: {}", path.display());
        }
        let path = self.workdir.path().to_path_buf();
        if let Err(e) = self.workdir.close() {
            log::warn!("failed to remove capture workspace {}: {e}", path.display());
        }
    }

    /// Persist the workspace instead of removing it, e.g. to salvage a raw
    /// capture after a failed transcode; returns its path
    pub fn keep_workspace(self) -> PathBuf {
        self.workdir.keep()
    }
}
