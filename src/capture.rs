//! Capture process lifecycle
//!
//! Owns the external encoder child for the duration of one recording. The
//! child communicates with us only through process lifecycle signals and the
//! shared output path; stopping escalates SIGTERM to SIGKILL on a fixed
//! deadline so the encoder gets a window to finalize its container.

use std::mem;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::config::Config;
use crate::domain::Region;
use crate::error::CaptureError;
use crate::ffmpeg;

/// How long a stopped encoder gets to finalize its container before SIGKILL
pub const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Successful start: the capture process is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    pub pid: u32,
}

enum SessionState {
    Idle,
    Running { child: Child, output: PathBuf },
}

/// One recording's worth of external-process ownership
///
/// `Idle -> Running -> Idle`; at most one child is live at a time. The handle
/// lives inside the session value rather than a process-wide singleton, so
/// sessions never cross-contaminate in tests.
pub struct CaptureSession {
    state: SessionState,
    program: String,
    display: String,
    framerate: u32,
    graceful_timeout: Duration,
}

impl CaptureSession {
    pub fn new(config: &Config) -> Self {
        Self {
            state: SessionState::Idle,
            program: config.ffmpeg_program.clone(),
            display: config.display(),
            framerate: config.framerate,
            graceful_timeout: GRACEFUL_STOP_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn set_graceful_timeout(&mut self, timeout: Duration) {
        self.graceful_timeout = timeout;
    }

    /// Spawn the capture process for `region`, writing to `output`
    ///
    /// Non-blocking: returns as soon as the child is live. `region` must have
    /// nonzero area; the selector and the CLI parser both guarantee it.
    pub fn start(&mut self, region: Region, output: &Path) -> Result<Started, CaptureError> {
        debug_assert!(!region.is_empty(), "capture region must have nonzero area");

        if let SessionState::Running { child, .. } = &mut self.state {
            match child.try_wait() {
                Ok(None) => return Err(CaptureError::AlreadyRunning(child.id())),
                Ok(Some(status)) => {
                    log::warn!("previous capture process exited on its own ({status}), replacing it");
                }
                Err(e) => {
                    log::error!("failed to poll previous capture process: {e}");
                    return Err(CaptureError::AlreadyRunning(child.id()));
                }
            }
        }

        let program = ffmpeg::resolve_tool(&self.program)
            .ok_or_else(|| CaptureError::ToolNotFound(self.program.clone()))?;

        let child = Command::new(&program)
            .args(ffmpeg::capture_args(
                &self.display,
                self.framerate,
                region,
                output,
            ))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let pid = child.id();
        log::info!(
            "capture started (pid {pid}): {} at {},{} on {} -> {}",
            region.size_label(),
            region.x,
            region.y,
            self.display,
            output.display()
        );
        self.state = SessionState::Running {
            child,
            output: output.to_path_buf(),
        };
        Ok(Started { pid })
    }

    /// Stop the running capture and hand back the intermediate path
    ///
    /// SIGTERM first so the encoder can write its trailer, SIGKILL once the
    /// deadline passes. A force-killed child may leave a truncated file; the
    /// path is returned regardless so the caller can attempt playback and let
    /// the user decide.
    pub fn stop(&mut self) -> Option<PathBuf> {
        match mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => {
                log::debug!("stop requested with no active capture");
                None
            }
            SessionState::Running { child, output } => {
                terminate(child, self.graceful_timeout);
                Some(output)
            }
        }
    }

    /// True while the capture process is live
    ///
    /// A child that exited on its own is reported inactive but stays
    /// harvestable: state is untouched and [`CaptureSession::stop`] still
    /// returns the output path. There is no background watchdog; callers
    /// poll this.
    pub fn is_active(&mut self) -> bool {
        match &mut self.state {
            SessionState::Idle => false,
            SessionState::Running { child, .. } => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    log::warn!("capture process exited on its own: {status}");
                    false
                }
                Err(e) => {
                    log::error!("failed to poll capture process: {e}");
                    false
                }
            },
        }
    }
}

/// SIGTERM, a deadline-bounded wait, then SIGKILL and an unconditional wait
///
/// The wait runs on a helper thread so the deadline is a single
/// `recv_timeout` against a monotonic clock rather than a sleep-poll loop.
/// The child stays unreaped until the helper's `wait` returns, so the pid
/// cannot be reused out from under the SIGKILL.
fn terminate(mut child: Child, timeout: Duration) {
    let pid = child.id();
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // ESRCH means it already exited; the wait below reaps it
        log::debug!("SIGTERM to capture process {pid} failed: {e}");
    }

    let (tx, rx) = bounded(1);
    let waiter = thread::spawn(move || {
        let _ = tx.send(child.wait());
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(status)) => log::info!("capture process {pid} exited: {status}"),
        Ok(Err(e)) => log::error!("failed waiting for capture process {pid}: {e}"),
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("capture process {pid} still alive after {timeout:?}, force killing");
            if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                log::error!("SIGKILL to capture process {pid} failed: {e}");
            }
            match rx.recv() {
                Ok(Ok(status)) => log::info!("capture process {pid} killed: {status}"),
                Ok(Err(e)) => log::error!("failed waiting for killed process {pid}: {e}"),
                Err(e) => log::error!("capture waiter for {pid} vanished: {e}"),
            }
        }
        Err(RecvTimeoutError::Disconnected) => {
            log::error!("capture waiter for {pid} vanished before reporting");
        }
    }
    let _ = waiter.join();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encoder_config, instant_exit_stub, recording_stub, stubborn_stub};
    use std::time::Instant;

    #[test]
    fn test_stop_on_idle_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let stub = recording_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));
        assert_eq!(session.stop(), None);
        assert!(!session.is_active());
    }

    #[test]
    fn test_start_fails_fast_when_tool_missing() {
        let mut session = CaptureSession::new(&encoder_config(Path::new(
            "grabcast-missing-encoder",
        )));
        let err = session
            .start(Region::new(0, 0, 800, 600), Path::new("/tmp/unused.mkv"))
            .unwrap_err();
        assert!(matches!(err, CaptureError::ToolNotFound(_)));
        // the failed start must leave the session idle
        assert!(!session.is_active());
        assert_eq!(session.stop(), None);
    }

    #[test]
    fn test_second_start_is_rejected_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let stub = recording_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));
        let output = dir.path().join("take.mkv");

        let started = session.start(Region::new(0, 0, 800, 600), &output).unwrap();
        let err = session
            .start(Region::new(0, 0, 100, 100), &output)
            .unwrap_err();
        assert!(matches!(err, CaptureError::AlreadyRunning(pid) if pid == started.pid));
        // the original session must be intact
        assert!(session.is_active());
        assert_eq!(session.stop(), Some(output));
    }

    #[test]
    fn test_graceful_stop_returns_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let stub = recording_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));
        let output = dir.path().join("take.mkv");

        session.start(Region::new(0, 0, 800, 600), &output).unwrap();
        assert!(session.is_active());
        thread::sleep(Duration::from_millis(300));

        let path = session.stop().expect("stop should hand back the path");
        assert_eq!(path, output);
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert!(!session.is_active());
        // a second stop is a logged no-op
        assert_eq!(session.stop(), None);
    }

    #[test]
    fn test_stop_right_after_start_still_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let stub = recording_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));
        let output = dir.path().join("warmup.mkv");

        session.start(Region::new(0, 0, 10, 10), &output).unwrap();
        assert_eq!(session.stop(), Some(output));
    }

    #[test]
    fn test_stop_escalates_to_sigkill_after_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stubborn_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));
        session.set_graceful_timeout(Duration::from_millis(200));
        let output = dir.path().join("stuck.mkv");

        session.start(Region::new(0, 0, 10, 10), &output).unwrap();
        thread::sleep(Duration::from_millis(100));

        let begun = Instant::now();
        assert_eq!(session.stop(), Some(output));
        // the graceful window must have elapsed before the kill landed
        assert!(begun.elapsed() >= Duration::from_millis(200));
        assert!(!session.is_active());
    }

    #[test]
    fn test_self_exited_child_is_inactive_but_harvestable() {
        let dir = tempfile::tempdir().unwrap();
        let stub = instant_exit_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));
        let output = dir.path().join("short.mkv");

        session.start(Region::new(0, 0, 10, 10), &output).unwrap();
        thread::sleep(Duration::from_millis(300));

        assert!(!session.is_active());
        // stop still hands the path over for playback inspection
        assert_eq!(session.stop(), Some(output));
    }

    #[test]
    fn test_start_replaces_a_child_that_died_on_its_own() {
        let dir = tempfile::tempdir().unwrap();
        let stub = instant_exit_stub(&dir);
        let mut session = CaptureSession::new(&encoder_config(&stub));

        session
            .start(Region::new(0, 0, 10, 10), &dir.path().join("one.mkv"))
            .unwrap();
        thread::sleep(Duration::from_millis(300));
        assert!(!session.is_active());

        let second = dir.path().join("two.mkv");
        session.start(Region::new(0, 0, 10, 10), &second).unwrap();
        assert_eq!(session.stop(), Some(second));
    }

    #[test]
    fn test_unspawnable_tool_reports_spawn_failed() {
        let dir = tempfile::tempdir().unwrap();
        // executable bit set, but the interpreter does not exist
        let stub = crate::test_support::write_executable(
            &dir,
            "broken-grab",
            "#!/no/such/interpreter\n",
        );
        let mut session = CaptureSession::new(&encoder_config(&stub));
        let err = session
            .start(Region::new(0, 0, 10, 10), &dir.path().join("x.mkv"))
            .unwrap_err();
        assert!(matches!(err, CaptureError::SpawnFailed(_)));
        assert!(!session.is_active());
    }
}
