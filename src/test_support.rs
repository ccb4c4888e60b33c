//! Shared test fixtures
//!
//! Small shell scripts stand in for the external encoder so process
//! lifecycle and transcode behavior run against real children without
//! FFmpeg installed.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::Config;

/// Write `contents` into `dir` as an executable and return its path
pub fn write_executable(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Config pointing the recorder at a stub encoder
pub fn encoder_config(program: &Path) -> Config {
    Config {
        ffmpeg_program: program.to_string_lossy().into_owned(),
        display: Some(":99.0".to_string()),
        ..Config::default()
    }
}

/// Encoder stand-in covering both invocation legs
///
/// The capture leg (recognized by its `x11grab` argument) appends to its
/// output file until SIGTERM; any other invocation is treated as a
/// transcode and writes its destination immediately.
pub fn recording_stub(dir: &TempDir) -> PathBuf {
    write_executable(
        dir,
        "fake-grab",
        r#"#!/bin/sh
for arg; do out=$arg; done
case "$*" in
*x11grab*)
    trap 'exit 0' TERM
    while :; do
        echo frame >> "$out"
        sleep 0.05
    done
    ;;
*)
    echo encoded > "$out"
    ;;
esac
"#,
    )
}

/// Encoder stand-in that ignores SIGTERM, forcing the SIGKILL escalation
pub fn stubborn_stub(dir: &TempDir) -> PathBuf {
    write_executable(
        dir,
        "stubborn-grab",
        r#"#!/bin/sh
trap '' TERM
for arg; do out=$arg; done
: > "$out"
while :; do
    sleep 0.05
done
"#,
    )
}

/// Encoder stand-in that exits immediately, simulating an unexpected death
pub fn instant_exit_stub(dir: &TempDir) -> PathBuf {
    write_executable(
        dir,
        "dying-grab",
        r#"#!/bin/sh
for arg; do out=$arg; done
: > "$out"
exit 0
"#,
    )
}

/// Transcode stand-in that writes its destination and succeeds
pub fn encode_ok_stub(dir: &TempDir) -> PathBuf {
    write_executable(
        dir,
        "fake-encode",
        r#"#!/bin/sh
for arg; do dest=$arg; done
echo encoded > "$dest"
"#,
    )
}

/// Transcode stand-in that fails with `message` on stderr
pub fn encode_fail_stub(dir: &TempDir, message: &str) -> PathBuf {
    write_executable(
        dir,
        "failing-encode",
        &format!("#!/bin/sh\necho \"{message}\" >&2\nexit 1\n"),
    )
}
