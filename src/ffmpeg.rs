//! Command-line contract with the external FFmpeg encoder
//!
//! Two invocation legs share this module: the x11grab capture (fast,
//! lossless-class intermediate) and the post-capture re-encode (the only
//! place quality is applied). Tool resolution lives here too so both legs
//! fail fast when the encoder is missing, before any spawn attempt.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::Quality;
use crate::domain::Region;

/// Locate `program` on the search path without spawning anything
///
/// An explicit path (absolute, or containing a separator) is checked
/// directly; a bare name is resolved against `$PATH`. Returns the full path
/// of the first executable match.
pub fn resolve_tool(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Arguments for the capture leg
///
/// Grabs the display at the region's offset and size, encoding with the
/// fastest preset at near-lossless quality. The intermediate is large on
/// purpose; the size/fidelity trade-off happens in [`transcode_args`].
pub fn capture_args(display: &str, framerate: u32, region: Region, output: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        "x11grab".into(),
        "-framerate".into(),
        framerate.to_string().into(),
        "-video_size".into(),
        region.size_label().into(),
        "-i".into(),
        format!("{}+{},{}", display, region.x, region.y).into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-qp".into(),
        "0".into(),
        output.as_os_str().to_os_string(),
    ]
}

/// Arguments for the re-encode leg
///
/// Video re-encoded at the preset's rate factor, any audio stream copied
/// verbatim, destination overwritten unconditionally.
pub fn transcode_args(source: &Path, dest: &Path, quality: Quality) -> Vec<OsString> {
    vec![
        "-i".into(),
        source.as_os_str().to_os_string(),
        "-c:v".into(),
        "libx264".into(),
        "-crf".into(),
        quality.crf().to_string().into(),
        "-preset".into(),
        "medium".into(),
        "-c:a".into(),
        "copy".into(),
        "-y".into(),
        dest.as_os_str().to_os_string(),
    ]
}
