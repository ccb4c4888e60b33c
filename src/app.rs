//! Command-line driver
//!
//! The thin session coordinator: takes a region (from the command line in
//! this front end; a graphical overlay would feed the same operations), runs
//! the capture until a stop signal or deadline, then commits the take at the
//! requested quality.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::config::{Config, Quality};
use crate::domain::Region;
use crate::ffmpeg;
use crate::session::Recorder;

/// Stop flag flipped by SIGINT/SIGTERM
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Record a rectangular region of the screen and save it at a chosen quality
#[derive(Debug, Parser)]
#[command(name = "grabcast", version, about)]
pub struct Args {
    /// Capture region as X,Y,WIDTHxHEIGHT (e.g. 100,200,800x600)
    #[arg(long, value_parser = parse_region, required_unless_present = "check")]
    region: Option<Region>,

    /// Destination file (default: ~/Videos/Recording_<timestamp>.mp4)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Quality preset for the final encode (low, medium, high)
    #[arg(long, default_value = "medium", value_parser = parse_quality)]
    quality: Quality,

    /// Stop automatically after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration: Option<u64>,

    /// X11 display to capture (default: $DISPLAY)
    #[arg(long)]
    display: Option<String>,

    /// Capture framerate
    #[arg(long, default_value_t = 30)]
    framerate: u32,

    /// Encoder program to invoke
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// Keep a copy of the raw intermediate next to the output
    #[arg(long)]
    keep_intermediate: bool,

    /// Check that the encoder is available, then exit
    #[arg(long)]
    check: bool,
}

fn parse_region(s: &str) -> Result<Region, String> {
    let malformed = || format!("expected X,Y,WIDTHxHEIGHT, got `{s}`");
    let (pos, size) = s.rsplit_once(',').ok_or_else(malformed)?;
    let (x, y) = pos.split_once(',').ok_or_else(malformed)?;
    let (w, h) = size.split_once('x').ok_or_else(malformed)?;
    let region = Region::new(
        x.trim().parse().map_err(|_| malformed())?,
        y.trim().parse().map_err(|_| malformed())?,
        w.trim().parse().map_err(|_| malformed())?,
        h.trim().parse().map_err(|_| malformed())?,
    );
    if region.is_empty() {
        return Err(format!(
            "capture region must have nonzero area, got {}",
            region.size_label()
        ));
    }
    Ok(region)
}

fn parse_quality(s: &str) -> Result<Quality, String> {
    s.parse::<Quality>().map_err(|e| e.to_string())
}

pub fn run(args: Args) -> Result<()> {
    let config = Config {
        ffmpeg_program: args.ffmpeg.clone(),
        display: args.display.clone(),
        framerate: args.framerate,
        ..Config::default()
    };

    if args.check {
        return check_tools(&config);
    }
    let Some(region) = args.region else {
        bail!("--region is required unless --check is given");
    };
    let dest = match args.output {
        Some(path) => path,
        None => default_output_path()?,
    };

    let mut recorder = Recorder::new(config)?;
    setup_stop_handler();

    let (started, _intermediate) = recorder
        .start(region)
        .context("failed to start capture")?;
    log::info!(
        "recording {} at {},{} (pid {}), press Ctrl-C to stop",
        region.size_label(),
        region.x,
        region.y,
        started.pid
    );

    let begun = Instant::now();
    let deadline = args.duration.map(Duration::from_secs);
    loop {
        if STOP_REQUESTED.load(Ordering::Relaxed) {
            log::info!("stop requested");
            break;
        }
        if deadline.is_some_and(|limit| begun.elapsed() >= limit) {
            log::info!("duration reached");
            break;
        }
        if !recorder.is_recording() {
            log::warn!("capture process ended early");
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    let Some(raw) = recorder.stop() else {
        bail!("no capture was running");
    };

    let raw_size = std::fs::metadata(&raw).map(|meta| meta.len()).unwrap_or(0);
    if raw_size == 0 {
        recorder.discard(&raw);
        recorder.shutdown();
        bail!(
            "capture produced no data; check that the display and region are valid (run with --check to verify the encoder)"
        );
    }
    log::info!(
        "captured {:.1}s of video ({raw_size} bytes raw)",
        begun.elapsed().as_secs_f64()
    );

    if args.keep_intermediate {
        let kept = dest.with_extension(format!(
            "raw.{}",
            raw.extension().unwrap_or_default().to_string_lossy()
        ));
        std::fs::copy(&raw, &kept)
            .with_context(|| format!("failed to keep raw capture at {}", kept.display()))?;
        log::info!("raw intermediate kept at {}", kept.display());
    }

    if let Err(e) = recorder.commit(&raw, &dest, args.quality) {
        let workspace = recorder.keep_workspace();
        bail!(
            "{e}\nraw capture kept in {} for manual recovery",
            workspace.display()
        );
    }

    log::info!("saved {}", dest.display());
    recorder.shutdown();
    Ok(())
}

/// Report encoder resolution, the doctor-style fast path
fn check_tools(config: &Config) -> Result<()> {
    match ffmpeg::resolve_tool(&config.ffmpeg_program) {
        Some(path) => {
            println!("encoder: {} ({})", config.ffmpeg_program, path.display());
            println!("display: {}", config.display());
            Ok(())
        }
        None => bail!(
            "encoder `{}` not found on PATH; install it first (e.g. sudo apt install ffmpeg)",
            config.ffmpeg_program
        ),
    }
}

fn default_output_path() -> Result<PathBuf> {
    let dir = dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .context("could not determine a default output directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let name = chrono::Local::now()
        .format("Recording_%Y-%m-%d_%H-%M-%S.mp4")
        .to_string();
    Ok(dir.join(name))
}

/// Install the SIGINT/SIGTERM stop flag
fn setup_stop_handler() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| unsafe {
        let handler = stop_handler as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::signal(libc::SIGINT, handler);
        libc::signal(libc::SIGTERM, handler);
    });
}

extern "C" fn stop_handler(_: libc::c_int) {
    STOP_REQUESTED.store(true, Ordering::Relaxed);
}
