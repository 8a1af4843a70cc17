//! recap — window-to-video capture harness.
//!
//! Records a window (or the full desktop) to an MP4/MKV file, pacing
//! captures to the target frame rate by wall clock. Pacing lives here, in
//! the caller; the pipeline itself never sleeps.
//!
//! ```text
//! recap <output.{mp4,mkv}> [--fps N] [--size WxH] [--frames N]
//!       [--bitrate KBPS] [--window TITLE]
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use recap_capture_windows::{desktop_window, find_window};
use recap_core::{RecordingConfig, Resolution};
use recap_recorder::CaptureSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;

    let target = match args.window.as_deref() {
        Some(title) => find_window(None, Some(title)).context("resolving target window")?,
        None => desktop_window(),
    };

    let config = RecordingConfig {
        output: args.output.clone(),
        resolution: args.size,
        target_fps: args.fps,
        bitrate_kbps: args.bitrate,
        ..Default::default()
    };
    let interval = config.frame_interval();

    let mut session = CaptureSession::init(target, config)?;
    info!(
        "recording {} frames @{}fps to {}",
        args.frames,
        args.fps,
        args.output.display()
    );

    let mut next_frame = Instant::now();
    for _ in 0..args.frames {
        session.capture_and_push();
        next_frame += interval;
        std::thread::sleep(next_frame.saturating_duration_since(Instant::now()));
    }

    let captured = session.frames_captured();
    let dropped = session.frames_dropped();
    let bytes = session.finish();
    info!("wrote {bytes} bytes ({captured} frames captured, {dropped} dropped)");
    Ok(())
}

// ── Argument parsing ──────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Args {
    output: PathBuf,
    fps: u32,
    size: Resolution,
    frames: u64,
    bitrate: u32,
    window: Option<String>,
}

impl Args {
    fn parse(mut argv: impl Iterator<Item = String>) -> Result<Self> {
        let mut output = None;
        let mut args = Self {
            output: PathBuf::new(),
            fps: 30,
            size: Resolution::FHD,
            frames: 180,
            bitrate: 1200,
            window: None,
        };
        while let Some(arg) = argv.next() {
            match arg.as_str() {
                "--fps" => args.fps = next_value(&mut argv, "--fps")?,
                "--frames" => args.frames = next_value(&mut argv, "--frames")?,
                "--bitrate" => args.bitrate = next_value(&mut argv, "--bitrate")?,
                "--size" => args.size = parse_size(&next_value::<String>(&mut argv, "--size")?)?,
                "--window" => args.window = Some(next_value(&mut argv, "--window")?),
                _ if arg.starts_with("--") => bail!("unknown option '{arg}'"),
                _ if output.is_none() => output = Some(PathBuf::from(arg)),
                _ => bail!("unexpected argument '{arg}'"),
            }
        }
        args.output = output.with_context(|| {
            "usage: recap <output.{mp4,mkv}> [--fps N] [--size WxH] [--frames N] \
             [--bitrate KBPS] [--window TITLE]"
        })?;
        if args.fps == 0 {
            bail!("--fps must be positive");
        }
        Ok(args)
    }
}

fn next_value<T: std::str::FromStr>(
    argv: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let value = argv.next().with_context(|| format!("{flag} needs a value"))?;
    value.parse().map_err(|e| anyhow::anyhow!("{flag}: {e}"))
}

fn parse_size(value: &str) -> Result<Resolution> {
    let (w, h) = value.split_once('x').context("size must look like 1920x1080")?;
    Ok(Resolution::new(
        w.parse().context("size width")?,
        h.parse().context("size height")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv<'a>(args: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        args.iter().map(|s| s.to_string())
    }

    #[test]
    fn parses_defaults() {
        let args = Args::parse(argv(&["out.mp4"])).unwrap();
        assert_eq!(args.output, PathBuf::from("out.mp4"));
        assert_eq!(args.fps, 30);
        assert_eq!(args.size, Resolution::FHD);
        assert_eq!(args.frames, 180);
        assert!(args.window.is_none());
    }

    #[test]
    fn parses_overrides() {
        let args = Args::parse(argv(&[
            "clip.mkv", "--fps", "60", "--size", "1280x720", "--frames", "90", "--window",
            "Notepad",
        ]))
        .unwrap();
        assert_eq!(args.fps, 60);
        assert_eq!(args.size, Resolution::HD);
        assert_eq!(args.frames, 90);
        assert_eq!(args.window.as_deref(), Some("Notepad"));
    }

    #[test]
    fn rejects_missing_output_and_bad_size() {
        assert!(Args::parse(argv(&[])).is_err());
        assert!(Args::parse(argv(&["out.mp4", "--size", "1920by1080"])).is_err());
        assert!(Args::parse(argv(&["out.mp4", "--fps", "0"])).is_err());
    }
}
