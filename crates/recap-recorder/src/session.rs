//! CaptureSession — binds one window region to a [`FrameEncoder`].
//!
//! At init time the session probes the target rectangle, corrects it for
//! display scaling, computes the letterbox padding that matches the output
//! aspect ratio, and sizes a reusable BGRA scratch buffer. Each
//! [`CaptureSession::capture_and_push`] call grabs one frame into the
//! scratch buffer and forwards it to the encoder. Pacing is the caller's
//! job; every call here is blocking and single-threaded.

use recap_capture_windows::{probe_region, GrabLayout, RegionGrabber, WindowId};
use recap_core::{EncoderConfig, PixelFormat, RecorderError, RecordingConfig};
use tracing::{debug, info};

use crate::encoder::FrameEncoder;

/// One live capture → encode session for a single window and output file.
#[derive(Debug)]
pub struct CaptureSession {
    encoder: FrameEncoder,
    grabber: RegionGrabber,
    scratch: Vec<u8>,
    frames_captured: u64,
    capture_drops: u64,
}

impl CaptureSession {
    /// Resolve the target region, compute the letterbox layout and start
    /// the encoder. Fails without partial side effects.
    pub fn init(window: WindowId, config: RecordingConfig) -> Result<Self, RecorderError> {
        let region = probe_region(window)?;
        let raw = region.resolution();
        let pad = raw.letterbox_pad(config.resolution);
        let padded = raw.padded(pad);

        info!(
            "capture region {raw} (scale {:.2}), letterbox +{}+{} → {padded}",
            region.scale, pad.0, pad.1
        );

        let grabber = RegionGrabber::open(
            window,
            GrabLayout { region: raw, padded, offset: (pad.0 / 2, pad.1 / 2) },
        )?;

        let encoder = FrameEncoder::init(EncoderConfig {
            output: config.output.clone(),
            fps: config.target_fps,
            source_format: PixelFormat::Bgra,
            source: padded,
            target: config.resolution,
            bitrate_kbps: config.bitrate_kbps,
            codec: config.codec,
        })?;

        // Zeroed exactly once; grabs repaint only the live rectangle, so the
        // letterbox borders stay black for the whole session.
        let scratch = vec![0u8; padded.frame_len_32bpp()];

        Ok(Self { encoder, grabber, scratch, frames_captured: 0, capture_drops: 0 })
    }

    /// Grab one frame and hand it to the encoder. A failed grab or a
    /// rejected frame is counted and dropped; nothing is surfaced to the
    /// caller.
    pub fn capture_and_push(&mut self) {
        if let Err(e) = self.grabber.grab_into(&mut self.scratch) {
            self.capture_drops += 1;
            debug!("capture failed, frame dropped: {e}");
            return;
        }
        self.frames_captured += 1;
        self.encoder.push_frame(&self.scratch);
    }

    /// Content placement inside the padded buffer.
    pub fn layout(&self) -> GrabLayout {
        self.grabber.layout()
    }

    /// Frames successfully grabbed from the screen so far.
    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    /// Frames lost to capture failures or encoder rejection.
    pub fn frames_dropped(&self) -> u64 {
        self.capture_drops + self.encoder.frames_dropped()
    }

    /// Flush the encoder and finalize the output file; returns its size in
    /// bytes. The target handle and scratch buffer are released with the
    /// session.
    pub fn finish(self) -> u64 {
        self.encoder.finish()
    }
}
