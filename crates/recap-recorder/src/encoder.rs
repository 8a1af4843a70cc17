//! GStreamer encode/mux pipeline writing one video file.
//!
//! # Pipeline
//!
//! ```text
//! appsrc (padded BGRA, 90 kHz pts)
//!   → videoconvert
//!   → videoscale method=4-tap
//!   → video/x-raw,format=I420,<output size>
//!   → x264enc / x265enc  (bitrate, key-int-max=12, bframes=2, ultrafast)
//!   → h264parse / h265parse
//!   → mp4mux / matroskamux
//!   → filesink
//! ```
//!
//! The source buffer is already letterbox-padded to the output aspect
//! ratio, so the scaler only ever performs uniform scaling.

use std::sync::Once;

use gstreamer::{self as gst, prelude::*};
use gstreamer_app::AppSrc;
use gstreamer_video as gst_video;
use recap_core::{ContainerFormat, EncoderConfig, EncoderError, PixelFormat, VideoCodec};
use tracing::{debug, info, warn};

/// Presentation clock rate: 90 000 ticks per second.
const PTS_HZ: u64 = 90_000;
/// Fixed keyframe interval, independent of scene cuts.
const GOP_FRAMES: u32 = 12;
/// Maximum consecutive B-frames the encoder may reorder across.
const MAX_B_FRAMES: u32 = 2;

/// Presentation timestamp of frame `frame_no` on the 90 kHz clock.
fn pts_ticks(frame_no: u64, fps: u32) -> u64 {
    PTS_HZ * frame_no / fps as u64
}

/// 90 kHz ticks → nanoseconds, truncating below one tick.
fn ticks_to_ns(ticks: u64) -> u64 {
    ticks * 1_000_000 / 90
}

// ── Process-wide setup ────────────────────────────────────────────────────────

static SILENCE_LOGS: Once = Once::new();

/// Initialize GStreamer and silence its own debug output, once per process,
/// before the first pipeline is built.
fn ensure_gst() -> Result<(), EncoderError> {
    gst::init().map_err(|e| EncoderError::PipelineBuild { reason: e.to_string() })?;
    SILENCE_LOGS.call_once(|| gst::log::set_active(false));
    Ok(())
}

// ── FrameEncoder ──────────────────────────────────────────────────────────────

/// Owns the encode/mux pipeline for one output file.
///
/// Knows nothing about where pixels come from: callers feed raw padded
/// frames with [`FrameEncoder::push_frame`] and finalize the file with
/// [`FrameEncoder::finish`].
#[derive(Debug)]
pub struct FrameEncoder {
    pipeline: gst::Pipeline,
    appsrc: AppSrc,
    config: EncoderConfig,
    frame_no: u64,
    frames_dropped: u64,
}

impl FrameEncoder {
    /// Build and start the pipeline. Every step short-circuits with a typed
    /// error; elements created before a failing step belong to the pipeline
    /// bin and are torn down with it.
    pub fn init(config: EncoderConfig) -> Result<Self, EncoderError> {
        let container = ContainerFormat::from_path(&config.output).ok_or_else(|| {
            EncoderError::FormatNotFound { path: config.output.display().to_string() }
        })?;

        ensure_gst()?;
        let codec = config.codec;
        if gst::ElementFactory::find(codec.encoder_factory()).is_none() {
            return Err(EncoderError::CodecNotFound { factory: codec.encoder_factory().into() });
        }

        let pipeline = gst::Pipeline::new();

        let src_caps = video_caps(source_video_format(config.source_format), &config)?;
        let appsrc = AppSrc::builder()
            .name("src")
            .caps(&src_caps)
            .format(gst::Format::Time)
            .is_live(true)
            .build();

        let convert = make_element("videoconvert")?;
        let scale = gst::ElementFactory::make("videoscale")
            .property_from_str("method", "4-tap")
            .build()
            .map_err(|e| EncoderError::PipelineBuild {
                reason: format!("creating 'videoscale': {e}"),
            })?;

        let out_caps = output_caps(&config)?;
        let capsfilter = gst::ElementFactory::make("capsfilter")
            .property("caps", &out_caps)
            .build()
            .map_err(|e| EncoderError::PipelineBuild {
                reason: format!("creating 'capsfilter': {e}"),
            })?;

        let encoder = build_encoder(codec, config.bitrate_kbps)?;
        let parser = make_element(codec.parser_factory())?;
        let muxer = build_muxer(container)?;
        let filesink = gst::ElementFactory::make("filesink")
            .property("location", config.output.to_string_lossy().to_string())
            .property("async", false)
            .build()
            .map_err(|e| EncoderError::PipelineBuild {
                reason: format!("creating 'filesink': {e}"),
            })?;

        let elements = [
            appsrc.upcast_ref(),
            &convert,
            &scale,
            &capsfilter,
            &encoder,
            &parser,
            &muxer,
            &filesink,
        ];
        pipeline
            .add_many(elements)
            .map_err(|e| EncoderError::PipelineBuild { reason: e.to_string() })?;
        gst::Element::link_many(elements)
            .map_err(|e| EncoderError::PipelineBuild { reason: e.to_string() })?;

        // Opens the encoder and the output file and writes the container
        // header.
        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| EncoderError::OpenFailed { reason: e.to_string() })?;

        info!(
            "encode pipeline running: {} BGRA → {} {:?} @{}fps {}kbps → {}",
            config.source,
            config.target,
            codec,
            config.fps,
            config.bitrate_kbps,
            config.output.display()
        );

        Ok(Self { pipeline, appsrc, config, frame_no: 0, frames_dropped: 0 })
    }

    /// Feed one raw source frame.
    ///
    /// `raw` must hold exactly `source.width × source.height` tightly packed
    /// 32-bit pixels. A malformed or rejected frame is counted and dropped
    /// at debug level; the capture loop never stalls on it.
    pub fn push_frame(&mut self, raw: &[u8]) {
        let expected = self.config.source.frame_len_32bpp();
        if raw.len() != expected {
            self.frames_dropped += 1;
            debug!(
                "dropping frame: buffer holds {} bytes, source frame needs {expected}",
                raw.len()
            );
            return;
        }

        let Ok(mut buffer) = gst::Buffer::with_size(raw.len()) else {
            self.frames_dropped += 1;
            return;
        };
        {
            let buf = buffer.get_mut().unwrap();
            let ticks = pts_ticks(self.frame_no, self.config.fps);
            buf.set_pts(gst::ClockTime::from_nseconds(ticks_to_ns(ticks)));
            buf.set_duration(gst::ClockTime::from_nseconds(
                1_000_000_000 / self.config.fps.max(1) as u64,
            ));
            match buf.map_writable() {
                Ok(mut map) => map.copy_from_slice(raw),
                Err(_) => {
                    self.frames_dropped += 1;
                    return;
                }
            }
        }
        self.frame_no += 1;

        if let Err(flow) = self.appsrc.push_buffer(buffer) {
            self.frames_dropped += 1;
            debug!("encoder rejected frame {}: {flow:?}", self.frame_no - 1);
        }
    }

    /// Frames accepted into the presentation timeline so far.
    pub fn frames_pushed(&self) -> u64 {
        self.frame_no
    }

    /// Frames lost to precondition violations or encoder rejection.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Drain the encoder's reorder window, write the container trailer and
    /// close the file. Best-effort: teardown failures are logged, never
    /// propagated. Returns the output file's size in bytes.
    pub fn finish(self) -> u64 {
        if self.appsrc.end_of_stream().is_err() {
            warn!("end-of-stream rejected; output may be truncated");
        }
        if let Some(bus) = self.pipeline.bus() {
            for msg in bus.iter_timed(gst::ClockTime::from_seconds(10)) {
                match msg.view() {
                    gst::MessageView::Eos(..) => break,
                    gst::MessageView::Error(err) => {
                        warn!("finalizing pipeline: {} ({:?})", err.error(), err.debug());
                        break;
                    }
                    _ => {}
                }
            }
        }
        let _ = self.pipeline.set_state(gst::State::Null);
        std::fs::metadata(&self.config.output).map(|m| m.len()).unwrap_or(0)
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        // Safe to repeat after finish(); the pipeline is already Null then.
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

// ── Element construction ──────────────────────────────────────────────────────

fn make_element(factory: &str) -> Result<gst::Element, EncoderError> {
    gst::ElementFactory::make(factory).build().map_err(|e| EncoderError::PipelineBuild {
        reason: format!("creating '{factory}': {e}"),
    })
}

fn build_encoder(codec: VideoCodec, bitrate_kbps: u32) -> Result<gst::Element, EncoderError> {
    let factory = codec.encoder_factory();
    let gop_frames = GOP_FRAMES.to_string();
    let max_b_frames = MAX_B_FRAMES.to_string();
    let builder = gst::ElementFactory::make(factory)
        .property("bitrate", bitrate_kbps)
        .property_from_str("key-int-max", &gop_frames)
        .property_from_str("speed-preset", "ultrafast");
    let builder = match codec {
        VideoCodec::H264 => builder.property_from_str("bframes", &max_b_frames),
        VideoCodec::H265 => {
            builder.property("option-string", format!("bframes={MAX_B_FRAMES}"))
        }
    };
    builder.build().map_err(|e| EncoderError::PipelineBuild {
        reason: format!("creating '{factory}': {e}"),
    })
}

fn build_muxer(container: ContainerFormat) -> Result<gst::Element, EncoderError> {
    let factory = container.muxer_factory();
    let builder = gst::ElementFactory::make(factory);
    let builder = match container {
        ContainerFormat::Mp4 => builder.property("faststart", true),
        ContainerFormat::Matroska => builder.property("writing-app", "recap"),
    };
    builder.build().map_err(|e| EncoderError::PipelineBuild {
        reason: format!("creating '{factory}': {e}"),
    })
}

// ── Caps ──────────────────────────────────────────────────────────────────────

fn source_video_format(format: PixelFormat) -> gst_video::VideoFormat {
    match format {
        PixelFormat::Bgra => gst_video::VideoFormat::Bgra,
        PixelFormat::Bgrx => gst_video::VideoFormat::Bgrx,
        PixelFormat::Rgba => gst_video::VideoFormat::Rgba,
    }
}

fn video_caps(
    format: gst_video::VideoFormat,
    config: &EncoderConfig,
) -> Result<gst::Caps, EncoderError> {
    gst_video::VideoInfo::builder(format, config.source.width, config.source.height)
        .fps(gst::Fraction::new(config.fps as i32, 1))
        .build()
        .and_then(|info| info.to_caps())
        .map_err(|e| EncoderError::PipelineBuild { reason: e.to_string() })
}

/// Output caps: planar YUV 4:2:0 at the target resolution regardless of the
/// input format.
fn output_caps(config: &EncoderConfig) -> Result<gst::Caps, EncoderError> {
    gst_video::VideoInfo::builder(
        gst_video::VideoFormat::I420,
        config.target.width,
        config.target.height,
    )
    .fps(gst::Fraction::new(config.fps as i32, 1))
    .build()
    .and_then(|info| info.to_caps())
    .map_err(|e| EncoderError::PipelineBuild { reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::{pts_ticks, ticks_to_ns};

    #[test]
    fn pts_follows_the_90khz_clock() {
        assert_eq!(pts_ticks(0, 30), 0);
        assert_eq!(pts_ticks(1, 30), 3_000);
        assert_eq!(pts_ticks(2, 30), 6_000);
        assert_eq!(pts_ticks(30, 30), 90_000);
        assert_eq!(pts_ticks(1, 60), 1_500);
    }

    #[test]
    fn pts_is_strictly_increasing() {
        for fps in [24, 25, 30, 60, 144] {
            let mut last = None;
            for n in 0..1_000 {
                let ticks = pts_ticks(n, fps);
                if let Some(prev) = last {
                    assert!(ticks > prev, "pts not increasing at frame {n} @{fps}fps");
                }
                last = Some(ticks);
            }
        }
    }

    #[test]
    fn tick_conversion_spans_exact_seconds() {
        assert_eq!(ticks_to_ns(0), 0);
        assert_eq!(ticks_to_ns(9), 100_000);
        assert_eq!(ticks_to_ns(90_000), 1_000_000_000);
        assert_eq!(ticks_to_ns(90_000 * 3_600), 3_600_000_000_000);
    }
}
