//! Encoder and session integration tests.
//!
//! These drive a real GStreamer pipeline. Each encoding test skips itself
//! when the required elements are not installed on the host, so the suite
//! passes on minimal CI images.

use recap_core::{EncoderConfig, EncoderError, PixelFormat, RecorderError, RecordingConfig,
    Resolution, VideoCodec};
use recap_recorder::{CaptureSession, FrameEncoder};

fn h264_mp4_available() -> bool {
    gstreamer::init().is_ok()
        && gstreamer::ElementFactory::find("x264enc").is_some()
        && gstreamer::ElementFactory::find("mp4mux").is_some()
}

fn encoder_config(output: std::path::PathBuf) -> EncoderConfig {
    EncoderConfig {
        output,
        fps: 30,
        source_format: PixelFormat::Bgra,
        source: Resolution::new(64, 48),
        target: Resolution::new(64, 48),
        bitrate_kbps: 400,
        codec: VideoCodec::H264,
    }
}

#[test]
fn encodes_frames_into_a_parsable_mp4() {
    if !h264_mp4_available() {
        eprintln!("skipping: x264enc/mp4mux not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clip.mp4");

    let config = encoder_config(output.clone());
    let frame_len = config.source.frame_len_32bpp();
    let mut encoder = FrameEncoder::init(config).unwrap();

    for i in 0..15u8 {
        let frame = vec![i.wrapping_mul(16); frame_len];
        encoder.push_frame(&frame);
    }
    assert_eq!(encoder.frames_pushed(), 15);
    assert_eq!(encoder.frames_dropped(), 0);

    let bytes = encoder.finish();
    assert!(bytes > 0, "finalized file is empty");

    // Faststart MP4 leads with the ftyp box.
    let contents = std::fs::read(&output).unwrap();
    assert_eq!(&contents[4..8], b"ftyp");
}

#[test]
fn malformed_buffers_are_counted_and_dropped() {
    if !h264_mp4_available() {
        eprintln!("skipping: x264enc/mp4mux not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut encoder = FrameEncoder::init(encoder_config(dir.path().join("clip.mp4"))).unwrap();

    encoder.push_frame(&[0u8; 10]);

    assert_eq!(encoder.frames_pushed(), 0);
    assert_eq!(encoder.frames_dropped(), 1);
    encoder.finish();
}

#[test]
fn finishing_without_frames_does_not_panic() {
    if !h264_mp4_available() {
        eprintln!("skipping: x264enc/mp4mux not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let encoder = FrameEncoder::init(encoder_config(dir.path().join("empty.mp4"))).unwrap();
    encoder.finish();
}

#[test]
fn init_rejects_unknown_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let err = FrameEncoder::init(encoder_config(dir.path().join("clip.webm"))).unwrap_err();
    assert!(matches!(err, EncoderError::FormatNotFound { .. }), "got {err:?}");
}

// The stub capture backend reports a fixed 1280×720 region, which makes the
// session's padding math observable without a live desktop.
#[cfg(not(target_os = "windows"))]
#[test]
fn session_letterboxes_and_records_the_stub_region() {
    if !h264_mp4_available() {
        eprintln!("skipping: x264enc/mp4mux not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let config = RecordingConfig {
        output: dir.path().join("session.mp4"),
        resolution: Resolution::new(640, 640),
        target_fps: 30,
        ..Default::default()
    };

    let target = recap_capture_windows::desktop_window();
    let mut session = CaptureSession::init(target, config).unwrap();

    // 1280×720 into a square output: height pads to 1280, content centered.
    let layout = session.layout();
    assert_eq!(layout.padded, Resolution::new(1280, 1280));
    assert_eq!(layout.offset, (0, 280));

    for _ in 0..10 {
        session.capture_and_push();
    }
    assert_eq!(session.frames_captured(), 10);
    assert_eq!(session.frames_dropped(), 0);

    let bytes = session.finish();
    assert!(bytes > 0, "session output is empty");
}

#[cfg(not(target_os = "windows"))]
#[test]
fn session_init_fails_cleanly_on_bad_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = RecordingConfig {
        output: dir.path().join("clip.avi"),
        ..Default::default()
    };
    let err = CaptureSession::init(recap_capture_windows::desktop_window(), config).unwrap_err();
    assert!(matches!(
        err,
        RecorderError::Encoder(EncoderError::FormatNotFound { .. })
    ));
}
