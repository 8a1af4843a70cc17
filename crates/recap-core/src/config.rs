use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{PixelFormat, Resolution, VideoCodec};

/// Session-level recording settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub output: PathBuf,
    /// Output stream resolution (the capture region is padded and scaled
    /// to fit it).
    pub resolution: Resolution,
    #[serde(alias = "targetFPS")]
    pub target_fps: u32,
    #[serde(alias = "bitrateKbps")]
    pub bitrate_kbps: u32,
    pub codec: VideoCodec,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("capture.mp4"),
            resolution: Resolution::FHD,
            target_fps: 30,
            bitrate_kbps: 1200,
            codec: VideoCodec::H264,
        }
    }
}

impl RecordingConfig {
    /// Interval between frames at the target rate. Pacing with this is the
    /// caller's responsibility; the pipeline itself never sleeps.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.target_fps.max(1) as u64)
    }
}

/// Fully resolved encoder parameters. Immutable once the encoder is built.
///
/// `source` describes the *padded* capture buffer handed to the encoder,
/// not the raw window region.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub output: PathBuf,
    pub fps: u32,
    pub source_format: PixelFormat,
    pub source: Resolution,
    pub target: Resolution,
    pub bitrate_kbps: u32,
    pub codec: VideoCodec,
}

#[cfg(test)]
mod tests {
    use super::RecordingConfig;

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "output": "session.mp4",
            "resolution": {"width": 1920, "height": 1080},
            "targetFPS": 60,
            "bitrateKbps": 4000,
            "codec": "h264"
        }"#;

        let cfg: RecordingConfig = serde_json::from_str(json).expect("valid camelCase config");
        assert_eq!(cfg.target_fps, 60);
        assert_eq!(cfg.bitrate_kbps, 4000);
    }

    #[test]
    fn deserializes_snake_case_fields() {
        let json = r#"{
            "output": "session.mkv",
            "resolution": {"width": 1280, "height": 720},
            "target_fps": 30,
            "bitrate_kbps": 1200,
            "codec": "h265"
        }"#;

        let cfg: RecordingConfig = serde_json::from_str(json).expect("valid snake_case config");
        assert_eq!(cfg.target_fps, 30);
        assert_eq!(cfg.bitrate_kbps, 1200);
    }

    #[test]
    fn frame_interval_matches_target_fps() {
        let cfg = RecordingConfig { target_fps: 30, ..Default::default() };
        assert_eq!(cfg.frame_interval().as_micros(), 33_333);
    }
}
