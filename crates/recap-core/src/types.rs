use std::path::Path;

use serde::{Deserialize, Serialize};

// MARK: - Resolution

/// Pixel dimensions of a capture region or output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Self = Self { width: 1280, height: 720 };
    pub const FHD: Self = Self { width: 1920, height: 1080 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Letterbox padding needed so this region can be scaled uniformly to
    /// `target`'s aspect ratio with no distortion and no cropping.
    ///
    /// Returns `(pad_w, pad_h)`; at most one of the two is non-zero, and
    /// `(width + pad_w) / (height + pad_h)` matches `target`'s aspect ratio
    /// within one pixel of rounding.
    pub fn letterbox_pad(&self, target: Resolution) -> (u32, u32) {
        let src_aspect = self.aspect_ratio();
        let dst_aspect = target.aspect_ratio();
        if src_aspect < dst_aspect {
            let padded_w = (dst_aspect * self.height as f64).round() as i64;
            ((padded_w - self.width as i64).max(0) as u32, 0)
        } else if src_aspect > dst_aspect {
            let padded_h = (self.width as f64 / dst_aspect).round() as i64;
            (0, (padded_h - self.height as i64).max(0) as u32)
        } else {
            (0, 0)
        }
    }

    /// This resolution grown by a `(pad_w, pad_h)` letterbox border.
    pub fn padded(&self, pad: (u32, u32)) -> Resolution {
        Resolution::new(self.width + pad.0, self.height + pad.1)
    }

    /// Byte length of one tightly packed 32-bit frame at this resolution.
    pub fn frame_len_32bpp(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

// MARK: - PixelFormat

/// Pixel layout of a raw capture buffer (always 4 bytes per pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Blue, Green, Red, Alpha — native GDI DIB order.
    Bgra,
    /// Blue, Green, Red, unused.
    Bgrx,
    Rgba,
}

// MARK: - VideoCodec

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    H265,
}

impl VideoCodec {
    /// Element factory of the canonical software encoder for this codec.
    pub fn encoder_factory(self) -> &'static str {
        match self {
            Self::H264 => "x264enc",
            Self::H265 => "x265enc",
        }
    }

    pub fn parser_factory(self) -> &'static str {
        match self {
            Self::H264 => "h264parse",
            Self::H265 => "h265parse",
        }
    }
}

// MARK: - ContainerFormat

/// Output container, selected from the output file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Mp4,
    Matroska,
}

impl ContainerFormat {
    /// Map an output path to a container, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" | "m4v" => Some(Self::Mp4),
            "mkv" => Some(Self::Matroska),
            _ => None,
        }
    }

    pub fn muxer_factory(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4mux",
            Self::Matroska => "matroskamux",
        }
    }

    /// Default video codec expected by this container.
    pub fn video_codec(self) -> VideoCodec {
        VideoCodec::H264
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_pads_width_for_tall_sources() {
        // 1:1 source into 16:9 output: width grows, height untouched.
        let pad = Resolution::new(1000, 1000).letterbox_pad(Resolution::FHD);
        assert_eq!(pad, (778, 0));
    }

    #[test]
    fn letterbox_pads_height_for_wide_sources() {
        let pad = Resolution::new(1000, 500).letterbox_pad(Resolution::FHD);
        assert_eq!(pad.0, 0);
        assert_eq!(pad.1, 63); // round(1000 / (16/9)) - 500
    }

    #[test]
    fn letterbox_is_zero_for_matching_aspect() {
        assert_eq!(Resolution::HD.letterbox_pad(Resolution::FHD), (0, 0));
    }

    #[test]
    fn letterbox_padded_aspect_is_within_one_pixel() {
        let cases = [
            (1000, 1000),
            (1000, 500),
            (333, 777),
            (1, 1),
            (2560, 1080),
            (1920, 1200),
        ];
        for (w, h) in cases {
            let src = Resolution::new(w, h);
            let pad = src.letterbox_pad(Resolution::FHD);
            assert!(
                pad.0 == 0 || pad.1 == 0,
                "both axes padded for {src}: {pad:?}"
            );
            let padded = src.padded(pad);
            let ideal_w = Resolution::FHD.aspect_ratio() * padded.height as f64;
            assert!(
                (padded.width as f64 - ideal_w).abs() <= 1.0,
                "{src} padded to {padded} is off 16:9 by more than a pixel"
            );
        }
    }

    #[test]
    fn container_from_extension() {
        assert_eq!(
            ContainerFormat::from_path(Path::new("out.mp4")),
            Some(ContainerFormat::Mp4)
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("clip.M4V")),
            Some(ContainerFormat::Mp4)
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("rec.mkv")),
            Some(ContainerFormat::Matroska)
        );
        assert_eq!(ContainerFormat::from_path(Path::new("rec.webm")), None);
        assert_eq!(ContainerFormat::from_path(Path::new("noext")), None);
    }
}
