//! Non-Windows stub backend (CI + cross-compilation).
//!
//! Reports a fixed 1280×720 region and paints solid frames, so the session
//! layer and its tests run unchanged on any host.

use recap_core::CaptureError;

use super::{CaptureRegion, GrabLayout, WindowId};

const STUB_WIDTH: u32 = 1280;
const STUB_HEIGHT: u32 = 720;

pub fn find_window(_class: Option<&str>, _title: Option<&str>) -> Result<WindowId, CaptureError> {
    Ok(WindowId(1))
}

pub fn desktop_window() -> WindowId {
    WindowId(1)
}

pub fn probe_region(_window: WindowId) -> Result<CaptureRegion, CaptureError> {
    tracing::info!(
        "probe_region stub (non-Windows): {}x{} scale 1.0",
        STUB_WIDTH,
        STUB_HEIGHT
    );
    Ok(CaptureRegion { width: STUB_WIDTH, height: STUB_HEIGHT, scale: 1.0 })
}

#[derive(Debug)]
pub struct RegionGrabber {
    layout: GrabLayout,
}

impl RegionGrabber {
    pub fn open(_window: WindowId, layout: GrabLayout) -> Result<Self, CaptureError> {
        tracing::info!("RegionGrabber stub (non-Windows): layout {:?}", layout);
        Ok(Self { layout })
    }

    pub fn layout(&self) -> GrabLayout {
        self.layout
    }

    /// Paint the live-region rectangle mid-gray, leaving letterbox bytes
    /// untouched like the real blit does.
    pub fn grab_into(&self, dst: &mut [u8]) -> Result<(), CaptureError> {
        let GrabLayout { region, padded, offset } = self.layout;
        if dst.len() != padded.frame_len_32bpp() {
            return Err(CaptureError::GrabFailed {
                reason: format!(
                    "buffer holds {} bytes, padded frame needs {}",
                    dst.len(),
                    padded.frame_len_32bpp()
                ),
            });
        }
        let stride = padded.width as usize * 4;
        for row in 0..region.height as usize {
            let start = (offset.1 as usize + row) * stride + offset.0 as usize * 4;
            dst[start..start + region.width as usize * 4].fill(0x80);
        }
        Ok(())
    }
}
