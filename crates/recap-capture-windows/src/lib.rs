//! recap-capture-windows — GDI window-region capture.
//!
//! Grabs the current contents of one on-screen window region into a caller
//! owned BGRA buffer, one blocking call per frame. On non-Windows targets a
//! stub backend is compiled for CI compatibility; it reports a fixed region
//! and paints solid frames so the session layer stays testable anywhere.
//!
//! # Windows grab path
//!
//! ```text
//! WindowId (resolved by find_window / desktop_window)
//!   │  GetWindowRect × monitor scale ratio ──► CaptureRegion (physical px)
//!   ▼
//! GetDC → CreateCompatibleDC → CreateCompatibleBitmap (padded size)
//!   │  BitBlt at (pad_w/2, pad_h/2)
//!   ▼
//! GetDIBits (32-bit, top-down) ──► caller's padded BGRA scratch buffer
//! ```

use recap_core::Resolution;

// ── Public types ──────────────────────────────────────────────────────────────

/// Opaque handle to the capture target window.
///
/// Produced by a lookup collaborator ([`find_window`], [`desktop_window`]);
/// the capture core never performs discovery heuristics of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowId(pub isize);

/// A capture region's physical-pixel dimensions, after display-scale
/// correction.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRegion {
    pub width: u32,
    pub height: u32,
    /// Physical over logical pixel ratio of the target's monitor.
    pub scale: f32,
}

impl CaptureRegion {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Placement of the live region inside the padded destination buffer.
#[derive(Debug, Clone, Copy)]
pub struct GrabLayout {
    /// Raw region size in physical pixels.
    pub region: Resolution,
    /// Destination buffer size: region plus letterbox borders.
    pub padded: Resolution,
    /// Top-left corner of the live content, `(pad_w / 2, pad_h / 2)`.
    pub offset: (u32, u32),
}

// ── Platform split ─────────────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod gdi;
#[cfg(target_os = "windows")]
pub use gdi::{desktop_window, find_window, probe_region, RegionGrabber};

#[cfg(not(target_os = "windows"))]
mod stub;
#[cfg(not(target_os = "windows"))]
pub use stub::{desktop_window, find_window, probe_region, RegionGrabber};
