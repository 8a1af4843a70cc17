//! Windows GDI capture implementation.
//!
//! One `grab_into` call performs one blocking BitBlt of the target window's
//! current contents into the caller's padded scratch buffer. The DIB read is
//! 32-bit with a negative height, so rows land top-down in memory.

use std::ffi::c_void;
use std::mem::size_of;

use recap_core::CaptureError;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
    EnumDisplaySettingsW, GetDC, GetDIBits, GetMonitorInfoW, MonitorFromWindow, ReleaseDC,
    SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DEVMODEW, DIB_RGB_COLORS,
    ENUM_CURRENT_SETTINGS, MONITORINFOEXW, MONITOR_DEFAULTTONEAREST, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, GetDesktopWindow, GetWindowRect};

use super::{CaptureRegion, GrabLayout, WindowId};

// ── Window lookup ─────────────────────────────────────────────────────────────

/// Resolve a top-level window by class name and/or title.
pub fn find_window(class: Option<&str>, title: Option<&str>) -> Result<WindowId, CaptureError> {
    let class_w = class.map(to_wide);
    let title_w = title.map(to_wide);
    let hwnd = unsafe {
        FindWindowW(
            class_w.as_ref().map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr())),
            title_w.as_ref().map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr())),
        )
    }
    .map_err(|e| CaptureError::TargetNotFound { reason: e.to_string() })?;
    if hwnd.is_invalid() {
        return Err(CaptureError::TargetNotFound {
            reason: format!("no window matches class={class:?} title={title:?}"),
        });
    }
    Ok(WindowId(hwnd.0 as isize))
}

/// The full-desktop window, used when no specific target is requested.
pub fn desktop_window() -> WindowId {
    WindowId(unsafe { GetDesktopWindow() }.0 as isize)
}

// ── Region probing ────────────────────────────────────────────────────────────

/// Read the target's current bounding rectangle, corrected to physical
/// pixels with the monitor's display-scale ratio.
pub fn probe_region(window: WindowId) -> Result<CaptureRegion, CaptureError> {
    let hwnd = hwnd_of(window);
    let mut rc = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut rc) }
        .map_err(|e| CaptureError::TargetNotFound { reason: e.to_string() })?;

    let scale = monitor_scale(hwnd);
    let width = ((rc.right - rc.left) as f32 * scale) as u32;
    let height = ((rc.bottom - rc.top) as f32 * scale) as u32;
    if width == 0 || height == 0 {
        return Err(CaptureError::TargetNotFound {
            reason: format!("degenerate window rectangle {width}×{height}"),
        });
    }
    Ok(CaptureRegion { width, height, scale })
}

/// Physical over logical pixel ratio of the monitor showing `hwnd`.
/// Falls back to 1.0 when the display mode cannot be queried.
fn monitor_scale(hwnd: HWND) -> f32 {
    unsafe {
        let monitor = MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST);
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = size_of::<MONITORINFOEXW>() as u32;
        if !GetMonitorInfoW(monitor, &mut info.monitorInfo).as_bool() {
            return 1.0;
        }

        let mut devmode = DEVMODEW::default();
        devmode.dmSize = size_of::<DEVMODEW>() as u16;
        if !EnumDisplaySettingsW(
            PCWSTR(info.szDevice.as_ptr()),
            ENUM_CURRENT_SETTINGS,
            &mut devmode,
        )
        .as_bool()
        {
            return 1.0;
        }

        let logical = info.monitorInfo.rcMonitor.right - info.monitorInfo.rcMonitor.left;
        if logical <= 0 {
            1.0
        } else {
            devmode.dmPelsWidth as f32 / logical as f32
        }
    }
}

// ── RegionGrabber ─────────────────────────────────────────────────────────────

/// Grabs one window region per call into a padded BGRA buffer.
#[derive(Debug)]
pub struct RegionGrabber {
    hwnd: HWND,
    layout: GrabLayout,
}

impl RegionGrabber {
    pub fn open(window: WindowId, layout: GrabLayout) -> Result<Self, CaptureError> {
        let hwnd = hwnd_of(window);
        if hwnd.is_invalid() {
            return Err(CaptureError::TargetNotFound {
                reason: "null window handle".into(),
            });
        }
        Ok(Self { hwnd, layout })
    }

    pub fn layout(&self) -> GrabLayout {
        self.layout
    }

    /// Blit the target's current contents into `dst`, centered at the
    /// layout offset. Letterbox bytes outside the blit rectangle are left
    /// untouched. `dst` must hold exactly one padded 32-bit frame.
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

        unsafe {
            let wnd_dc = GetDC(self.hwnd);
            if wnd_dc.is_invalid() {
                return Err(CaptureError::GrabFailed {
                    reason: "GetDC returned a null device context".into(),
                });
            }
            let mem_dc = CreateCompatibleDC(wnd_dc);
            let bitmap =
                CreateCompatibleBitmap(wnd_dc, padded.width as i32, padded.height as i32);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(
                mem_dc,
                offset.0 as i32,
                offset.1 as i32,
                region.width as i32,
                region.height as i32,
                wnd_dc,
                0,
                0,
                SRCCOPY,
            );

            // Negative height: top-down row order.
            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: padded.width as i32,
                    biHeight: -(padded.height as i32),
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                padded.height,
                Some(dst.as_mut_ptr() as *mut c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(self.hwnd, wnd_dc);

            blit.map_err(|e| CaptureError::GrabFailed { reason: e.to_string() })?;
            if lines == 0 {
                return Err(CaptureError::GrabFailed {
                    reason: "GetDIBits copied no scan lines".into(),
                });
            }
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn hwnd_of(window: WindowId) -> HWND {
    HWND(window.0 as *mut c_void)
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
