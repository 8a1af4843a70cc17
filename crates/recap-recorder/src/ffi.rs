//! Opaque-handle C surface for host embedding.
//!
//! Three-call lifecycle: `recap_create` → `recap_capture_frame` per tick →
//! `recap_stop`. The handle is a boxed [`CaptureSession`]; a null handle is
//! always a no-op.

use std::ffi::{c_char, c_int, CStr};
use std::path::PathBuf;
use std::ptr;

use recap_capture_windows::desktop_window;
use recap_core::{RecordingConfig, Resolution};
use tracing::warn;

use crate::session::CaptureSession;

/// Create a session recording the desktop region to `path`.
///
/// Returns null when the arguments are invalid, the target cannot be
/// resolved, or encoder initialization fails.
///
/// # Safety
///
/// `path` must point to a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn recap_create(
    path: *const c_char,
    fps: c_int,
    width: c_int,
    height: c_int,
) -> *mut CaptureSession {
    if path.is_null() || fps <= 0 || width <= 0 || height <= 0 {
        return ptr::null_mut();
    }
    let Ok(path) = CStr::from_ptr(path).to_str() else {
        return ptr::null_mut();
    };

    let config = RecordingConfig {
        output: PathBuf::from(path),
        resolution: Resolution::new(width as u32, height as u32),
        target_fps: fps as u32,
        ..Default::default()
    };
    match CaptureSession::init(desktop_window(), config) {
        Ok(session) => Box::into_raw(Box::new(session)),
        Err(e) => {
            warn!("recap_create failed: {e}");
            ptr::null_mut()
        }
    }
}

/// Capture and encode one frame. Errors follow the drop-frame policy and
/// never cross the boundary.
///
/// # Safety
///
/// `session` must be null or a handle returned by [`recap_create`] that has
/// not been passed to [`recap_stop`].
#[no_mangle]
pub unsafe extern "C" fn recap_capture_frame(session: *mut CaptureSession) {
    if let Some(session) = session.as_mut() {
        session.capture_and_push();
    }
}

/// Finalize the output file and destroy the session.
///
/// # Safety
///
/// `session` must be null or a handle returned by [`recap_create`]; it is
/// invalid after this call.
#[no_mangle]
pub unsafe extern "C" fn recap_stop(session: *mut CaptureSession) {
    if session.is_null() {
        return;
    }
    Box::from_raw(session).finish();
}
