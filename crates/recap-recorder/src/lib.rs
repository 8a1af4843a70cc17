//! recap-recorder — the capture → encode → mux core.
//!
//! [`FrameEncoder`] owns the encode/mux pipeline for one output file;
//! [`CaptureSession`] binds a window region to it and drives one frame per
//! call. The `ffi` module exposes the opaque-handle C surface for host
//! embedding.

pub mod encoder;
pub mod ffi;
pub mod session;

pub use encoder::FrameEncoder;
pub use session::CaptureSession;
