pub mod config;
pub mod errors;
pub mod types;

pub use config::{EncoderConfig, RecordingConfig};
pub use errors::{CaptureError, EncoderError, RecorderError};
pub use types::*;
