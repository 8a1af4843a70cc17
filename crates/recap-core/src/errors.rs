use thiserror::Error;

/// Failures while building the encode/mux pipeline. Each variant maps to
/// one short-circuiting initialization step.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("No container format matches output path '{path}'")]
    FormatNotFound { path: String },

    #[error("Encoder element '{factory}' is not available")]
    CodecNotFound { factory: String },

    #[error("Pipeline construction failed: {reason}")]
    PipelineBuild { reason: String },

    #[error("Could not open encoder or output sink: {reason}")]
    OpenFailed { reason: String },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture target not found: {reason}")]
    TargetNotFound { reason: String },

    #[error("Region grab failed: {reason}")]
    GrabFailed { reason: String },
}

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
