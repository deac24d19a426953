//! Error types for steplog
//!
//! Only caller misuse surfaces as [`Error`]. Capture, sink and embedding
//! failures have their own small error types; the engine contains them and
//! reports them as degraded writes instead of returning them.

use thiserror::Error;

use crate::commit::BufferAction;

/// Result type alias using steplog Error
pub type Result<T> = std::result::Result<T, Error>;

/// steplog error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Step description must not be empty")]
    EmptyDescription,

    #[error("A failure description is required for {action}")]
    MissingFailureDescription { action: BufferAction },

    #[error("Unknown step mode: {0}")]
    UnknownMode(String),

    #[error("Unknown buffer action: {0}")]
    UnknownAction(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Failure reported by a [`ScreenshotSource`](crate::ScreenshotSource)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screenshot source unavailable: {0}")]
    Unavailable(String),

    #[error("capture failed: {0}")]
    Failed(String),
}

/// Failure reported by a [`ReportSink`](crate::ReportSink)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("report test is closed")]
    Closed,

    #[error("entry rejected: {0}")]
    Rejected(String),
}

/// Failure reported by an [`ImageEmbedder`](crate::ImageEmbedder)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    #[error("screenshot data is empty")]
    Empty,

    #[error("screenshot data is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("unknown screenshot style: {0}")]
    UnknownStyle(String),
}
