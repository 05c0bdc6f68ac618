//! Error types for edgefix.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for edgefix operations.
///
/// Configuration errors are raised while a clip graph is being built, before
/// any frame is produced. Everything else surfaces from frame production.
#[derive(Error, Debug)]
pub enum EdgefixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Schedule error in {}:{line}: {reason}", path.display())]
    Schedule {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    #[error("Frame {index} out of range (clip has {len} frames)")]
    FrameOutOfRange { index: u32, len: u32 },

    #[error("Frame source error: {0}")]
    Source(String),

    #[error("Resample error: {0}")]
    Resample(String),
}

impl EdgefixError {
    /// Shorthand for [`EdgefixError::InvalidParameter`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Whether this error was raised by setup-time validation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter(_)
                | Self::Schedule { .. }
                | Self::NotFound(_)
                | Self::UnsupportedFormat(_)
                | Self::FormatMismatch(_)
        )
    }
}

/// Result type alias for edgefix operations.
pub type Result<T> = std::result::Result<T, EdgefixError>;
