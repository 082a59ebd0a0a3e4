use std::time::Duration;

/// Errors that can occur on a framed connection.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// The connection has been shut down; the operation will never succeed.
    #[error("connection closed")]
    Closed,

    /// No inbound payload arrived within the wait budget. Retryable.
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),

    /// Framing-level error (oversized payload, buffer overflow).
    #[error("frame error: {0}")]
    Frame(#[from] framelink_frame::FrameError),

    /// Command envelope serialization error.
    #[error("envelope error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
