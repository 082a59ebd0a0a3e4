/// Errors that can occur during framing and receive buffering.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes are buffered than the operation needs. Drives the read
    /// loop's "wait for more data" retry; never surfaced to callers.
    #[error("insufficient data buffered (have {have}, need {need})")]
    InsufficientData { have: usize, need: usize },

    /// The payload exceeds what a 4-byte length header can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The receive buffer cannot grow any further. The peer is sending a
    /// frame too large to stage, or the stream is not frame-conformant.
    #[error("receive buffer full ({buffered} bytes buffered, max {max})")]
    BufferOverflow { buffered: usize, max: usize },

    /// An I/O error occurred while filling the receive buffer.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
