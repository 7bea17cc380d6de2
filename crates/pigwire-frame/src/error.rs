/// Errors that can occur during header and report encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The combined extent length does not fit the 32-bit length word.
    #[error("extents too large ({size} bytes, max {max})")]
    ExtentTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete header or report arrived.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
