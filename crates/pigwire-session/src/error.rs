use crate::status::DaemonStatus;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pigwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] pigwire_frame::FrameError),

    /// The response echoed a different command than the one sent.
    ///
    /// Header alignment can no longer be trusted, so the session refuses
    /// further commands after this.
    #[error("bad receive: sent command {sent}, daemon echoed {received}")]
    BadReceive { sent: u32, received: u32 },

    /// The daemon answered with a negative status.
    #[error("daemon error: {0}")]
    Status(#[from] DaemonStatus),

    /// The timeout edge is delivered by watchdogs and cannot be registered.
    #[error("timeout edge cannot be registered for callbacks")]
    TimeoutEdge,

    /// Callback pins are limited to 0-31.
    #[error("pin {0} out of range for callbacks (0-31)")]
    InvalidPin(u32),

    /// Event codes are limited to 0-31.
    #[error("event {0} out of range (0-31)")]
    InvalidEvent(u32),

    /// The notification thread could not be started.
    #[error("notification stream failed: {0}")]
    NotifyFailed(String),

    /// The session was disconnected.
    #[error("session closed")]
    Closed,

    /// An earlier exchange desynchronized the command socket.
    #[error("command socket desynchronized")]
    Desynchronized,

    /// The daemon answered with a value outside the command's domain.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// Invalid connection configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// The daemon status carried by this error, if any.
    pub fn status(&self) -> Option<DaemonStatus> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
