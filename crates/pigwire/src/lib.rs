//! Client for the pigpio daemon socket interface.
//!
//! pigwire talks to a running pigpio daemon over TCP: one connection for
//! request/response commands and, once a callback is registered, a second
//! one carrying level, watchdog and event notifications.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connections to the daemon
//! - [`frame`]: Command headers, extents and notification reports
//! - [`session`]: Transactions, callbacks, notification dispatch and
//!   daemon status codes

/// Re-export transport types.
pub mod transport {
    pub use pigwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pigwire_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use pigwire_session::*;
}

pub use pigwire_session::{Edge, Pin, Session, SessionConfig, SessionError};
