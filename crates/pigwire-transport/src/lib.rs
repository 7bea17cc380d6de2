//! TCP transport to a pigpio daemon.
//!
//! The daemon speaks over plain TCP. A session opens one connection for
//! command traffic and, lazily, a second one for the notification stream.
//! This is the lowest layer of pigwire. Everything else builds on top of
//! the [`DaemonStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::DaemonStream;
pub use tcp::{connect, connect_timeout, DEFAULT_HOST, DEFAULT_PORT};
