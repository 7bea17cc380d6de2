//! Session layer for the pigpio daemon.
//!
//! A [`Session`] owns the command connection and serializes every
//! request/response exchange on it. Registering the first level or event
//! callback opens a second connection, turns it into a notification stream
//! and starts a background thread that dispatches reports to callbacks.
//!
//! ```no_run
//! use pigwire_session::{Edge, Session};
//!
//! let session = Session::connect_from_env()?;
//! let watch = session.on_level_change(17, Edge::Rising, |pin, edge, tick| {
//!     println!("pin {} {edge} at {tick}", pin.number());
//! })?;
//! // ...
//! watch.cancel()?;
//! session.disconnect()?;
//! # Ok::<(), pigwire_session::SessionError>(())
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod gpio;
pub mod i2c;
mod notify;
pub mod pin;
mod registry;
pub mod session;
pub mod status;

#[cfg(test)]
mod test_support;

pub use callback::{CallbackRegistration, Edge, EventHandler, LevelHandler};
pub use config::{SessionConfig, ENV_ADDR, ENV_PORT};
pub use error::{Result, SessionError};
pub use gpio::{Mode, Pull};
pub use i2c::I2cHandle;
pub use pin::Pin;
pub use registry::MAX_NOTIFY_ID;
pub use session::{check_status, HeldResponse, Session};
pub use status::DaemonStatus;
