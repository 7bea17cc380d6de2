use std::time::Duration;

use pigwire_transport::{DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Environment variable naming the daemon host.
pub const ENV_ADDR: &str = "PIGPIO_ADDR";
/// Environment variable naming the daemon port.
pub const ENV_PORT: &str = "PIGPIO_PORT";

/// Connection parameters for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Daemon host name or address. Default: `localhost`.
    pub host: String,
    /// Daemon port. Default: 8888.
    pub port: u16,
    /// Upper bound on each connection attempt. Default: none.
    pub connect_timeout: Option<Duration>,
    /// How often the notification loop re-checks whether it should stop.
    /// Default: 1 second.
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    /// Configuration for an explicit host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Defaults overridden by `PIGPIO_ADDR` and `PIGPIO_PORT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup(ENV_ADDR).filter(|v| !v.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(ENV_PORT).filter(|v| !v.trim().is_empty()) {
            config.port = port.trim().parse().map_err(|_| {
                SessionError::Config(format!("{ENV_PORT} is not a valid port: {port}"))
            })?;
        }
        Ok(config)
    }

    /// `host:port` for diagnostics.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
