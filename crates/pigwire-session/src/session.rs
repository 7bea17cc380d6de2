use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use pigwire_frame::command::command_name;
use pigwire_frame::{read_header, read_payload, Extent, FrameError, Header, RequestWriter};
use pigwire_transport::DaemonStream;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::registry::Registry;
use crate::status::DaemonStatus;

/// Exclusive access to the command socket.
pub(crate) struct CommandChannel {
    writer: RequestWriter<DaemonStream>,
}

impl CommandChannel {
    fn stream(&mut self) -> &mut DaemonStream {
        self.writer.get_mut()
    }
}

pub(crate) struct Shared {
    config: SessionConfig,
    command: Mutex<CommandChannel>,
    registry: Mutex<Registry>,
    closed: AtomicBool,
    desynced: AtomicBool,
}

/// One logical connection to the daemon.
///
/// Cloning is cheap and every clone refers to the same connection. All
/// command traffic is serialized through a single lock on the command
/// socket, so a session can be shared across threads.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    /// Connect the command socket.
    pub fn connect(config: SessionConfig) -> Result<Self> {
        let stream = open_stream(&config)?;
        info!(addr = %config.address(), "connected to daemon");

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                command: Mutex::new(CommandChannel {
                    writer: RequestWriter::new(stream),
                }),
                registry: Mutex::new(Registry::default()),
                closed: AtomicBool::new(false),
                desynced: AtomicBool::new(false),
            }),
        })
    }

    /// Connect using `PIGPIO_ADDR`/`PIGPIO_PORT` or the defaults.
    pub fn connect_from_env() -> Result<Self> {
        Self::connect(SessionConfig::from_env()?)
    }

    /// Connection parameters this session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Returns true once [`disconnect`](Self::disconnect) has run.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Perform one request/response exchange and release the command lock.
    ///
    /// Returns the raw `p3` of the response, which may be a negative status
    /// reinterpreted as unsigned. See [`execute_checked`](Self::execute_checked).
    pub fn execute(&self, command: u32, p1: u32, p2: u32, extents: &[Extent]) -> Result<u32> {
        let (_channel, response) = self.transact(command, p1, p2, extents)?;
        Ok(response.p3)
    }

    /// Like [`execute`](Self::execute), mapping a negative result to
    /// [`SessionError::Status`].
    pub fn execute_checked(
        &self,
        command: u32,
        p1: u32,
        p2: u32,
        extents: &[Extent],
    ) -> Result<u32> {
        check_status(self.execute(command, p1, p2, extents)?)
    }

    /// Perform the header exchange but keep the command lock held.
    ///
    /// The returned guard must be used to read any reply payload the
    /// command produces. The lock is released when the guard is dropped,
    /// including on early return or unwinding.
    pub fn execute_held(
        &self,
        command: u32,
        p1: u32,
        p2: u32,
        extents: &[Extent],
    ) -> Result<HeldResponse<'_>> {
        let (channel, response) = self.transact(command, p1, p2, extents)?;
        Ok(HeldResponse {
            channel,
            response,
            desynced: &self.shared.desynced,
        })
    }

    /// Like [`execute_held`](Self::execute_held), releasing the lock and
    /// returning [`SessionError::Status`] when the result is negative.
    pub fn execute_held_checked(
        &self,
        command: u32,
        p1: u32,
        p2: u32,
        extents: &[Extent],
    ) -> Result<HeldResponse<'_>> {
        let held = self.execute_held(command, p1, p2, extents)?;
        check_status(held.value())?;
        Ok(held)
    }

    fn transact(
        &self,
        command: u32,
        p1: u32,
        p2: u32,
        extents: &[Extent],
    ) -> Result<(MutexGuard<'_, CommandChannel>, Header)> {
        let mut channel = self.lock_command()?;

        channel
            .writer
            .send(command, p1, p2, extents)
            .map_err(|err| self.desync(err))?;
        let response = read_header(channel.stream()).map_err(|err| self.desync(err))?;

        if response.command != command {
            self.shared.desynced.store(true, Ordering::SeqCst);
            warn!(
                sent = command_name(command),
                received = response.command,
                "daemon echoed a different command"
            );
            return Err(SessionError::BadReceive {
                sent: command,
                received: response.command,
            });
        }

        debug!(
            command = command_name(command),
            p1,
            p2,
            result = response.status(),
            "transaction complete"
        );
        Ok((channel, response))
    }

    fn desync(&self, err: FrameError) -> SessionError {
        self.shared.desynced.store(true, Ordering::SeqCst);
        err.into()
    }

    /// Acquire the command lock. Shared with the notification registration
    /// handshake.
    pub(crate) fn lock_command(&self) -> Result<MutexGuard<'_, CommandChannel>> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let channel = self
            .shared
            .command
            .lock()
            .map_err(|_| SessionError::Desynchronized)?;
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        if self.shared.desynced.load(Ordering::SeqCst) {
            return Err(SessionError::Desynchronized);
        }
        Ok(channel)
    }

    pub(crate) fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a second connection to the same daemon.
    pub(crate) fn open_notify_stream(&self) -> Result<DaemonStream> {
        open_stream(&self.shared.config)
    }

    /// Tear the session down.
    ///
    /// Clears both callback lists and interest bitmasks, waits for the
    /// notification thread to observe the empty lists and exit, then shuts
    /// down the command socket. Calling this again is a no-op.
    ///
    /// Must not be called from inside a callback: callbacks run with the
    /// registry locked, so doing so deadlocks.
    pub fn disconnect(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let worker = {
            let mut registry = self.lock_registry();
            registry.clear();
            registry.worker.take()
        };

        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("notification thread panicked");
            }
        }

        let channel = self
            .shared
            .command
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        channel.writer.get_ref().shutdown()?;
        info!(addr = %self.shared.config.address(), "disconnected from daemon");
        Ok(())
    }

    /// Whether two handles refer to the same session.
    pub fn same_session(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("addr", &self.shared.config.address())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A response whose command lock is still held.
///
/// Read the reply payload with [`read_payload`](Self::read_payload) or
/// through [`Read`] before dropping it.
pub struct HeldResponse<'a> {
    channel: MutexGuard<'a, CommandChannel>,
    response: Header,
    desynced: &'a AtomicBool,
}

impl HeldResponse<'_> {
    /// Raw `p3` of the response.
    pub fn value(&self) -> u32 {
        self.response.p3
    }

    /// `p3` reinterpreted as a signed status.
    pub fn status(&self) -> i32 {
        self.response.status()
    }

    /// The full response header.
    pub fn header(&self) -> Header {
        self.response
    }

    /// Read exactly `len` reply bytes off the command socket.
    pub fn read_payload(&mut self, len: usize) -> Result<Bytes> {
        read_payload(self.channel.stream(), len).map_err(|err| {
            self.mark_desynced();
            err.into()
        })
    }

    fn mark_desynced(&self) {
        self.desynced.store(true, Ordering::SeqCst);
    }

    /// Release the command lock.
    pub fn release(self) {}
}

/// A failed read, or the daemon closing the socket mid-reply, leaves the
/// reply partly consumed and latches the session as desynchronized, the
/// same as [`HeldResponse::read_payload`].
impl Read for HeldResponse<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.channel.stream().read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.mark_desynced();
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => Err(err),
            Err(err) => {
                self.mark_desynced();
                Err(err)
            }
        }
    }
}

impl fmt::Debug for HeldResponse<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeldResponse")
            .field("response", &self.response)
            .finish()
    }
}

/// Map a raw result to a status error when negative.
pub fn check_status(raw: u32) -> Result<u32> {
    let status = raw as i32;
    if status < 0 {
        return Err(DaemonStatus::from_code(status).into());
    }
    Ok(raw)
}

fn open_stream(config: &SessionConfig) -> Result<DaemonStream> {
    let stream = match config.connect_timeout {
        Some(timeout) => pigwire_transport::connect_timeout(&config.host, config.port, timeout)?,
        None => pigwire_transport::connect(&config.host, config.port)?,
    };
    Ok(stream)
}
