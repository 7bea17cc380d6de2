use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A connected daemon stream implementing Read + Write.
///
/// This is the fundamental I/O type returned by transport operations. It
/// wraps a TCP stream and adds the readiness poll used by the notification
/// loop.
pub struct DaemonStream {
    inner: TcpStream,
}

impl Read for DaemonStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for DaemonStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl DaemonStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Disable or enable Nagle's algorithm.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Address of the connected daemon.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Local address of this end of the connection.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }

    /// Shut down both halves of the connection.
    ///
    /// Already-disconnected sockets are not an error.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Wait up to `timeout` for the stream to become readable.
    ///
    /// Returns `Ok(false)` when the timeout elapses with nothing to read.
    /// A peer hang-up counts as readable; the following read returns 0.
    #[cfg(unix)]
    pub fn poll_readable(&self, timeout: Duration) -> Result<bool> {
        use std::os::fd::AsRawFd;

        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let mut pfd = libc::pollfd {
            fd: self.inner.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        loop {
            // SAFETY: `pfd` is a valid, writable pollfd and the count is 1;
            // the descriptor is owned by `self.inner` and open for the call.
            let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
            if rc < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(TransportError::Poll(err));
            }
            if rc > 0 && pfd.revents & libc::POLLNVAL != 0 {
                return Err(TransportError::Poll(std::io::Error::new(
                    ErrorKind::InvalidInput,
                    "descriptor not open",
                )));
            }
            return Ok(rc > 0);
        }
    }

    /// Wait up to `timeout` for the stream to become readable.
    ///
    /// Falls back to a timed `peek` on platforms without `poll(2)`.
    #[cfg(not(unix))]
    pub fn poll_readable(&self, timeout: Duration) -> Result<bool> {
        self.inner.set_read_timeout(Some(timeout))?;
        let mut probe = [0u8; 1];
        let ready = match self.inner.peek(&mut probe) {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(false)
            }
            Err(err) => Err(TransportError::Poll(err)),
        };
        self.inner.set_read_timeout(None)?;
        ready
    }
}

impl std::fmt::Debug for DaemonStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("DaemonStream");
        if let Ok(addr) = self.inner.peer_addr() {
            dbg.field("peer", &addr);
        }
        dbg.finish()
    }
}
