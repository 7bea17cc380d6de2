use std::io::{ErrorKind, Read};

use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use pigwire_transport::{DaemonStream, TransportError};

use crate::codec::{decode_header, Header, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::report::{NotificationReport, REPORT_SIZE};

const REPORT_BUFFER_CAPACITY: usize = 64 * REPORT_SIZE;
const READ_CHUNK_SIZE: usize = 16 * REPORT_SIZE;

/// Read exactly one response header.
///
/// Reads no further than the header, so any reply payload stays on the
/// stream for [`read_payload`].
pub fn read_header<R: Read>(src: &mut R) -> Result<Header> {
    let mut raw = [0u8; HEADER_SIZE];
    read_exact(src, &mut raw)?;
    Ok(decode_header(&raw))
}

/// Read exactly `len` raw reply bytes.
pub fn read_payload<R: Read>(src: &mut R, len: usize) -> Result<Bytes> {
    let mut raw = vec![0u8; len];
    read_exact(src, &mut raw)?;
    Ok(Bytes::from(raw))
}

fn read_exact<R: Read>(src: &mut R, dst: &mut [u8]) -> Result<()> {
    src.read_exact(dst).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    })
}

/// Reads notification reports from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete reports.
pub struct ReportReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> ReportReader<T> {
    /// Create a new report reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(REPORT_BUFFER_CAPACITY),
        }
    }

    /// Returns true if a complete report is already buffered, meaning the
    /// next [`read_report`](Self::read_report) will not touch the stream.
    pub fn has_buffered_report(&self) -> bool {
        self.buf.len() >= REPORT_SIZE
    }

    /// Read the next complete report (blocking).
    ///
    /// Returns `Ok(None)` when the peer closed the stream on a report
    /// boundary and `Err(FrameError::ConnectionClosed)` when it closed
    /// mid-report.
    pub fn read_report(&mut self) -> Result<Option<NotificationReport>> {
        loop {
            if let Some(report) = self.take_buffered() {
                return Ok(Some(report));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn take_buffered(&mut self) -> Option<NotificationReport> {
        if self.buf.len() < REPORT_SIZE {
            return None;
        }
        let mut raw = [0u8; REPORT_SIZE];
        raw.copy_from_slice(&self.buf[..REPORT_SIZE]);
        self.buf.advance(REPORT_SIZE);
        Some(NotificationReport::decode(&raw))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Outcome of waiting for one report with a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWait {
    /// A complete report arrived.
    Report(NotificationReport),
    /// The timeout elapsed with nothing to read.
    Idle,
    /// The daemon closed the stream.
    Closed,
}

impl ReportReader<DaemonStream> {
    /// Wait up to `timeout` for the next report.
    ///
    /// Buffered reports are returned without polling the socket.
    pub fn wait_report(&mut self, timeout: Duration) -> Result<ReportWait> {
        if !self.has_buffered_report() {
            let ready = self
                .inner
                .poll_readable(timeout)
                .map_err(transport_to_frame_error)?;
            if !ready {
                return Ok(ReportWait::Idle);
            }
        }
        Ok(match self.read_report()? {
            Some(report) => ReportWait::Report(report),
            None => ReportWait::Closed,
        })
    }
}

fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) | TransportError::Poll(io) => FrameError::Io(io),
        TransportError::Resolve { source, .. } | TransportError::Connect { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
