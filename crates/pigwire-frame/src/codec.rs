use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Header: command (4) + p1 (4) + p2 (4) + p3 (4) = 16 bytes.
pub const HEADER_SIZE: usize = 16;

/// Request or response header.
///
/// Requests carry the total extent length in `p3`. Responses echo the
/// command and carry either a non-negative result or a negative status in
/// `p3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub command: u32,
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
}

impl Header {
    /// Create a header.
    pub fn new(command: u32, p1: u32, p2: u32, p3: u32) -> Self {
        Self {
            command,
            p1,
            p2,
            p3,
        }
    }

    /// `p3` reinterpreted as a signed status.
    pub fn status(&self) -> i32 {
        self.p3 as i32
    }

    /// Encode into the 16-byte wire layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.command.to_ne_bytes());
        out[4..8].copy_from_slice(&self.p1.to_ne_bytes());
        out[8..12].copy_from_slice(&self.p2.to_ne_bytes());
        out[12..16].copy_from_slice(&self.p3.to_ne_bytes());
        out
    }
}

/// An immutable byte span appended to a request after its header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extent(Bytes);

impl Extent {
    /// Wrap arbitrary bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// An extent with no bytes. Contributes nothing on the wire.
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    /// View a 32-bit value as a 4-byte native-endian extent.
    pub fn from_u32(value: u32) -> Self {
        Self(Bytes::copy_from_slice(&value.to_ne_bytes()))
    }

    /// Extent length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the extent carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the extent bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&'static [u8]> for Extent {
    fn from(value: &'static [u8]) -> Self {
        Self(Bytes::from_static(value))
    }
}

impl From<Vec<u8>> for Extent {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

/// Encode a request into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────────┬─────────────────────┐
/// │ Command  │ P1       │ P2       │ P3 = Σ len  │ Extent bytes ...    │
/// │ (4B NE)  │ (4B NE)  │ (4B NE)  │ (4B NE)     │ (in order given)    │
/// └──────────┴──────────┴──────────┴─────────────┴─────────────────────┘
/// ```
///
/// Returns the header that was written.
pub fn encode_request(
    command: u32,
    p1: u32,
    p2: u32,
    extents: &[Extent],
    dst: &mut BytesMut,
) -> Result<Header> {
    let total: usize = extents.iter().map(Extent::len).sum();
    let length = u32::try_from(total).map_err(|_| FrameError::ExtentTooLarge {
        size: total,
        max: u32::MAX as usize,
    })?;

    let header = Header::new(command, p1, p2, length);
    dst.reserve(HEADER_SIZE + total);
    dst.put_slice(&header.to_bytes());
    for extent in extents {
        dst.put_slice(extent.as_bytes());
    }
    Ok(header)
}

/// Decode a header from its 16-byte wire layout.
pub fn decode_header(src: &[u8; HEADER_SIZE]) -> Header {
    let word = |at: usize| u32::from_ne_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]]);
    Header {
        command: word(0),
        p1: word(4),
        p2: word(8),
        p3: word(12),
    }
}
