//! Wire codec for the pigpio socket protocol.
//!
//! Every command exchange uses the same fixed header, in both directions:
//! - A 4-byte command code
//! - Two 4-byte generic parameters
//! - A 4-byte length/status word
//!
//! Requests may be followed by extents whose combined length is carried in
//! the last header word. The notification socket instead carries a stream
//! of fixed 12-byte reports.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod report;
pub mod writer;

pub use codec::{decode_header, encode_request, Extent, Header, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use reader::{read_header, read_payload, ReportReader, ReportWait};
pub use report::{
    NotificationReport, ReportKind, NTFY_FLAGS_ALIVE, NTFY_FLAGS_EVENT, NTFY_FLAGS_GPIO,
    NTFY_FLAGS_WDOG, REPORT_SIZE,
};
pub use writer::RequestWriter;
