/// Notification report: seqno (2) + flags (2) + tick (4) + level (4) = 12 bytes.
pub const REPORT_SIZE: usize = 12;

/// Flag bit: the report announces an application event.
pub const NTFY_FLAGS_EVENT: u16 = 1 << 7;
/// Flag bit: keep-alive report, carries no state change.
pub const NTFY_FLAGS_ALIVE: u16 = 1 << 6;
/// Flag bit: watchdog timeout on the pin in the low bits.
pub const NTFY_FLAGS_WDOG: u16 = 1 << 5;
/// Mask selecting the pin or event number from the flags.
pub const NTFY_FLAGS_GPIO: u16 = 31;

/// One report from the notification socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationReport {
    pub seqno: u16,
    pub flags: u16,
    /// Microsecond tick, wraps every ~72 minutes.
    pub tick: u32,
    /// Levels of pins 0-31, one bit per pin.
    pub level: u32,
}

/// How a report must be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Level snapshot to compare against the previous one.
    Levels,
    /// Watchdog expired on `pin`.
    Watchdog { pin: u32 },
    /// Application event `event` fired.
    Event { event: u32 },
    /// Keep-alive or unrecognised flags; nothing to dispatch.
    Ignored,
}

impl NotificationReport {
    /// Decode from the 12-byte wire layout.
    pub fn decode(src: &[u8; REPORT_SIZE]) -> Self {
        Self {
            seqno: u16::from_ne_bytes([src[0], src[1]]),
            flags: u16::from_ne_bytes([src[2], src[3]]),
            tick: u32::from_ne_bytes([src[4], src[5], src[6], src[7]]),
            level: u32::from_ne_bytes([src[8], src[9], src[10], src[11]]),
        }
    }

    /// Encode into the 12-byte wire layout.
    pub fn to_bytes(&self) -> [u8; REPORT_SIZE] {
        let mut out = [0u8; REPORT_SIZE];
        out[0..2].copy_from_slice(&self.seqno.to_ne_bytes());
        out[2..4].copy_from_slice(&self.flags.to_ne_bytes());
        out[4..8].copy_from_slice(&self.tick.to_ne_bytes());
        out[8..12].copy_from_slice(&self.level.to_ne_bytes());
        out
    }

    /// Interpret the flags word.
    ///
    /// Zero flags is a level snapshot. The watchdog bit takes precedence
    /// over the event bit.
    pub fn kind(&self) -> ReportKind {
        let low = u32::from(self.flags & NTFY_FLAGS_GPIO);
        if self.flags == 0 {
            ReportKind::Levels
        } else if self.flags & NTFY_FLAGS_WDOG != 0 {
            ReportKind::Watchdog { pin: low }
        } else if self.flags & NTFY_FLAGS_EVENT != 0 {
            ReportKind::Event { event: low }
        } else {
            ReportKind::Ignored
        }
    }
}
