//! Daemon command codes.
//!
//! Only the commands this client issues are listed. Codes are fixed by the
//! daemon and must not be renumbered.

/// Set pin mode.
pub const MODES: u32 = 0;
/// Get pin mode.
pub const MODEG: u32 = 1;
/// Set pull-up/down.
pub const PUD: u32 = 2;
/// Read pin level.
pub const READ: u32 = 3;
/// Write pin level.
pub const WRITE: u32 = 4;
/// Set PWM dutycycle.
pub const PWM: u32 = 5;
/// Set PWM range.
pub const PRS: u32 = 6;
/// Set PWM frequency.
pub const PFS: u32 = 7;
/// Set servo pulsewidth.
pub const SERVO: u32 = 8;
/// Set watchdog timeout.
pub const WDOG: u32 = 9;
/// Read levels of pins 0-31.
pub const BR1: u32 = 10;
/// Read levels of pins 32-53.
pub const BR2: u32 = 11;
/// Clear pins 0-31.
pub const BC1: u32 = 12;
/// Set pins 0-31.
pub const BS1: u32 = 14;
/// Current tick.
pub const TICK: u32 = 16;
/// Hardware revision.
pub const HWVER: u32 = 17;
/// Set level-change notification bits.
pub const NB: u32 = 19;
/// Get PWM range.
pub const PRG: u32 = 22;
/// Get PWM frequency.
pub const PFG: u32 = 23;
/// Daemon version.
pub const PIGPV: u32 = 26;
/// Send trigger pulse.
pub const TRIG: u32 = 37;
/// Open I2C device.
pub const I2CO: u32 = 54;
/// Close I2C device.
pub const I2CC: u32 = 55;
/// Read bytes from I2C device.
pub const I2CRD: u32 = 56;
/// Write bytes to I2C device.
pub const I2CWD: u32 = 57;
/// Get PWM dutycycle.
pub const GDC: u32 = 83;
/// Begin notification stream on the issuing socket.
pub const NOIB: u32 = 99;
/// Set event notification bits.
pub const EVM: u32 = 115;
/// Trigger application event.
pub const EVT: u32 = 117;

/// Returns a human-readable name for a command code.
pub fn command_name(command: u32) -> &'static str {
    match command {
        MODES => "MODES",
        MODEG => "MODEG",
        PUD => "PUD",
        READ => "READ",
        WRITE => "WRITE",
        PWM => "PWM",
        PRS => "PRS",
        PFS => "PFS",
        SERVO => "SERVO",
        WDOG => "WDOG",
        BR1 => "BR1",
        BR2 => "BR2",
        BC1 => "BC1",
        BS1 => "BS1",
        TICK => "TICK",
        HWVER => "HWVER",
        NB => "NB",
        PRG => "PRG",
        PFG => "PFG",
        PIGPV => "PIGPV",
        TRIG => "TRIG",
        I2CO => "I2CO",
        I2CC => "I2CC",
        I2CRD => "I2CRD",
        I2CWD => "I2CWD",
        GDC => "GDC",
        NOIB => "NOIB",
        EVM => "EVM",
        EVT => "EVT",
        _ => "UNKNOWN",
    }
}
