//! Pin, PWM, bank and system commands.

use std::fmt;
use std::str::FromStr;

use pigwire_frame::{command, Extent};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::session::Session;

/// Pin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Input,
    Output,
    Alt0,
    Alt1,
    Alt2,
    Alt3,
    Alt4,
    Alt5,
}

impl Mode {
    /// Daemon encoding of the mode.
    pub fn code(self) -> u32 {
        match self {
            Mode::Input => 0,
            Mode::Output => 1,
            Mode::Alt0 => 4,
            Mode::Alt1 => 5,
            Mode::Alt2 => 6,
            Mode::Alt3 => 7,
            Mode::Alt4 => 3,
            Mode::Alt5 => 2,
        }
    }

    /// Decode a daemon mode value.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Mode::Input,
            1 => Mode::Output,
            4 => Mode::Alt0,
            5 => Mode::Alt1,
            6 => Mode::Alt2,
            7 => Mode::Alt3,
            3 => Mode::Alt4,
            2 => Mode::Alt5,
            _ => return None,
        })
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Input => "input",
            Mode::Output => "output",
            Mode::Alt0 => "alt0",
            Mode::Alt1 => "alt1",
            Mode::Alt2 => "alt2",
            Mode::Alt3 => "alt3",
            Mode::Alt4 => "alt4",
            Mode::Alt5 => "alt5",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" | "in" | "r" => Ok(Mode::Input),
            "output" | "out" | "w" => Ok(Mode::Output),
            "alt0" => Ok(Mode::Alt0),
            "alt1" => Ok(Mode::Alt1),
            "alt2" => Ok(Mode::Alt2),
            "alt3" => Ok(Mode::Alt3),
            "alt4" => Ok(Mode::Alt4),
            "alt5" => Ok(Mode::Alt5),
            other => Err(format!("unknown pin mode: {other}")),
        }
    }
}

/// Internal pull resistor setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    Off,
    Down,
    Up,
}

impl Pull {
    /// Daemon encoding of the pull setting.
    pub fn code(self) -> u32 {
        match self {
            Pull::Off => 0,
            Pull::Down => 1,
            Pull::Up => 2,
        }
    }
}

impl Session {
    /// Set the function of `pin`.
    pub fn set_mode(&self, pin: u32, mode: Mode) -> Result<()> {
        self.execute_checked(command::MODES, pin, mode.code(), &[])?;
        Ok(())
    }

    /// Current function of `pin`.
    pub fn mode(&self, pin: u32) -> Result<Mode> {
        let code = self.execute_checked(command::MODEG, pin, 0, &[])?;
        Mode::from_code(code).ok_or_else(|| {
            SessionError::UnexpectedReply(format!("unknown mode {code} for pin {pin}"))
        })
    }

    /// Set the internal pull resistor of `pin`.
    pub fn set_pull_up_down(&self, pin: u32, pull: Pull) -> Result<()> {
        self.execute_checked(command::PUD, pin, pull.code(), &[])?;
        Ok(())
    }

    /// Current level of `pin`: `false` is low, `true` is high.
    pub fn read(&self, pin: u32) -> Result<bool> {
        Ok(self.execute_checked(command::READ, pin, 0, &[])? != 0)
    }

    /// Drive `pin` high or low, switching it to output.
    pub fn write(&self, pin: u32, high: bool) -> Result<()> {
        self.execute_checked(command::WRITE, pin, u32::from(high), &[])?;
        Ok(())
    }

    /// Start PWM on `pin`. `dutycycle` is interpreted against the pin's range.
    pub fn set_pwm_dutycycle(&self, pin: u32, dutycycle: u32) -> Result<()> {
        self.execute_checked(command::PWM, pin, dutycycle, &[])?;
        Ok(())
    }

    /// Dutycycle last set on `pin`.
    pub fn pwm_dutycycle(&self, pin: u32) -> Result<u32> {
        self.execute_checked(command::GDC, pin, 0, &[])
    }

    /// Set the PWM range. Returns the real range the hardware will use.
    pub fn set_pwm_range(&self, pin: u32, range: u32) -> Result<u32> {
        self.execute_checked(command::PRS, pin, range, &[])
    }

    /// PWM range of `pin`.
    pub fn pwm_range(&self, pin: u32) -> Result<u32> {
        self.execute_checked(command::PRG, pin, 0, &[])
    }

    /// Set the PWM frequency in Hz. Returns the closest frequency available.
    pub fn set_pwm_frequency(&self, pin: u32, frequency: u32) -> Result<u32> {
        self.execute_checked(command::PFS, pin, frequency, &[])
    }

    /// PWM frequency of `pin` in Hz.
    pub fn pwm_frequency(&self, pin: u32) -> Result<u32> {
        self.execute_checked(command::PFG, pin, 0, &[])
    }

    /// Servo pulse width in microseconds; 0 stops pulses.
    pub fn set_servo_pulsewidth(&self, pin: u32, pulsewidth: u32) -> Result<()> {
        self.execute_checked(command::SERVO, pin, pulsewidth, &[])?;
        Ok(())
    }

    /// Arm a watchdog that reports a timeout edge after `timeout_ms` without
    /// a level change. 0 disarms it.
    pub fn set_watchdog(&self, pin: u32, timeout_ms: u32) -> Result<()> {
        self.execute_checked(command::WDOG, pin, timeout_ms, &[])?;
        Ok(())
    }

    /// Levels of pins 0-31.
    ///
    /// Every bit pattern is a valid answer, so the raw value is returned
    /// without status interpretation.
    pub fn read_bank_1(&self) -> Result<u32> {
        self.execute(command::BR1, 0, 0, &[])
    }

    /// Levels of pins 32-53.
    pub fn read_bank_2(&self) -> Result<u32> {
        self.execute(command::BR2, 0, 0, &[])
    }

    /// Drive low every output pin 0-31 whose bit is set.
    pub fn clear_bank_1(&self, bits: u32) -> Result<()> {
        self.execute_checked(command::BC1, bits, 0, &[])?;
        Ok(())
    }

    /// Drive high every output pin 0-31 whose bit is set.
    pub fn set_bank_1(&self, bits: u32) -> Result<()> {
        self.execute_checked(command::BS1, bits, 0, &[])?;
        Ok(())
    }

    /// Emit a pulse of `pulse_len` microseconds on `pin`, high or low.
    pub fn gpio_trigger(&self, pin: u32, pulse_len: u32, high: bool) -> Result<()> {
        let level = Extent::from_u32(u32::from(high));
        self.execute_checked(command::TRIG, pin, pulse_len, &[level])?;
        Ok(())
    }

    /// Current daemon tick in microseconds. Wraps every ~72 minutes.
    pub fn tick(&self) -> Result<u32> {
        self.execute(command::TICK, 0, 0, &[])
    }

    /// Board revision code. Returned raw since every value is valid.
    pub fn hardware_revision(&self) -> Result<u32> {
        self.execute(command::HWVER, 0, 0, &[])
    }

    /// Version of the running daemon.
    pub fn daemon_version(&self) -> Result<u32> {
        self.execute_checked(command::PIGPV, 0, 0, &[])
    }

    /// Signal application event `event` to every listener on the daemon.
    pub fn event_trigger(&self, event: u32) -> Result<()> {
        self.execute_checked(command::EVT, event, 0, &[])?;
        Ok(())
    }
}
