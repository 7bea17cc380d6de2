use std::fmt;

use crate::error::Result;
use crate::gpio::{Mode, Pull};
use crate::session::Session;

/// A pin number bound to the session it lives on.
///
/// Level callbacks receive one of these so they can act on the pin that
/// fired without capturing the session themselves.
#[derive(Clone)]
pub struct Pin {
    session: Session,
    number: u32,
}

impl Pin {
    /// Bind pin `number` to `session`. No daemon traffic.
    pub fn new(session: Session, number: u32) -> Self {
        Self { session, number }
    }

    /// Pin number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Session the pin is bound to.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// See [`Session::read`].
    pub fn read(&self) -> Result<bool> {
        self.session.read(self.number)
    }

    /// See [`Session::write`].
    pub fn write(&self, high: bool) -> Result<()> {
        self.session.write(self.number, high)
    }

    /// See [`Session::set_mode`].
    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        self.session.set_mode(self.number, mode)
    }

    /// See [`Session::mode`].
    pub fn mode(&self) -> Result<Mode> {
        self.session.mode(self.number)
    }

    /// See [`Session::set_pull_up_down`].
    pub fn set_pull_up_down(&self, pull: Pull) -> Result<()> {
        self.session.set_pull_up_down(self.number, pull)
    }

    /// See [`Session::set_watchdog`].
    pub fn set_watchdog(&self, timeout_ms: u32) -> Result<()> {
        self.session.set_watchdog(self.number, timeout_ms)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("number", &self.number)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pigwire_frame::command;

    use super::*;
    use crate::test_support::{Reply, StubDaemon};

    #[test]
    fn pin_operations_target_its_number() {
        let daemon = StubDaemon::start(|header, _| match header.command {
            command::READ => Reply::value(0),
            command::MODEG => Reply::value(1),
            _ => Reply::value(0),
        });
        let session = daemon.session();
        let pin = Pin::new(session.clone(), 22);

        assert_eq!(pin.number(), 22);
        assert!(pin.session().same_session(&session));
        assert!(!pin.read().unwrap());
        assert_eq!(pin.mode().unwrap(), Mode::Output);
        pin.set_watchdog(250).unwrap();

        let watchdogs = daemon.requests_for(command::WDOG);
        assert_eq!((watchdogs[0].p1, watchdogs[0].p2), (22, 250));
        assert_eq!(daemon.requests_for(command::READ)[0].p1, 22);
    }
}
