use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pin::Pin;
use crate::session::Session;

/// Level transition a callback is registered for, or was invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Rising,
    Falling,
    Either,
    /// Watchdog expiry. Delivered only; never registrable.
    Timeout,
}

impl Edge {
    /// Whether a callback registered for `self` accepts a pin now at `high`.
    pub(crate) fn accepts(self, high: bool) -> bool {
        match self {
            Edge::Either => true,
            Edge::Rising => high,
            Edge::Falling => !high,
            Edge::Timeout => false,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Edge::Rising => "rising",
            Edge::Falling => "falling",
            Edge::Either => "either",
            Edge::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Receives level changes and watchdog timeouts for one pin.
///
/// Invoked on the notification thread while the registry lock is held.
/// Implementations must not add or remove callbacks on the same session
/// from inside the call; doing so deadlocks the notification thread.
pub trait LevelHandler: Send + Sync {
    fn on_level_change(&self, pin: &Pin, edge: Edge, tick: u32);
}

impl<F> LevelHandler for F
where
    F: Fn(&Pin, Edge, u32) + Send + Sync,
{
    fn on_level_change(&self, pin: &Pin, edge: Edge, tick: u32) {
        self(pin, edge, tick)
    }
}

/// Receives application events.
///
/// Same threading constraints as [`LevelHandler`].
pub trait EventHandler: Send + Sync {
    fn on_event(&self, session: &Session, event: u32, tick: u32);
}

impl<F> EventHandler for F
where
    F: Fn(&Session, u32, u32) + Send + Sync,
{
    fn on_event(&self, session: &Session, event: u32, tick: u32) {
        self(session, event, tick)
    }
}

/// Identity comparison for registered handlers.
pub(crate) fn same_handler<T: ?Sized>(left: &Arc<T>, right: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
}

enum Target {
    Level {
        pin: u32,
        edge: Edge,
        handler: Arc<dyn LevelHandler>,
    },
    Event {
        event: u32,
        handler: Arc<dyn EventHandler>,
    },
}

/// A registered callback that can be cancelled later.
///
/// Dropping the registration leaves the callback in place.
pub struct CallbackRegistration {
    session: Session,
    target: Target,
}

impl CallbackRegistration {
    pub(crate) fn level(
        session: Session,
        pin: u32,
        edge: Edge,
        handler: Arc<dyn LevelHandler>,
    ) -> Self {
        Self {
            session,
            target: Target::Level { pin, edge, handler },
        }
    }

    pub(crate) fn event(session: Session, event: u32, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            session,
            target: Target::Event { event, handler },
        }
    }

    /// Remove the callback. Returns whether it was still registered.
    pub fn cancel(self) -> Result<bool> {
        match &self.target {
            Target::Level { pin, edge, handler } => {
                self.session.remove_level_callback(*pin, *edge, handler)
            }
            Target::Event { event, handler } => {
                self.session.remove_event_callback(*event, handler)
            }
        }
    }
}

impl fmt::Debug for CallbackRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("CallbackRegistration");
        match &self.target {
            Target::Level { pin, edge, .. } => dbg.field("pin", pin).field("edge", edge),
            Target::Event { event, .. } => dbg.field("event", event),
        };
        dbg.finish()
    }
}
