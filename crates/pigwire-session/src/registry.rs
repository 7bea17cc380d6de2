use std::sync::Arc;
use std::thread::JoinHandle;

use pigwire_frame::command;
use tracing::{debug, warn};

use crate::callback::{same_handler, CallbackRegistration, Edge, EventHandler, LevelHandler};
use crate::error::{Result, SessionError};
use crate::notify;
use crate::pin::Pin;
use crate::session::Session;

/// Highest pin or event number that can be watched.
pub const MAX_NOTIFY_ID: u32 = 31;

pub(crate) struct LevelNode {
    pub(crate) pin: u32,
    pub(crate) edge: Edge,
    pub(crate) handler: Arc<dyn LevelHandler>,
}

pub(crate) struct EventNode {
    pub(crate) event: u32,
    pub(crate) handler: Arc<dyn EventHandler>,
}

/// Callback lists and the notification state derived from them.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) levels: Vec<LevelNode>,
    pub(crate) events: Vec<EventNode>,
    /// Level interest last pushed to the daemon.
    pub(crate) level_bits: u32,
    /// Event interest last pushed to the daemon.
    pub(crate) event_bits: u32,
    /// Daemon-assigned handle of the running notification stream.
    pub(crate) notify_handle: Option<u32>,
    pub(crate) worker: Option<JoinHandle<()>>,
    /// Set while a notification thread is serving this registry.
    pub(crate) running: bool,
}

impl Registry {
    pub(crate) fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.events.is_empty()
    }

    pub(crate) fn wanted_level_bits(&self) -> u32 {
        self.levels.iter().fold(0, |bits, node| bits | (1 << node.pin))
    }

    pub(crate) fn wanted_event_bits(&self) -> u32 {
        self.events.iter().fold(0, |bits, node| bits | (1 << node.event))
    }

    fn remove_level(&mut self, pin: u32, edge: Edge, handler: &Arc<dyn LevelHandler>) -> bool {
        let found = self.levels.iter().position(|node| {
            node.pin == pin && node.edge == edge && same_handler(&node.handler, handler)
        });
        found.map(|index| self.levels.remove(index)).is_some()
    }

    fn remove_event(&mut self, event: u32, handler: &Arc<dyn EventHandler>) -> bool {
        let found = self
            .events
            .iter()
            .position(|node| node.event == event && same_handler(&node.handler, handler));
        found.map(|index| self.events.remove(index)).is_some()
    }

    /// Drop every callback and forget the pushed interest.
    pub(crate) fn clear(&mut self) {
        self.levels.clear();
        self.events.clear();
        self.level_bits = 0;
        self.event_bits = 0;
        self.notify_handle = None;
    }
}

impl Session {
    /// Register `handler` for `edge` transitions on `pin`.
    ///
    /// The first callback on a session starts the notification thread and
    /// blocks until the daemon has assigned it a handle. Registering the
    /// same handler twice yields two independent registrations.
    pub fn add_level_callback(
        &self,
        pin: u32,
        edge: Edge,
        handler: Arc<dyn LevelHandler>,
    ) -> Result<()> {
        if edge == Edge::Timeout {
            return Err(SessionError::TimeoutEdge);
        }
        if pin > MAX_NOTIFY_ID {
            return Err(SessionError::InvalidPin(pin));
        }

        let mut registry = self.lock_registry();
        // Checked under the lock: disconnect sets `closed` before it clears
        // the lists, so a node linked after that would never drain.
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        registry.levels.push(LevelNode { pin, edge, handler });
        if let Err(err) = self.start_interest(&mut registry) {
            registry.levels.pop();
            return Err(err);
        }
        debug!(pin, %edge, "level callback added");
        Ok(())
    }

    /// Remove one registration matching pin, edge and handler identity.
    ///
    /// Returns `Ok(false)` when nothing matched. A failure to update the
    /// daemon's interest afterwards is logged and otherwise ignored.
    pub fn remove_level_callback(
        &self,
        pin: u32,
        edge: Edge,
        handler: &Arc<dyn LevelHandler>,
    ) -> Result<bool> {
        let mut registry = self.lock_registry();
        if !registry.remove_level(pin, edge, handler) {
            return Ok(false);
        }
        debug!(pin, %edge, "level callback removed");
        if let Err(err) = self.push_interest(&mut registry) {
            warn!(error = %err, "failed to update level interest after removal");
        }
        Ok(true)
    }

    /// Register `handler` for application event `event`.
    pub fn add_event_callback(&self, event: u32, handler: Arc<dyn EventHandler>) -> Result<()> {
        if event > MAX_NOTIFY_ID {
            return Err(SessionError::InvalidEvent(event));
        }

        let mut registry = self.lock_registry();
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        registry.events.push(EventNode { event, handler });
        if let Err(err) = self.start_interest(&mut registry) {
            registry.events.pop();
            return Err(err);
        }
        debug!(event, "event callback added");
        Ok(())
    }

    /// Remove one registration matching event and handler identity.
    pub fn remove_event_callback(
        &self,
        event: u32,
        handler: &Arc<dyn EventHandler>,
    ) -> Result<bool> {
        let mut registry = self.lock_registry();
        if !registry.remove_event(event, handler) {
            return Ok(false);
        }
        debug!(event, "event callback removed");
        if let Err(err) = self.push_interest(&mut registry) {
            warn!(error = %err, "failed to update event interest after removal");
        }
        Ok(true)
    }

    /// Register a closure for `edge` transitions on `pin`.
    pub fn on_level_change<F>(&self, pin: u32, edge: Edge, f: F) -> Result<CallbackRegistration>
    where
        F: Fn(&Pin, Edge, u32) + Send + Sync + 'static,
    {
        let handler: Arc<dyn LevelHandler> = Arc::new(f);
        self.add_level_callback(pin, edge, Arc::clone(&handler))?;
        Ok(CallbackRegistration::level(self.clone(), pin, edge, handler))
    }

    /// Register a closure for application event `event`.
    pub fn on_event<F>(&self, event: u32, f: F) -> Result<CallbackRegistration>
    where
        F: Fn(&Session, u32, u32) + Send + Sync + 'static,
    {
        let handler: Arc<dyn EventHandler> = Arc::new(f);
        self.add_event_callback(event, Arc::clone(&handler))?;
        Ok(CallbackRegistration::event(self.clone(), event, handler))
    }

    /// Level interest bitmask last pushed to the daemon.
    pub fn level_interest(&self) -> u32 {
        self.lock_registry().level_bits
    }

    /// Event interest bitmask last pushed to the daemon.
    pub fn event_interest(&self) -> u32 {
        self.lock_registry().event_bits
    }

    /// Number of registered level and event callbacks.
    pub fn callback_counts(&self) -> (usize, usize) {
        let registry = self.lock_registry();
        (registry.levels.len(), registry.events.len())
    }

    /// Daemon handle of the notification stream, while one is running.
    pub fn notify_handle(&self) -> Option<u32> {
        self.lock_registry().notify_handle
    }

    /// Push interest bitmasks that differ from the last pushed values.
    pub(crate) fn refresh_interest(&self) -> Result<()> {
        let mut registry = self.lock_registry();
        self.push_interest(&mut registry)
    }

    /// Make sure the stream runs, then push interest including the node
    /// just linked. On error the caller unlinks that node again.
    fn start_interest(&self, registry: &mut Registry) -> Result<()> {
        self.ensure_notifier(registry)?;
        self.push_interest(registry)
    }

    fn push_interest(&self, registry: &mut Registry) -> Result<()> {
        let Some(handle) = registry.notify_handle else {
            return Ok(());
        };

        let level = registry.wanted_level_bits();
        if level != registry.level_bits {
            self.execute_checked(command::NB, handle, level, &[])?;
            registry.level_bits = level;
            debug!(handle, bits = format_args!("{level:#010x}"), "level interest pushed");
        }

        let events = registry.wanted_event_bits();
        if events != registry.event_bits {
            self.execute_checked(command::EVM, handle, events, &[])?;
            registry.event_bits = events;
            debug!(handle, bits = format_args!("{events:#010x}"), "event interest pushed");
        }
        Ok(())
    }

    fn ensure_notifier(&self, registry: &mut Registry) -> Result<()> {
        if registry.running {
            return Ok(());
        }

        // A previous thread that cleared `running` touches the registry no
        // more, so joining it here cannot deadlock.
        if let Some(stale) = registry.worker.take() {
            let _ = stale.join();
        }

        let (worker, handle) = notify::spawn(self)?;
        registry.worker = Some(worker);
        registry.notify_handle = Some(handle);
        registry.running = true;
        registry.level_bits = 0;
        registry.event_bits = 0;
        Ok(())
    }

    /// Called by the notification thread at the top of each iteration.
    /// Stops it, atomically with the check, once both lists are empty.
    pub(crate) fn stop_if_idle(&self) -> bool {
        let mut registry = self.lock_registry();
        if registry.is_empty() {
            registry.running = false;
            registry.notify_handle = None;
            return true;
        }
        false
    }

    /// Called by the notification thread when it exits on an error.
    pub(crate) fn mark_notify_stopped(&self) {
        let mut registry = self.lock_registry();
        registry.running = false;
        registry.notify_handle = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::test_support::{Reply, StubDaemon};

    fn noop_level() -> Arc<dyn LevelHandler> {
        Arc::new(|_: &Pin, _: Edge, _: u32| {})
    }

    fn noop_event() -> Arc<dyn EventHandler> {
        Arc::new(|_: &Session, _: u32, _: u32| {})
    }

    #[test]
    fn bitmask_derivation() {
        let mut registry = Registry::default();
        for pin in [3, 7, 31] {
            registry.levels.push(LevelNode {
                pin,
                edge: Edge::Either,
                handler: noop_level(),
            });
        }
        assert_eq!(registry.wanted_level_bits(), (1 << 3) | (1 << 7) | (1 << 31));

        let mut empty = Registry::default();
        assert_eq!(empty.wanted_level_bits(), 0);
        empty.events.push(EventNode {
            event: 2,
            handler: noop_event(),
        });
        assert_eq!(empty.wanted_event_bits(), 1 << 2);
    }

    #[test]
    fn removal_matches_all_fields() {
        let mut registry = Registry::default();
        let handler = noop_level();
        registry.levels.push(LevelNode {
            pin: 4,
            edge: Edge::Rising,
            handler: Arc::clone(&handler),
        });
        registry.levels.push(LevelNode {
            pin: 4,
            edge: Edge::Falling,
            handler: Arc::clone(&handler),
        });

        assert!(!registry.remove_level(4, Edge::Either, &handler));
        assert!(!registry.remove_level(5, Edge::Rising, &handler));
        assert!(!registry.remove_level(4, Edge::Rising, &noop_level()));
        assert!(registry.remove_level(4, Edge::Rising, &handler));
        assert_eq!(registry.levels.len(), 1);
        assert_eq!(registry.levels[0].edge, Edge::Falling);
    }

    #[test]
    fn timeout_edge_is_rejected() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();

        let err = session
            .add_level_callback(4, Edge::Timeout, noop_level())
            .unwrap_err();
        assert!(matches!(err, SessionError::TimeoutEdge));
        assert_eq!(session.callback_counts(), (0, 0));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();

        assert!(matches!(
            session.add_level_callback(32, Edge::Rising, noop_level()),
            Err(SessionError::InvalidPin(32))
        ));
        assert!(matches!(
            session.add_event_callback(40, noop_event()),
            Err(SessionError::InvalidEvent(40))
        ));
    }

    #[test]
    fn first_callback_starts_stream_and_pushes_interest() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();

        session.add_level_callback(3, Edge::Rising, noop_level()).unwrap();
        assert_eq!(session.notify_handle(), Some(StubDaemon::NOTIFY_HANDLE));
        assert_eq!(session.level_interest(), 1 << 3);

        let pushes = daemon.requests_for(command::NB);
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].p1, StubDaemon::NOTIFY_HANDLE);
        assert_eq!(pushes[0].p2, 1 << 3);

        session.disconnect().unwrap();
    }

    #[test]
    fn duplicate_registration_is_not_deduplicated() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();
        let handler = noop_level();

        session
            .add_level_callback(5, Edge::Either, Arc::clone(&handler))
            .unwrap();
        session
            .add_level_callback(5, Edge::Either, Arc::clone(&handler))
            .unwrap();
        assert_eq!(session.callback_counts(), (2, 0));

        assert!(session
            .remove_level_callback(5, Edge::Either, &handler)
            .unwrap());
        assert_eq!(session.callback_counts(), (1, 0));
        assert_eq!(session.level_interest(), 1 << 5);

        assert!(session
            .remove_level_callback(5, Edge::Either, &handler)
            .unwrap());
        assert!(!session
            .remove_level_callback(5, Edge::Either, &handler)
            .unwrap());
        assert_eq!(session.callback_counts(), (0, 0));

        session.disconnect().unwrap();
    }

    #[test]
    fn interest_updates_only_on_change() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();
        let h3 = noop_level();
        let h7 = noop_level();
        let h7_again = noop_level();
        let h31 = noop_level();

        session.add_level_callback(3, Edge::Either, h3).unwrap();
        session
            .add_level_callback(7, Edge::Rising, Arc::clone(&h7))
            .unwrap();
        session
            .add_level_callback(7, Edge::Falling, Arc::clone(&h7_again))
            .unwrap();
        session.add_level_callback(31, Edge::Either, h31).unwrap();
        assert_eq!(
            session.level_interest(),
            (1 << 3) | (1 << 7) | (1 << 31)
        );
        let before = daemon.requests_for(command::NB).len();

        // Pin 7 still has a falling-edge callback, so nothing changes.
        session
            .remove_level_callback(7, Edge::Rising, &h7)
            .unwrap();
        assert_eq!(daemon.requests_for(command::NB).len(), before);

        session
            .remove_level_callback(7, Edge::Falling, &h7_again)
            .unwrap();
        let pushes = daemon.requests_for(command::NB);
        assert_eq!(pushes.len(), before + 1);
        assert_eq!(pushes.last().unwrap().p2, (1 << 3) | (1 << 31));
        assert_eq!(session.level_interest(), (1 << 3) | (1 << 31));

        session.disconnect().unwrap();
    }

    #[test]
    fn event_interest_uses_event_command() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();
        let handler = noop_event();

        session.add_event_callback(9, Arc::clone(&handler)).unwrap();
        assert_eq!(session.event_interest(), 1 << 9);
        let pushes = daemon.requests_for(command::EVM);
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].p2, 1 << 9);
        assert!(daemon.requests_for(command::NB).is_empty());

        assert!(session.remove_event_callback(9, &handler).unwrap());
        assert_eq!(session.event_interest(), 0);

        session.disconnect().unwrap();
    }

    #[test]
    fn removal_swallows_interest_push_failure() {
        let daemon = StubDaemon::start(|header, _| match header.command {
            command::NB if header.p2 == 0 => Reply::status(-2011),
            _ => Reply::value(0),
        });
        let session = daemon.session();
        let handler = noop_level();

        session
            .add_level_callback(2, Edge::Rising, Arc::clone(&handler))
            .unwrap();
        assert!(session
            .remove_level_callback(2, Edge::Rising, &handler)
            .unwrap());
        assert_eq!(session.callback_counts(), (0, 0));
        // The failed push leaves the last pushed value in place.
        assert_eq!(session.level_interest(), 1 << 2);

        session.disconnect().unwrap();
    }

    #[test]
    fn failed_stream_start_unlinks_callback() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0)).with_noib_status(-2005);
        let session = daemon.session();

        let err = session
            .add_level_callback(1, Edge::Rising, noop_level())
            .unwrap_err();
        assert!(matches!(err, SessionError::Status(_)));
        assert_eq!(session.callback_counts(), (0, 0));
        assert_eq!(session.notify_handle(), None);
    }

    #[test]
    fn failed_interest_push_unlinks_callback() {
        let daemon = StubDaemon::start(|header, _| match header.command {
            command::NB | command::EVM => Reply::status(-2011),
            _ => Reply::value(0),
        });
        let session = daemon.session();

        let err = session
            .on_level_change(3, Edge::Rising, |_, _, _| {})
            .unwrap_err();
        assert!(matches!(err, SessionError::Status(_)));
        assert_eq!(session.callback_counts(), (0, 0));
        assert_eq!(session.level_interest(), 0);

        let err = session.on_event(4, |_, _, _| {}).unwrap_err();
        assert!(matches!(err, SessionError::Status(_)));
        assert_eq!(session.callback_counts(), (0, 0));
        assert_eq!(session.event_interest(), 0);

        // With nothing registered the stream winds down on its own.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while session.notify_handle().is_some() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(session.notify_handle(), None);

        session.disconnect().unwrap();
    }

    #[test]
    fn add_waiting_on_registry_loses_to_disconnect() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();
        session.add_level_callback(1, Edge::Rising, noop_level()).unwrap();

        let registry = session.lock_registry();

        let adder = session.clone();
        let (added_tx, added_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = added_tx.send(adder.add_level_callback(2, Edge::Rising, noop_level()));
        });
        std::thread::sleep(Duration::from_millis(100));

        let closer = session.clone();
        let (closed_tx, closed_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = closed_tx.send(closer.disconnect());
        });
        std::thread::sleep(Duration::from_millis(100));
        assert!(session.is_closed());
        drop(registry);

        let added = added_rx.recv_timeout(Duration::from_secs(3)).unwrap();
        assert!(matches!(added, Err(SessionError::Closed)));
        closed_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("disconnect should join the notification thread")
            .unwrap();
        assert_eq!(session.callback_counts(), (0, 0));
    }

    #[test]
    fn stream_restarts_after_lists_drain() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let mut config = daemon.config();
        config.poll_interval = Duration::from_millis(20);
        let session = Session::connect(config).unwrap();
        let handler = noop_level();

        session
            .add_level_callback(6, Edge::Either, Arc::clone(&handler))
            .unwrap();
        session
            .remove_level_callback(6, Edge::Either, &handler)
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while session.notify_handle().is_some() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(session.notify_handle(), None);

        session
            .add_level_callback(6, Edge::Either, Arc::clone(&handler))
            .unwrap();
        assert!(session.notify_handle().is_some());
        assert_eq!(daemon.requests_for(command::NOIB).len(), 2);

        session.disconnect().unwrap();
    }

    #[test]
    fn disconnect_clears_registry_and_joins() {
        let daemon = StubDaemon::start(|_, _| Reply::value(0));
        let session = daemon.session();

        session.add_level_callback(1, Edge::Rising, noop_level()).unwrap();
        session.add_event_callback(2, noop_event()).unwrap();
        session.disconnect().unwrap();

        assert_eq!(session.callback_counts(), (0, 0));
        assert_eq!(session.level_interest(), 0);
        assert_eq!(session.event_interest(), 0);
        assert!(session.lock_registry().worker.is_none());
        assert!(matches!(
            session.add_level_callback(1, Edge::Rising, noop_level()),
            Err(SessionError::Closed)
        ));
        session.disconnect().unwrap();
    }
}
