//! Notification stream: a background thread per session that owns a
//! second daemon connection and dispatches reports to registered callbacks.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use pigwire_frame::{
    command, read_header, NotificationReport, ReportKind, ReportReader, ReportWait, RequestWriter,
};
use pigwire_transport::DaemonStream;
use tracing::{debug, error, info, trace, warn};

use crate::callback::Edge;
use crate::error::{Result, SessionError};
use crate::pin::Pin;
use crate::registry::Registry;
use crate::session::{check_status, Session};

const THREAD_NAME: &str = "pigwire-notify";

/// Start the notification thread and wait until the daemon has assigned
/// it a handle.
pub(crate) fn spawn(session: &Session) -> Result<(JoinHandle<()>, u32)> {
    let (started_tx, started_rx) = mpsc::channel();
    let task = session.clone();
    let worker = thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(task, started_tx))
        .map_err(|err| SessionError::NotifyFailed(err.to_string()))?;

    match started_rx.recv() {
        Ok(Ok(handle)) => Ok((worker, handle)),
        Ok(Err(err)) => {
            let _ = worker.join();
            Err(err)
        }
        Err(_) => {
            let _ = worker.join();
            Err(SessionError::NotifyFailed(
                "notification thread exited during startup".to_string(),
            ))
        }
    }
}

/// Clears the registry's running flag if the loop exits abnormally,
/// including by a panicking callback.
struct StopGuard<'a> {
    session: &'a Session,
    armed: bool,
}

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.mark_notify_stopped();
        }
    }
}

fn run(session: Session, started: mpsc::Sender<Result<u32>>) {
    let (stream, handle) = match connect_and_register(&session) {
        Ok(registered) => registered,
        Err(err) => {
            warn!(error = %err, "notification stream failed to start");
            let _ = started.send(Err(err));
            return;
        }
    };

    let mut guard = StopGuard {
        session: &session,
        armed: true,
    };
    info!(handle, "notification stream active");
    if started.send(Ok(handle)).is_err() {
        return;
    }

    let mut last_level = match session.read_bank_1() {
        Ok(level) => level,
        Err(err) => {
            warn!(error = %err, "could not read initial levels; assuming all low");
            0
        }
    };
    if let Err(err) = session.refresh_interest() {
        warn!(error = %err, "failed to push interest after registration");
    }

    let poll_interval = session.config().poll_interval;
    let mut reader = ReportReader::new(stream);
    loop {
        if session.stop_if_idle() {
            guard.armed = false;
            info!(handle, "no callbacks left; notification stream stopping");
            break;
        }

        match reader.wait_report(poll_interval) {
            Ok(ReportWait::Idle) => {}
            Ok(ReportWait::Report(report)) => {
                let registry = session.lock_registry();
                dispatch(&session, &registry, &report, &mut last_level);
            }
            Ok(ReportWait::Closed) => {
                info!(handle, "daemon closed the notification stream");
                break;
            }
            Err(err) => {
                error!(handle, error = %err, "notification stream read failed");
                break;
            }
        }
    }

    drop(guard);
    if let Err(err) = reader.into_inner().shutdown() {
        debug!(error = %err, "notification socket shutdown failed");
    }
}

/// Open the notification connection and turn it into a notification
/// stream. The exchange runs under the command lock so it cannot
/// interleave with command traffic.
fn connect_and_register(session: &Session) -> Result<(DaemonStream, u32)> {
    let stream = session.open_notify_stream()?;
    let _command = session.lock_command()?;

    let mut writer = RequestWriter::new(stream);
    writer.send(command::NOIB, 0, 0, &[])?;
    let response = read_header(writer.get_mut())?;
    if response.command != command::NOIB {
        return Err(SessionError::BadReceive {
            sent: command::NOIB,
            received: response.command,
        });
    }
    let handle = check_status(response.p3)?;
    Ok((writer.into_inner(), handle))
}

/// Invoke every callback matching `report`.
///
/// Runs with the registry lock held; `last_level` is the previous level
/// snapshot and is updated by level reports.
pub(crate) fn dispatch(
    session: &Session,
    registry: &Registry,
    report: &NotificationReport,
    last_level: &mut u32,
) {
    match report.kind() {
        ReportKind::Levels => {
            let changed = (report.level ^ *last_level) & registry.level_bits;
            *last_level = report.level;
            if changed == 0 {
                return;
            }
            for node in &registry.levels {
                let bit = 1u32 << node.pin;
                if changed & bit == 0 {
                    continue;
                }
                let high = report.level & bit != 0;
                if node.edge.accepts(high) {
                    let edge = if high { Edge::Rising } else { Edge::Falling };
                    let pin = Pin::new(session.clone(), node.pin);
                    node.handler.on_level_change(&pin, edge, report.tick);
                }
            }
        }
        ReportKind::Watchdog { pin } => {
            for node in registry.levels.iter().filter(|node| node.pin == pin) {
                let handle = Pin::new(session.clone(), node.pin);
                node.handler.on_level_change(&handle, Edge::Timeout, report.tick);
            }
        }
        ReportKind::Event { event } => {
            for node in registry.events.iter().filter(|node| node.event == event) {
                node.handler.on_event(session, event, report.tick);
            }
        }
        ReportKind::Ignored => {
            trace!(flags = report.flags, seqno = report.seqno, "ignoring report");
        }
    }
}
