use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pigwire_session::{CallbackRegistration, Edge, Session};
use tracing::{debug, warn};

use crate::cmd::{ConnectArgs, WatchArgs};
use crate::exit::{session_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_notification, NotificationOutput, OutputFormat};

const RECV_SLICE: Duration = Duration::from_millis(100);

pub fn run(args: WatchArgs, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    if args.pins.is_empty() && args.events.is_empty() {
        return Err(CliError::new(USAGE, "nothing to watch: pass --pins or --events"));
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let session = connect.open()?;
    let (tx, rx) = mpsc::channel();
    let registrations = match register(&session, &args, tx) {
        Ok(registrations) => registrations,
        Err(err) => {
            let _ = session.disconnect();
            return Err(err);
        }
    };

    let mut printed = 0usize;
    let mut code = SUCCESS;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(RECV_SLICE) {
            Ok(notification) => {
                print_notification(&notification, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if session.notify_handle().is_none() {
                    warn!("notification stream ended");
                    code = FAILURE;
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for registration in registrations {
        if let Err(err) = registration.cancel() {
            debug!(error = %err, "cancel failed during shutdown");
        }
    }
    session
        .disconnect()
        .map_err(|err| session_error("disconnect failed", err))?;
    Ok(code)
}

fn register(
    session: &Session,
    args: &WatchArgs,
    tx: mpsc::Sender<NotificationOutput>,
) -> CliResult<Vec<CallbackRegistration>> {
    let tx = Arc::new(Mutex::new(tx));
    let edge = Edge::from(args.edge);
    let mut registrations = Vec::new();

    for &pin in &args.pins {
        let tx = Arc::clone(&tx);
        let registration = session
            .on_level_change(pin, edge, move |pin, edge, tick| {
                forward(&tx, NotificationOutput::level(pin.number(), edge, tick));
            })
            .map_err(|err| session_error(&format!("watching pin {pin} failed"), err))?;
        registrations.push(registration);
    }

    for &event in &args.events {
        let tx = Arc::clone(&tx);
        let registration = session
            .on_event(event, move |_, event, tick| {
                forward(&tx, NotificationOutput::event(event, tick));
            })
            .map_err(|err| session_error(&format!("watching event {event} failed"), err))?;
        registrations.push(registration);
    }

    Ok(registrations)
}

fn forward(tx: &Mutex<mpsc::Sender<NotificationOutput>>, notification: NotificationOutput) {
    if let Ok(tx) = tx.lock() {
        let _ = tx.send(notification);
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
