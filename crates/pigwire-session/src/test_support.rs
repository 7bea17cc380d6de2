//! In-process stand-in for the daemon, used by unit tests.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use pigwire_frame::{command, decode_header, Header, NotificationReport, HEADER_SIZE};

use crate::config::SessionConfig;
use crate::session::Session;

type Handler = dyn Fn(&Header, &[u8]) -> Reply + Send + Sync;

/// How the stub answers one request.
pub(crate) struct Reply {
    command: Option<u32>,
    p3: u32,
    payload: Vec<u8>,
    close: bool,
}

impl Reply {
    pub(crate) fn value(p3: u32) -> Self {
        Self {
            command: None,
            p3,
            payload: Vec::new(),
            close: false,
        }
    }

    pub(crate) fn status(code: i32) -> Self {
        Self::value(code as u32)
    }

    /// Echo `command` instead of the request's command.
    pub(crate) fn with_command(mut self, command: u32) -> Self {
        self.command = Some(command);
        self
    }

    pub(crate) fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Close the connection after sending this reply.
    pub(crate) fn then_close(mut self) -> Self {
        self.close = true;
        self
    }
}

struct State {
    handler: Box<Handler>,
    requests: Mutex<Vec<(Header, Vec<u8>)>>,
    noib_status: Mutex<Option<i32>>,
    notify: Mutex<Option<TcpStream>>,
    notify_ready: Condvar,
}

pub(crate) struct StubDaemon {
    addr: SocketAddr,
    state: Arc<State>,
}

impl StubDaemon {
    pub(crate) const NOTIFY_HANDLE: u32 = 7;

    pub(crate) fn start<F>(handler: F) -> Self
    where
        F: Fn(&Header, &[u8]) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            noib_status: Mutex::new(None),
            notify: Mutex::new(None),
            notify_ready: Condvar::new(),
        });

        let accept_state = Arc::clone(&state);
        thread::spawn(move || {
            for conn in listener.incoming() {
                let Ok(conn) = conn else { break };
                let state = Arc::clone(&accept_state);
                thread::spawn(move || serve(conn, &state));
            }
        });

        Self { addr, state }
    }

    /// Refuse notification registration with `status`.
    pub(crate) fn with_noib_status(self, status: i32) -> Self {
        *self.state.noib_status.lock().unwrap() = Some(status);
        self
    }

    pub(crate) fn config(&self) -> SessionConfig {
        let mut config = SessionConfig::new("127.0.0.1", self.addr.port());
        config.connect_timeout = Some(Duration::from_secs(2));
        config.poll_interval = Duration::from_millis(50);
        config
    }

    pub(crate) fn session(&self) -> Session {
        Session::connect(self.config()).unwrap()
    }

    pub(crate) fn requests(&self) -> Vec<(Header, Vec<u8>)> {
        self.state.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_for(&self, command: u32) -> Vec<Header> {
        self.requests()
            .into_iter()
            .filter(|(header, _)| header.command == command)
            .map(|(header, _)| header)
            .collect()
    }

    /// Write one report on the registered notification stream.
    pub(crate) fn send_report(&self, report: &NotificationReport) {
        let mut notify = self.wait_notify();
        let stream = notify.as_mut().unwrap();
        stream.write_all(&report.to_bytes()).unwrap();
    }

    /// Close the notification stream from the daemon side.
    pub(crate) fn close_notify_stream(&self) {
        if let Some(stream) = self.wait_notify().take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn wait_notify(&self) -> std::sync::MutexGuard<'_, Option<TcpStream>> {
        let guard = self.state.notify.lock().unwrap();
        let (guard, timeout) = self
            .state
            .notify_ready
            .wait_timeout_while(guard, Duration::from_secs(2), |notify| notify.is_none())
            .unwrap();
        assert!(!timeout.timed_out(), "no notification stream registered");
        guard
    }
}

fn serve(mut conn: TcpStream, state: &State) {
    loop {
        let mut raw = [0u8; HEADER_SIZE];
        if conn.read_exact(&mut raw).is_err() {
            return;
        }
        let header = decode_header(&raw);
        let mut body = vec![0u8; header.p3 as usize];
        if conn.read_exact(&mut body).is_err() {
            return;
        }
        state.requests.lock().unwrap().push((header, body.clone()));

        if header.command == command::NOIB {
            let status = *state.noib_status.lock().unwrap();
            let p3 = match status {
                Some(code) => code as u32,
                None => {
                    let Ok(stream) = conn.try_clone() else { return };
                    *state.notify.lock().unwrap() = Some(stream);
                    state.notify_ready.notify_all();
                    StubDaemon::NOTIFY_HANDLE
                }
            };
            let response = Header::new(command::NOIB, 0, 0, p3);
            if conn.write_all(&response.to_bytes()).is_err() {
                return;
            }
            continue;
        }

        let reply = (state.handler)(&header, &body);
        let response = Header::new(
            reply.command.unwrap_or(header.command),
            header.p1,
            header.p2,
            reply.p3,
        );
        let mut out = response.to_bytes().to_vec();
        out.extend_from_slice(&reply.payload);
        if conn.write_all(&out).is_err() {
            return;
        }
        if reply.close {
            let _ = conn.shutdown(Shutdown::Both);
            return;
        }
    }
}
