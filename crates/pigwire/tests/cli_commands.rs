#![cfg(all(unix, feature = "cli"))]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

use pigwire::frame::{command, decode_header, Header, NotificationReport, HEADER_SIZE};

const NOTIFY_HANDLE: u32 = 2;

/// Minimal daemon: answers each command through `answer` and, once a
/// notification stream has registered and level interest is pushed, writes
/// `reports` on it.
fn spawn_daemon(
    answer: fn(&Header) -> i64,
    reports: Vec<NotificationReport>,
) -> (u16, Arc<Mutex<Vec<Header>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let notify: Arc<Mutex<Option<TcpStream>>> = Arc::new(Mutex::new(None));

    let seen_accept = Arc::clone(&seen);
    thread::spawn(move || {
        for conn in listener.incoming() {
            let Ok(conn) = conn else { break };
            let seen = Arc::clone(&seen_accept);
            let notify = Arc::clone(&notify);
            let reports = reports.clone();
            thread::spawn(move || serve(conn, answer, &reports, &seen, &notify));
        }
    });

    (port, seen)
}

fn serve(
    mut conn: TcpStream,
    answer: fn(&Header) -> i64,
    reports: &[NotificationReport],
    seen: &Mutex<Vec<Header>>,
    notify: &Mutex<Option<TcpStream>>,
) {
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
        seen.lock().unwrap().push(header);

        let p3 = if header.command == command::NOIB {
            *notify.lock().unwrap() = conn.try_clone().ok();
            NOTIFY_HANDLE
        } else {
            answer(&header) as i32 as u32
        };
        let reply = Header::new(header.command, header.p1, header.p2, p3);
        if conn.write_all(&reply.to_bytes()).is_err() {
            return;
        }

        if header.command == command::NB && header.p2 != 0 {
            if let Some(stream) = notify.lock().unwrap().as_mut() {
                for report in reports {
                    let _ = stream.write_all(&report.to_bytes());
                }
            }
        }
    }
}

fn pigwire(port: u16, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pigwire"))
        .env_remove("PIGPIO_ADDR")
        .env_remove("PIGPIO_PORT")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("pigwire should run")
}

fn answer_defaults(header: &Header) -> i64 {
    match header.command {
        command::TICK => 4_000_000_123,
        command::HWVER => 0xa02082,
        command::PIGPV => 79,
        command::READ if header.p1 == 99 => -3,
        command::READ => 1,
        command::MODEG => 1,
        _ => 0,
    }
}

#[test]
fn tick_prints_json_value() {
    let (port, _) = spawn_daemon(answer_defaults, Vec::new());

    let output = pigwire(port, &["--format", "json", "tick"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"query\":\"tick\""));
    assert!(stdout.contains("\"value\":4000000123"));
}

#[test]
fn hwver_shows_hex_revision() {
    let (port, _) = spawn_daemon(answer_defaults, Vec::new());

    let output = pigwire(port, &["--format", "pretty", "hwver"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hwver: 0xa02082");
}

#[test]
fn write_sends_pin_and_level() {
    let (port, seen) = spawn_daemon(answer_defaults, Vec::new());

    let output = pigwire(port, &["write", "17", "1"]);

    assert!(output.status.success());
    let seen = seen.lock().unwrap();
    let write = seen
        .iter()
        .find(|h| h.command == command::WRITE)
        .expect("write should reach the daemon");
    assert_eq!((write.p1, write.p2), (17, 1));
}

#[test]
fn mode_without_value_reads_mode() {
    let (port, _) = spawn_daemon(answer_defaults, Vec::new());

    let output = pigwire(port, &["--format", "json", "mode", "4"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"display\":\"output\""));
}

#[test]
fn daemon_status_exits_with_daemon_error() {
    let (port, _) = spawn_daemon(answer_defaults, Vec::new());

    let output = pigwire(port, &["read", "99"]);

    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(-3)"));
}

#[test]
fn refused_connection_exits_with_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let output = pigwire(port, &["tick"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn watch_prints_edges_until_count() {
    let reports = vec![
        NotificationReport {
            seqno: 0,
            flags: 0,
            tick: 100,
            level: 1 << 4,
        },
        NotificationReport {
            seqno: 1,
            flags: 0,
            tick: 200,
            level: 0,
        },
    ];
    let (port, _) = spawn_daemon(answer_defaults, reports);

    let output = pigwire(
        port,
        &["--format", "json", "watch", "--pins", "4", "--count", "2"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"edge\":\"rising\""));
    assert!(lines[0].contains("\"tick\":100"));
    assert!(lines[1].contains("\"edge\":\"falling\""));
}

#[test]
fn watch_without_targets_is_usage_error() {
    let output = pigwire(1, &["watch"]);

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_pigwire"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("pigwire "));
}
