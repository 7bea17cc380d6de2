//! Print edges on one pin for ten seconds.
//!
//! Run with:
//!   cargo run --example edge-monitor -- 4
//!
//! A watchdog is armed so a quiet pin still reports a timeout every second.

use std::thread;
use std::time::Duration;

use pigwire::session::Pull;
use pigwire::{Edge, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pin: u32 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(4);

    let session = Session::connect_from_env()?;
    session.set_pull_up_down(pin, Pull::Up)?;

    let registration = session.on_level_change(pin, Edge::Either, |pin, edge, tick| {
        println!("pin {} {edge} at tick {tick}", pin.number());
    })?;
    session.set_watchdog(pin, 1000)?;

    thread::sleep(Duration::from_secs(10));

    session.set_watchdog(pin, 0)?;
    registration.cancel()?;
    session.disconnect()?;
    Ok(())
}
