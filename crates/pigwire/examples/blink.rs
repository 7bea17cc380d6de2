//! Toggle a pin a few times.
//!
//! Run with:
//!   PIGPIO_ADDR=raspberrypi.local cargo run --example blink -- 17

use std::thread;
use std::time::Duration;

use pigwire::session::Mode;
use pigwire::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pin: u32 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(17);

    let session = Session::connect_from_env()?;
    eprintln!(
        "Connected to {} (daemon version {})",
        session.config().address(),
        session.daemon_version()?
    );

    session.set_mode(pin, Mode::Output)?;
    for i in 0..10 {
        session.write(pin, i % 2 == 0)?;
        thread::sleep(Duration::from_millis(250));
    }
    session.write(pin, false)?;

    session.disconnect()?;
    Ok(())
}
