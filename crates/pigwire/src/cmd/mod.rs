use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use pigwire_session::{Edge, Mode, Session, SessionConfig, ENV_ADDR, ENV_PORT};
use pigwire_transport::{DEFAULT_HOST, DEFAULT_PORT};

use crate::exit::{session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod pin;
pub mod system;
pub mod trigger;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the daemon's microsecond tick.
    Tick,
    /// Print the board's hardware revision.
    Hwver,
    /// Print the daemon version.
    Pigpv,
    /// Read a pin level.
    Read(ReadArgs),
    /// Drive a pin high or low.
    Write(WriteArgs),
    /// Show or set a pin mode.
    Mode(ModeArgs),
    /// Fire an application event.
    Trigger(TriggerArgs),
    /// Print level, watchdog and event notifications as they arrive.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Tick => system::tick(connect, format),
        Command::Hwver => system::hwver(connect, format),
        Command::Pigpv => system::pigpv(connect, format),
        Command::Read(args) => pin::read(args, connect, format),
        Command::Write(args) => pin::write(args, connect),
        Command::Mode(args) => pin::mode(args, connect, format),
        Command::Trigger(args) => trigger::run(args, connect),
        Command::Watch(args) => watch::run(args, connect, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Daemon host.
    #[arg(long, env = ENV_ADDR, default_value = DEFAULT_HOST, global = true)]
    pub host: String,
    /// Daemon port.
    #[arg(long, env = ENV_PORT, default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<SessionConfig> {
        let mut config = SessionConfig::new(self.host.clone(), self.port);
        config.connect_timeout = Some(parse_timeout(&self.timeout)?);
        Ok(config)
    }

    pub fn open(&self) -> CliResult<Session> {
        let config = self.config()?;
        Session::connect(config).map_err(|err| session_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Pin number.
    pub pin: u32,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Pin number.
    pub pin: u32,
    /// Level to drive.
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    pub level: u8,
}

#[derive(Args, Debug)]
pub struct ModeArgs {
    /// Pin number.
    pub pin: u32,
    /// Mode to set (input, output, alt0-alt5). Omit to show the current mode.
    pub mode: Option<Mode>,
}

#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Event number (0-31).
    pub event: u32,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum EdgeArg {
    Rising,
    Falling,
    Either,
}

impl From<EdgeArg> for Edge {
    fn from(edge: EdgeArg) -> Self {
        match edge {
            EdgeArg::Rising => Edge::Rising,
            EdgeArg::Falling => Edge::Falling,
            EdgeArg::Either => Edge::Either,
        }
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Pins to watch for level changes (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub pins: Vec<u32>,
    /// Events to watch (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub events: Vec<u32>,
    /// Edge to report on watched pins.
    #[arg(long, value_enum, default_value = "either")]
    pub edge: EdgeArg,
    /// Exit after N notifications.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
