use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pigwire_session::Edge;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of a single query against the daemon.
#[derive(Serialize)]
pub struct ValueOutput<'a> {
    pub query: &'a str,
    pub value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

pub fn print_value(out: &ValueOutput<'_>, format: OutputFormat) {
    let shown = out
        .display
        .clone()
        .unwrap_or_else(|| out.value.to_string());
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["QUERY", "VALUE"])
                .add_row(vec![out.query.to_string(), shown]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}: {shown}", out.query);
        }
    }
}

/// What a notification reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Level,
    Watchdog,
    Event,
}

#[derive(Clone, Debug, Serialize)]
pub struct NotificationOutput {
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<Edge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<u32>,
    pub tick: u32,
    pub timestamp: String,
}

impl NotificationOutput {
    pub fn level(pin: u32, edge: Edge, tick: u32) -> Self {
        let kind = if edge == Edge::Timeout {
            NotificationKind::Watchdog
        } else {
            NotificationKind::Level
        };
        Self {
            kind,
            pin: Some(pin),
            edge: Some(edge),
            event: None,
            tick,
            timestamp: now_unix_seconds(),
        }
    }

    pub fn event(event: u32, tick: u32) -> Self {
        Self {
            kind: NotificationKind::Event,
            pin: None,
            edge: None,
            event: Some(event),
            tick,
            timestamp: now_unix_seconds(),
        }
    }

    fn source(&self) -> String {
        match (self.pin, self.event) {
            (Some(pin), _) => format!("pin {pin}"),
            (None, Some(event)) => format!("event {event}"),
            (None, None) => "-".to_string(),
        }
    }
}

pub fn print_notification(out: &NotificationOutput, format: OutputFormat) {
    let edge = out
        .edge
        .map(|edge| edge.to_string())
        .unwrap_or_else(|| "-".to_string());
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "EDGE", "TICK"])
                .add_row(vec![out.source(), edge, out.tick.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} edge={} tick={}", out.source(), edge, out.tick);
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
