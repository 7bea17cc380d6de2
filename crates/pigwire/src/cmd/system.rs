use pigwire_session::Session;

use crate::cmd::ConnectArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat, ValueOutput};

pub fn tick(connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    query(connect, format, "tick", Session::tick, |_| None)
}

pub fn hwver(connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    query(connect, format, "hwver", Session::hardware_revision, |rev| {
        Some(format!("{rev:#x}"))
    })
}

pub fn pigpv(connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    query(connect, format, "pigpv", Session::daemon_version, |_| None)
}

fn query(
    connect: &ConnectArgs,
    format: OutputFormat,
    name: &str,
    op: fn(&Session) -> pigwire_session::Result<u32>,
    display: fn(u32) -> Option<String>,
) -> CliResult<i32> {
    let session = connect.open()?;
    let value = op(&session).map_err(|err| session_error(&format!("{name} failed"), err))?;
    let _ = session.disconnect();

    print_value(
        &ValueOutput {
            query: name,
            value,
            display: display(value),
        },
        format,
    );
    Ok(SUCCESS)
}
