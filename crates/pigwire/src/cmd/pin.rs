use crate::cmd::{ConnectArgs, ModeArgs, ReadArgs, WriteArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat, ValueOutput};

pub fn read(args: ReadArgs, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let session = connect.open()?;
    let high = session
        .read(args.pin)
        .map_err(|err| session_error(&format!("read of pin {} failed", args.pin), err))?;
    let _ = session.disconnect();

    print_value(
        &ValueOutput {
            query: "level",
            value: u32::from(high),
            display: None,
        },
        format,
    );
    Ok(SUCCESS)
}

pub fn write(args: WriteArgs, connect: &ConnectArgs) -> CliResult<i32> {
    let session = connect.open()?;
    session
        .write(args.pin, args.level != 0)
        .map_err(|err| session_error(&format!("write to pin {} failed", args.pin), err))?;
    let _ = session.disconnect();
    Ok(SUCCESS)
}

pub fn mode(args: ModeArgs, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let session = connect.open()?;
    let context = format!("mode of pin {}", args.pin);

    if let Some(mode) = args.mode {
        session
            .set_mode(args.pin, mode)
            .map_err(|err| session_error(&format!("setting {context} failed"), err))?;
        let _ = session.disconnect();
        return Ok(SUCCESS);
    }

    let mode = session
        .mode(args.pin)
        .map_err(|err| session_error(&format!("reading {context} failed"), err))?;
    let _ = session.disconnect();

    print_value(
        &ValueOutput {
            query: "mode",
            value: mode.code(),
            display: Some(mode.to_string()),
        },
        format,
    );
    Ok(SUCCESS)
}
