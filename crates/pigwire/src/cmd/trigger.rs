use crate::cmd::{ConnectArgs, TriggerArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: TriggerArgs, connect: &ConnectArgs) -> CliResult<i32> {
    if args.event > pigwire_session::MAX_NOTIFY_ID {
        return Err(CliError::new(
            USAGE,
            format!("event {} out of range (0-31)", args.event),
        ));
    }

    let session = connect.open()?;
    session
        .event_trigger(args.event)
        .map_err(|err| session_error(&format!("trigger of event {} failed", args.event), err))?;
    let _ = session.disconnect();
    Ok(SUCCESS)
}
