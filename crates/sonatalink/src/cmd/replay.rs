use sonatalink_frame::{replay, FrameError};

use crate::cmd::ReplayArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_messages, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let mut messages = replay(&args.path).map_err(|err| frame_error("replay failed", err))?;
    if let Some(max) = args.max_body {
        messages = messages.with_max_body(max);
    }

    let mut shown = Vec::new();
    let mut failure: Option<FrameError> = None;
    for item in messages {
        match item {
            Ok(message) => {
                if args.code.is_none_or(|code| code == message.header.code) {
                    shown.push(message);
                }
            }
            Err(err) => failure = Some(err),
        }
    }

    // Print what was readable before reporting a torn tail.
    print_messages(&shown, format);
    match failure {
        Some(err) => Err(frame_error("replay failed", err)),
        None => Ok(SUCCESS),
    }
}
