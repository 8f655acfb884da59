use serde::Serialize;
use sonatalink_frame::{FrameConfig, MessageWriter};
use sonatalink_transport::{Connection, FileConnection, Unit};
use tracing::info;

use crate::cmd::{LogStatusArgs, SEND_STATUS};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct LogStatusOutput {
    path: String,
    messages: usize,
    bytes: u64,
}

pub fn run(args: LogStatusArgs, format: OutputFormat) -> CliResult<i32> {
    let mut conn = FileConnection::new("status-log", Unit(args.unit), &args.path);
    conn.establish()
        .map_err(|err| transport_error("open failed", err))?;

    let mut writer = MessageWriter::with_config(
        conn,
        FrameConfig {
            sender: args.status.sender.clone(),
            receiver: args.status.receiver.clone(),
            ..FrameConfig::default()
        },
    );
    let mut bytes = 0u64;
    for _ in 0..args.status.count {
        let status = args.status.status()?;
        let header = writer
            .send(SEND_STATUS, args.status.activity, &status)
            .map_err(|err| frame_error("write failed", err))?;
        bytes += sonatalink_frame::HEADER_SIZE as u64 + u64::from(header.data_length);
    }
    writer.get_mut().terminate();
    info!(path = %args.path.display(), messages = args.status.count, "status logged");

    let out = LogStatusOutput {
        path: args.path.display().to_string(),
        messages: args.status.count,
        bytes,
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "logged {} status message(s), {} bytes, to {}",
            out.messages, out.bytes, out.path
        ),
    }
    Ok(SUCCESS)
}
