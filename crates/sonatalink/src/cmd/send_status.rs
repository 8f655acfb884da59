use sonatalink_frame::{FrameConfig, MessageWriter};
use sonatalink_transport::{Connection, ConnectionConfig, SocketConnection, Unit};

use crate::cmd::{parse_duration, SendStatusArgs, SEND_STATUS};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_messages, OutputFormat};

pub fn run(args: SendStatusArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut conn = SocketConnection::active("send-status", Unit::NONE, args.host.as_str(), args.port)
        .with_config(ConnectionConfig {
            read_timeout: None,
            write_timeout: Some(timeout),
        });
    conn.establish()
        .map_err(|err| transport_error("connect failed", err))?;

    let mut writer = MessageWriter::with_config(
        conn,
        FrameConfig {
            sender: args.status.sender.clone(),
            receiver: args.status.receiver.clone(),
            ..FrameConfig::default()
        },
    );

    let mut sent = Vec::with_capacity(args.status.count);
    for _ in 0..args.status.count {
        let status = args.status.status()?;
        let header = writer
            .send(SEND_STATUS, args.status.activity, &status)
            .map_err(|err| frame_error("send failed", err))?;
        sent.push(sonatalink_frame::Message {
            header,
            body: sonatalink_marshal::marshall(&status),
        });
    }
    writer.get_mut().terminate();

    print_messages(&sent, format);
    Ok(SUCCESS)
}
