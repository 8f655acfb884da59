use std::sync::mpsc;
use std::thread;

use sonatalink_frame::{FrameConfig, FrameError, Message, MessageReader};
use sonatalink_transport::{Connection, SocketConnection, TransportError, Unit};
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

enum Event {
    Received(Message),
    Failed(FrameError),
    Interrupted,
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut conn = SocketConnection::passive_on("listen", Unit::NONE, args.host.as_str(), args.port);
    let local = conn
        .listen()
        .map_err(|err| transport_error("listen failed", err))?;
    eprintln!("listening on {local}");

    let (tx, rx) = mpsc::channel();
    install_ctrlc_handler(tx.clone())?;

    let mut config = FrameConfig::default();
    if let Some(max) = args.max_body {
        config.max_body = max;
    }
    // The receiver blocks in accept/recv; it is abandoned on Ctrl-C.
    thread::spawn(move || receive_loop(conn, config, tx));

    let mut printed = 0usize;
    while let Ok(event) = rx.recv() {
        match event {
            Event::Received(message) => {
                print_message(&message, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Event::Failed(FrameError::Transport(TransportError::Disconnected { .. })) => {
                info!(messages = printed, "peer disconnected");
                break;
            }
            Event::Failed(err) => return Err(frame_error("receive failed", err)),
            Event::Interrupted => break,
        }
    }
    Ok(SUCCESS)
}

fn receive_loop(mut conn: SocketConnection, config: FrameConfig, tx: mpsc::Sender<Event>) {
    if let Err(err) = conn.establish() {
        let _ = tx.send(Event::Failed(err.into()));
        return;
    }
    if let Some(peer) = conn.peer_addr() {
        info!(%peer, "peer connected");
    }

    let mut reader = MessageReader::with_config(conn, config);
    loop {
        let event = match reader.receive() {
            Ok(message) => Event::Received(message),
            Err(err) => Event::Failed(err),
        };
        let failed = matches!(event, Event::Failed(_));
        if tx.send(event).is_err() || failed {
            return;
        }
    }
}

fn install_ctrlc_handler(tx: mpsc::Sender<Event>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        let _ = tx.send(Event::Interrupted);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
