use std::path::PathBuf;

use clap::{Args, Subcommand};
use sonatalink_marshal::channelizer::{ChannelizerMessageCode, ChannelizerState, Status};
use sonatalink_marshal::common::NssDate;

use crate::exit::{integrity_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod layout;
pub mod listen;
pub mod log_status;
pub mod replay;
pub mod send_status;
pub mod version;

/// Header code of a channelizer status report.
pub const SEND_STATUS: u32 = ChannelizerMessageCode::SendStatus.code() as u32;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print (and optionally verify) the wire layout of every record.
    Layout(LayoutArgs),
    /// Append channelizer status messages to a message log.
    LogStatus(LogStatusArgs),
    /// Decode and print the messages stored in a message log.
    Replay(ReplayArgs),
    /// Accept one peer and print the messages it sends.
    Listen(ListenArgs),
    /// Connect to a peer and send channelizer status messages.
    SendStatus(SendStatusArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    // Every command that touches the wire depends on the record layouts.
    if !matches!(command, Command::Version(_) | Command::Layout(_)) {
        sonatalink_marshal::check_all_layouts()
            .map_err(|err| integrity_error("record layout check failed", err))?;
    }

    match command {
        Command::Layout(args) => layout::run(args, format),
        Command::LogStatus(args) => log_status::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::SendStatus(args) => send_status::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Show the fields of a single record.
    #[arg(long, value_name = "NAME")]
    pub record: Option<String>,
    /// Verify every layout against the wire rules and the host encoder.
    #[arg(long)]
    pub check: bool,
}

/// Header identity and the status to report.
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Channelizer state: idle, pending or running.
    #[arg(long, default_value = "idle")]
    pub state: String,
    /// Center sky frequency in MHz (-1 when unknown).
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub center_freq: f64,
    /// Activity id stamped in the header.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub activity: i32,
    /// Number of status messages to send.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
    /// Sender name stamped in the header.
    #[arg(long, env = "SONATALINK_SENDER", default_value = "chan0")]
    pub sender: String,
    /// Receiver name stamped in the header.
    #[arg(long, env = "SONATALINK_RECEIVER", default_value = "sse")]
    pub receiver: String,
}

impl StatusArgs {
    pub fn status(&self) -> CliResult<Status> {
        let state = ChannelizerState::from_name(&self.state).ok_or_else(|| {
            CliError::usage(format!(
                "unknown channelizer state {:?} (expected idle, pending or running)",
                self.state
            ))
        })?;
        let now = NssDate::now();
        Ok(Status {
            timestamp: now,
            start_time: if state == ChannelizerState::Running {
                now
            } else {
                NssDate::default()
            },
            center_sky_freq_mhz: self.center_freq,
            state,
            ..Status::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct LogStatusArgs {
    /// Message log to append to (created if missing).
    pub path: PathBuf,
    /// Logical unit recorded for the connection.
    #[arg(long, default_value_t = 0)]
    pub unit: u32,
    #[command(flatten)]
    pub status: StatusArgs,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Message log to read.
    pub path: PathBuf,
    /// Only print messages with this header code.
    #[arg(long)]
    pub code: Option<u32>,
    /// Largest body accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_body: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// TCP port to listen on (0 picks a free port).
    #[arg(long)]
    pub port: u16,
    /// Interface to bind.
    #[arg(long, default_value = sonatalink_transport::socket::ANY_INTERFACE)]
    pub host: String,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Largest body accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_body: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendStatusArgs {
    /// Host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// TCP port to connect to.
    #[arg(long)]
    pub port: u16,
    /// Write timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    #[command(flatten)]
    pub status: StatusArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details and the wire-format fingerprint.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<std::time::Duration> {
    let input = input.trim();
    let (number, millis) = match input.strip_suffix("ms") {
        Some(n) => (n, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };
    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration: {input:?}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }
    Ok(if millis {
        std::time::Duration::from_millis(value)
    } else {
        std::time::Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::exit::USAGE;

    fn status_args(state: &str) -> StatusArgs {
        StatusArgs {
            state: state.into(),
            center_freq: 1420.0,
            activity: -1,
            count: 1,
            sender: "chan0".into(),
            receiver: "sse".into(),
        }
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
        assert_eq!(parse_duration("0s").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("soon").unwrap_err().code, USAGE);
    }

    #[test]
    fn status_from_args() {
        let status = status_args("running").status().unwrap();
        assert_eq!(status.state, ChannelizerState::Running);
        assert_eq!(status.start_time, status.timestamp);
        assert_eq!(status.center_sky_freq_mhz, 1420.0);

        let idle = status_args("idle").status().unwrap();
        assert_eq!(idle.start_time, NssDate::default());

        assert_eq!(status_args("warp").status().unwrap_err().code, USAGE);
    }
}
