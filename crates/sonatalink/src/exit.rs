use std::fmt;
use std::io;

use sonatalink_frame::FrameError;
use sonatalink_marshal::IntegrityError;
use sonatalink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error, fallback: i32) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => fallback,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err, INTERNAL), format!("{context}: {err}"))
}

pub fn integrity_error(context: &str, err: IntegrityError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Io { source, .. } => io_code(source, TRANSPORT_ERROR),
        TransportError::FrameTooLarge { .. } => DATA_INVALID,
        TransportError::Stalled { .. } => TIMEOUT,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Io { source, .. } => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_map_to_exit_codes() {
        let refused = TransportError::Io {
            name: "dx".into(),
            op: "connect",
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(transport_error("send", refused).code, TRANSPORT_ERROR);

        let timed_out = TransportError::Io {
            name: "dx".into(),
            op: "recv",
            source: io::Error::from(io::ErrorKind::TimedOut),
        };
        assert_eq!(transport_error("listen", timed_out).code, TIMEOUT);

        let oversize = TransportError::FrameTooLarge {
            name: "dx".into(),
            size: 10,
            max: 1,
        };
        assert_eq!(transport_error("listen", oversize).code, DATA_INVALID);

        let stalled = TransportError::Stalled { name: "dx".into() };
        assert_eq!(transport_error("listen", stalled).code, TIMEOUT);
    }

    #[test]
    fn frame_failures_map_to_exit_codes() {
        let err = FrameError::UnexpectedCode {
            code: 1,
            expected: 2,
        };
        assert_eq!(frame_error("replay", err).code, DATA_INVALID);

        let err = FrameError::Io {
            path: "missing.log".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let cli = frame_error("replay", err);
        assert_eq!(cli.code, FAILURE);
        assert!(cli.message.starts_with("replay: "));
    }
}
