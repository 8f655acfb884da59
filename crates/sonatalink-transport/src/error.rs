use crate::connection::ConnectionKind;

/// Errors that can occur on a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An OS call failed. The OS error code is available via [`os_code`](Self::os_code).
    #[error("{name}: {op} failed: {source}")]
    Io {
        name: String,
        op: &'static str,
        source: std::io::Error,
    },

    /// The operation requires an established connection.
    #[error("{name}: not connected")]
    NotConnected { name: String },

    /// The OS accepted fewer bytes than requested in a single write.
    #[error("{name}: partial write ({written} of {expected} bytes)")]
    PartialWrite {
        name: String,
        written: usize,
        expected: usize,
    },

    /// The peer closed or reset the link. The connection has been terminated.
    #[error("{name}: peer disconnected")]
    Disconnected { name: String },

    /// A read timed out after part of a message had arrived. The connection
    /// has been terminated.
    #[error("{name}: timed out partway through a message")]
    Stalled { name: String },

    /// A received header declared a body larger than the configured maximum.
    #[error("{name}: declared body too large ({size} bytes, max {max})")]
    FrameTooLarge {
        name: String,
        size: usize,
        max: usize,
    },

    /// The transport does not provide this operation.
    #[error("{name}: {op} is not supported on {kind} connections")]
    Unsupported {
        name: String,
        op: &'static str,
        kind: ConnectionKind,
    },

    /// A host name could not be turned into a socket address.
    #[error("cannot resolve {host:?} port {port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: std::io::Error,
    },
}

impl TransportError {
    /// The raw OS error code behind this failure, if there is one.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Io { source, .. } | Self::Resolve { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Whether this is a read or write timeout, after which the connection
    /// is still usable.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    pub(crate) fn io(name: &str, op: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            name: name.to_owned(),
            op,
            source,
        }
    }

    pub(crate) fn not_connected(name: &str) -> Self {
        Self::NotConnected {
            name: name.to_owned(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_code_is_carried_through() {
        let err = TransportError::io(
            "sse",
            "connect",
            std::io::Error::from_raw_os_error(libc::ECONNREFUSED),
        );
        assert_eq!(err.os_code(), Some(libc::ECONNREFUSED));
        assert!(err.to_string().starts_with("sse: connect failed"));
    }

    #[test]
    fn logical_errors_have_no_os_code() {
        assert_eq!(TransportError::not_connected("dx").os_code(), None);
        let err = TransportError::PartialWrite {
            name: "log".into(),
            written: 3,
            expected: 37,
        };
        assert_eq!(err.to_string(), "log: partial write (3 of 37 bytes)");
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeouts_are_told_apart() {
        let timeout = TransportError::io("sse", "recv", std::io::ErrorKind::WouldBlock.into());
        assert!(timeout.is_timeout());
        let reset = TransportError::io("sse", "write", std::io::ErrorKind::ConnectionReset.into());
        assert!(!reset.is_timeout());
    }
}
