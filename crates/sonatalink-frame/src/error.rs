use std::path::PathBuf;

use sonatalink_marshal::IntegrityError;
use sonatalink_transport::TransportError;

/// Errors raised while sending, receiving or replaying framed messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// The header's `data_length` does not match the record being decoded.
    #[error("{record}: header declares {declared} body bytes, record is {expected}")]
    BodyLengthMismatch {
        record: &'static str,
        declared: usize,
        expected: usize,
    },

    /// A message arrived with a code the caller did not ask for.
    #[error("unexpected message code {code} (expected {expected})")]
    UnexpectedCode { code: u32, expected: u32 },

    /// The body is larger than the writer's configured maximum.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// Reading a message log failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A message log ends in the middle of a message.
    #[error("{}: truncated message at offset {offset} ({available} of {needed} bytes)", path.display())]
    TruncatedLog {
        path: PathBuf,
        offset: u64,
        needed: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
