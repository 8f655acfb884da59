use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use sonatalink_transport::Received;
use tracing::{debug, warn};

use crate::error::{FrameError, Result};
use crate::message::{FrameConfig, Message, HEADER_FRAMING, HEADER_SIZE};

/// Open a message log written by a file connection and iterate its messages.
pub fn replay(path: impl AsRef<Path>) -> Result<Replay<BufReader<File>>> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).map_err(|source| FrameError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "replaying message log");
    Ok(Replay::new(path, BufReader::new(file)))
}

/// Iterator over the messages in a log.
///
/// Ends cleanly at end of file. A trailing partial message yields one
/// [`FrameError::TruncatedLog`] and then ends.
pub struct Replay<R> {
    path: PathBuf,
    inner: R,
    offset: u64,
    max_body: usize,
    done: bool,
}

impl<R: Read> Replay<R> {
    /// Replay messages from any reader; `path` is only used in errors.
    pub fn new(path: impl Into<PathBuf>, inner: R) -> Self {
        Self {
            path: path.into(),
            inner,
            offset: 0,
            max_body: FrameConfig::default().max_body,
            done: false,
        }
    }

    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// Byte offset of the next message.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn next_message(&mut self) -> Result<Option<Message>> {
        let mut header = vec![0u8; HEADER_SIZE];
        let got = self.fill(&mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(self.truncated(HEADER_SIZE, got));
        }

        let body_len = HEADER_FRAMING.body_len(&header);
        if body_len > self.max_body {
            return Err(FrameError::BodyTooLarge {
                size: body_len,
                max: self.max_body,
            });
        }
        let mut body = vec![0u8; body_len];
        let got = self.fill(&mut body)?;
        if got < body_len {
            return Err(self.truncated(HEADER_SIZE + body_len, HEADER_SIZE + got));
        }

        let message = Message::from_received(Received {
            header: Bytes::from(header),
            body: Bytes::from(body),
        })?;
        self.offset += message.wire_size() as u64;
        Ok(Some(message))
    }

    /// Read until `buf` is full or the input ends; returns bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(FrameError::Io {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(filled)
    }

    fn truncated(&self, needed: usize, available: usize) -> FrameError {
        warn!(
            path = %self.path.display(),
            offset = self.offset,
            needed,
            available,
            "message log ends mid-message"
        );
        FrameError::TruncatedLog {
            path: self.path.clone(),
            offset: self.offset,
            needed,
            available,
        }
    }
}

impl<R: Read> Iterator for Replay<R> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_message() {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for Replay<R> {}
