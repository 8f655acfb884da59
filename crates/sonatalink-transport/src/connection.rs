use std::fmt;
use std::io::{ErrorKind, Write};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::framing::{Framing, Received};

/// The transport behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Private duplicate of standard output.
    Display,
    /// Append-only file.
    File,
    /// TCP, connecting out to a listening peer.
    ActiveSocket,
    /// TCP, accepting a single inbound peer.
    PassiveSocket,
}

impl ConnectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::File => "file",
            Self::ActiveSocket => "active-socket",
            Self::PassiveSocket => "passive-socket",
        }
    }

    /// Whether this kind is a TCP socket.
    pub fn is_socket(self) -> bool {
        matches!(self, Self::ActiveSocket | Self::PassiveSocket)
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical unit a connection talks to (a detector number, a channelizer
/// index, the system controller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unit(pub u32);

impl Unit {
    pub const NONE: Unit = Unit(0);
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {}", self.0)
    }
}

/// Tunables applied when a connection is established.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Read timeout for blocking receives. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking sends. `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
}

/// A bidirectional (or send-only) link to a peer.
///
/// Lifecycle: a connection starts unestablished. [`establish`](Self::establish)
/// acquires the OS resource and is a no-op on an established connection.
/// [`terminate`](Self::terminate) releases it and is a no-op otherwise. Every
/// I/O operation on an unestablished connection fails with
/// [`TransportError::NotConnected`] before touching the OS.
///
/// Implementations terminate themselves on drop.
pub trait Connection: Send {
    /// Identity used in logs and errors.
    fn name(&self) -> &str;

    /// Logical unit this connection serves.
    fn unit(&self) -> Unit;

    /// Transport behind this connection.
    fn kind(&self) -> ConnectionKind;

    /// Acquire the OS resource. Idempotent.
    ///
    /// On failure the connection stays unestablished and holds no handle.
    fn establish(&mut self) -> Result<()>;

    /// Release the OS resource. Idempotent and infallible.
    fn terminate(&mut self);

    /// Whether the connection is established.
    fn is_connected(&self) -> bool;

    /// Send `bytes` in a single write.
    ///
    /// A write that the OS accepts only partially fails with
    /// [`TransportError::PartialWrite`]; the remainder is not retried and the
    /// connection is terminated. A hard write error terminates it too. A
    /// write that times out before transferring anything leaves it
    /// established.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Fill `buf` completely from the peer.
    ///
    /// Transports without an inbound direction return
    /// [`TransportError::Unsupported`].
    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let _ = buf;
        Err(TransportError::Unsupported {
            name: self.name().to_owned(),
            op: "receive",
            kind: self.kind(),
        })
    }

    /// Receive one framed message: the fixed header first, then exactly as
    /// many body bytes as the header's length field declares.
    ///
    /// A header declaring a body above `framing.max_body`, or a timeout once
    /// the header is in, terminates the connection: the unread body leaves
    /// the stream out of step.
    fn receive(&mut self, framing: &Framing) -> Result<Received> {
        if !self.is_connected() {
            return Err(TransportError::not_connected(self.name()));
        }
        let err = match read_frame(framing, |buf| self.recv_exact(buf))? {
            Frame::Complete(received) => return Ok(received),
            Frame::Oversize(size) => TransportError::FrameTooLarge {
                name: self.name().to_owned(),
                size,
                max: framing.max_body,
            },
            Frame::Stalled => TransportError::Stalled {
                name: self.name().to_owned(),
            },
        };
        self.terminate();
        Err(err)
    }

    /// A handle that receives from the same peer independently of sends on
    /// this connection, or `None` when the transport cannot split.
    ///
    /// The handle reads from the stream established at the time of the call;
    /// it does not follow a later re-establish.
    fn split_inbound(&self) -> Result<Option<Box<dyn Inbound>>> {
        Ok(None)
    }
}

/// The receiving half of a split connection.
///
/// After any error other than a timeout the stream is closed or out of step:
/// drop the handle and terminate the connection it came from.
pub trait Inbound: Send {
    fn name(&self) -> &str;

    /// Fill `buf` completely from the peer.
    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Receive one framed message.
    fn receive(&mut self, framing: &Framing) -> Result<Received> {
        match read_frame(framing, |buf| self.recv_exact(buf))? {
            Frame::Complete(received) => Ok(received),
            Frame::Oversize(size) => Err(TransportError::FrameTooLarge {
                name: self.name().to_owned(),
                size,
                max: framing.max_body,
            }),
            Frame::Stalled => Err(TransportError::Stalled {
                name: self.name().to_owned(),
            }),
        }
    }
}

enum Frame {
    Complete(Received),
    /// Header read, declared body refused.
    Oversize(usize),
    /// Header read, body timed out.
    Stalled,
}

fn read_frame<F>(framing: &Framing, mut recv_exact: F) -> Result<Frame>
where
    F: FnMut(&mut [u8]) -> Result<()>,
{
    let mut header = vec![0u8; framing.header_len];
    recv_exact(&mut header)?;

    let size = framing.body_len(&header);
    if size > framing.max_body {
        return Ok(Frame::Oversize(size));
    }

    let mut body = vec![0u8; size];
    if let Err(err) = recv_exact(&mut body) {
        return if err.is_timeout() {
            Ok(Frame::Stalled)
        } else {
            Err(err)
        };
    }

    Ok(Frame::Complete(Received {
        header: Bytes::from(header),
        body: Bytes::from(body),
    }))
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn unit(&self) -> Unit {
        (**self).unit()
    }

    fn kind(&self) -> ConnectionKind {
        (**self).kind()
    }

    fn establish(&mut self) -> Result<()> {
        (**self).establish()
    }

    fn terminate(&mut self) {
        (**self).terminate()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).recv_exact(buf)
    }

    fn receive(&mut self, framing: &Framing) -> Result<Received> {
        (**self).receive(framing)
    }

    fn split_inbound(&self) -> Result<Option<Box<dyn Inbound>>> {
        (**self).split_inbound()
    }
}

/// Issue exactly one write of `bytes`, re-issuing only when the call was
/// interrupted before transferring anything.
pub(crate) fn write_once<W: Write>(name: &str, handle: &mut W, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    loop {
        match handle.write(bytes) {
            Ok(n) if n == bytes.len() => return Ok(()),
            Ok(n) => {
                return Err(TransportError::PartialWrite {
                    name: name.to_owned(),
                    written: n,
                    expected: bytes.len(),
                })
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::io(name, "write", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Accepts at most `limit` bytes per write.
    struct Trickle {
        limit: usize,
        interrupts: usize,
        written: Vec<u8>,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_write_is_fatal_and_not_retried() {
        let mut sink = Trickle {
            limit: 10,
            interrupts: 0,
            written: Vec::new(),
        };
        let err = write_once("log", &mut sink, &[7u8; 37]).unwrap_err();
        assert!(matches!(
            err,
            TransportError::PartialWrite {
                written: 10,
                expected: 37,
                ..
            }
        ));
        assert_eq!(sink.written.len(), 10);
    }

    #[test]
    fn interrupted_write_is_reissued() {
        let mut sink = Trickle {
            limit: usize::MAX,
            interrupts: 2,
            written: Vec::new(),
        };
        write_once("log", &mut sink, b"status").unwrap();
        assert_eq!(sink.written, b"status");
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ConnectionKind::PassiveSocket.to_string(), "passive-socket");
        assert!(ConnectionKind::ActiveSocket.is_socket());
        assert!(!ConnectionKind::File.is_socket());
        assert_eq!(Unit(3).to_string(), "unit 3");
    }
}
