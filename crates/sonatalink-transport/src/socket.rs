use std::io::{ErrorKind, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info, warn};

use crate::connection::{write_once, Connection, ConnectionConfig, ConnectionKind, Inbound, Unit};
use crate::error::{Result, TransportError};
use crate::resolve::resolve;

/// Address a passive socket binds when no interface is given.
pub const ANY_INTERFACE: &str = "0.0.0.0";

/// TCP connection.
///
/// An active socket connects out to `host:port`. A passive socket binds
/// `host:port`, accepts exactly one peer, then closes the listening socket;
/// a later `establish` after `terminate` listens afresh.
///
/// Established streams have `SO_KEEPALIVE` set and `SO_LINGER` enabled with a
/// zero timeout, so terminating resets the link instead of lingering in
/// `TIME_WAIT`.
///
/// A receive that hits end of stream or a hard I/O error terminates the
/// connection before returning, as does a short or failed send. A receive
/// or send that times out before moving any bytes leaves it established.
///
/// [`split_inbound`](Connection::split_inbound) hands out a duplicate of the
/// stream so one thread can block in a receive while others send.
#[derive(Debug)]
pub struct SocketConnection {
    name: String,
    unit: Unit,
    kind: ConnectionKind,
    host: String,
    port: u16,
    config: ConnectionConfig,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
}

impl SocketConnection {
    /// A socket that connects to `host:port` on establish.
    pub fn active(name: impl Into<String>, unit: Unit, host: impl Into<String>, port: u16) -> Self {
        Self::build(name.into(), unit, ConnectionKind::ActiveSocket, host.into(), port)
    }

    /// A socket that accepts one peer on `port`, on all interfaces.
    pub fn passive(name: impl Into<String>, unit: Unit, port: u16) -> Self {
        Self::passive_on(name, unit, ANY_INTERFACE, port)
    }

    /// A socket that accepts one peer on `host:port`.
    pub fn passive_on(
        name: impl Into<String>,
        unit: Unit,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::build(name.into(), unit, ConnectionKind::PassiveSocket, host.into(), port)
    }

    fn build(name: String, unit: Unit, kind: ConnectionKind, host: String, port: u16) -> Self {
        Self {
            name,
            unit,
            kind,
            host,
            port,
            config: ConnectionConfig::default(),
            listener: None,
            stream: None,
        }
    }

    /// Apply timeouts to streams established from now on.
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Change the peer (active) or bind (passive) address for the next establish.
    pub fn set_address(&mut self, host: impl Into<String>, port: u16) {
        self.host = host.into();
        self.port = port;
    }

    /// Configured host and port.
    pub fn address(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// Bind and listen without waiting for a peer. Passive sockets only.
    ///
    /// Returns the bound address, which carries the real port when the
    /// configured port is 0. Idempotent while the listener is open.
    pub fn listen(&mut self) -> Result<SocketAddr> {
        if self.kind != ConnectionKind::PassiveSocket {
            return Err(TransportError::Unsupported {
                name: self.name.clone(),
                op: "listen",
                kind: self.kind,
            });
        }
        if let Some(listener) = &self.listener {
            return listener
                .local_addr()
                .map_err(|e| TransportError::io(&self.name, "getsockname", e));
        }

        let addrs = resolve(&self.host, self.port)?;
        let listener =
            TcpListener::bind(&addrs[..]).map_err(|e| TransportError::io(&self.name, "bind", e))?;
        let local = listener
            .local_addr()
            .map_err(|e| TransportError::io(&self.name, "getsockname", e))?;
        info!(name = %self.name, %local, "listening");
        self.listener = Some(listener);
        Ok(local)
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    fn connect(&mut self) -> Result<TcpStream> {
        let addrs = resolve(&self.host, self.port)?;
        let stream =
            TcpStream::connect(&addrs[..]).map_err(|e| TransportError::io(&self.name, "connect", e))?;
        info!(name = %self.name, host = %self.host, port = self.port, "connected");
        Ok(stream)
    }

    fn accept(&mut self) -> Result<TcpStream> {
        self.listen()?;
        let Some(listener) = self.listener.as_ref() else {
            return Err(TransportError::not_connected(&self.name));
        };
        match listener.accept() {
            Ok((stream, peer)) => {
                // One peer per passive connection; stop listening.
                self.listener = None;
                info!(name = %self.name, %peer, "accepted connection");
                Ok(stream)
            }
            Err(err) => {
                if err.kind() != ErrorKind::WouldBlock {
                    self.listener = None;
                }
                Err(TransportError::io(&self.name, "accept", err))
            }
        }
    }

    fn prepare(&self, stream: &TcpStream) -> Result<()> {
        set_link_options(stream).map_err(|e| TransportError::io(&self.name, "setsockopt", e))?;
        stream
            .set_read_timeout(self.config.read_timeout)
            .map_err(|e| TransportError::io(&self.name, "setsockopt", e))?;
        stream
            .set_write_timeout(self.config.write_timeout)
            .map_err(|e| TransportError::io(&self.name, "setsockopt", e))
    }

    /// Terminate after any failure that leaves the stream unusable.
    fn check<T>(&mut self, op: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if !err.is_timeout() {
                warn!(name = %self.name, error = %err, "{op} failed; terminating");
                self.terminate();
            }
        }
        result
    }
}

/// Fill `buf` from `stream`. End of stream and resets map to
/// [`TransportError::Disconnected`]; a timeout after part of `buf` arrived
/// maps to [`TransportError::Stalled`].
fn fill(name: &str, stream: &mut TcpStream, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                debug!(name, filled, wanted = buf.len(), "peer closed");
                return Err(TransportError::Disconnected {
                    name: name.to_owned(),
                });
            }
            Ok(n) => filled += n,
            Err(err) => match err.kind() {
                ErrorKind::Interrupted => continue,
                ErrorKind::WouldBlock | ErrorKind::TimedOut if filled > 0 => {
                    return Err(TransportError::Stalled {
                        name: name.to_owned(),
                    })
                }
                ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe => {
                    return Err(TransportError::Disconnected {
                        name: name.to_owned(),
                    })
                }
                _ => return Err(TransportError::io(name, "recv", err)),
            },
        }
    }
    Ok(())
}

/// Receiving half of a [`SocketConnection`], reading a duplicate of its
/// stream.
#[derive(Debug)]
pub struct SocketInbound {
    name: String,
    stream: TcpStream,
}

impl Inbound for SocketInbound {
    fn name(&self) -> &str {
        &self.name
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        fill(&self.name, &mut self.stream, buf)
    }
}

#[cfg(unix)]
fn set_link_options(stream: &TcpStream) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = stream.as_raw_fd();
    let on: libc::c_int = 1;
    // SAFETY: `fd` is an open socket owned by `stream`, and `on` outlives the
    // call with the size passed alongside it.
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_KEEPALIVE,
            (&on as *const libc::c_int).cast::<libc::c_void>(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }

    let linger = libc::linger {
        l_onoff: 1,
        l_linger: 0,
    };
    // SAFETY: as above, with a `linger` struct of the advertised size.
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_LINGER,
            (&linger as *const libc::linger).cast::<libc::c_void>(),
            std::mem::size_of::<libc::linger>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_link_options(_stream: &TcpStream) -> std::io::Result<()> {
    Ok(())
}

impl Connection for SocketConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn unit(&self) -> Unit {
        self.unit
    }

    fn kind(&self) -> ConnectionKind {
        self.kind
    }

    fn establish(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = match self.kind {
            ConnectionKind::PassiveSocket => self.accept()?,
            _ => self.connect()?,
        };
        self.prepare(&stream)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn terminate(&mut self) {
        let had_listener = self.listener.take().is_some();
        let stream = self.stream.take();
        if let Some(stream) = &stream {
            // Wake split receivers still holding a duplicate.
            let _ = stream.shutdown(Shutdown::Both);
        }
        if stream.is_some() || had_listener {
            debug!(name = %self.name, "socket connection terminated");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::not_connected(&self.name))?;
        let result = write_once(&self.name, stream, bytes);
        self.check("send", result)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::not_connected(&self.name))?;
        let result = fill(&self.name, stream, buf);
        self.check("receive", result)
    }

    fn split_inbound(&self) -> Result<Option<Box<dyn Inbound>>> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| TransportError::not_connected(&self.name))?
            .try_clone()
            .map_err(|e| TransportError::io(&self.name, "dup", e))?;
        Ok(Some(Box::new(SocketInbound {
            name: self.name.clone(),
            stream,
        })))
    }
}

impl Drop for SocketConnection {
    fn drop(&mut self) {
        self.terminate();
    }
}
