//! Connection abstraction for the sonatalink message layer.
//!
//! Every transport implements [`Connection`]:
//! - [`DisplayConnection`]: a private duplicate of standard output
//! - [`FileConnection`]: an append-only log, synced after every send
//! - [`SocketConnection`]: TCP, either connecting out or accepting one peer
//!
//! Connections are owned by one thread. Wrap one in [`SharedConnection`] to
//! serialize sends across threads and to wait for the link to come up.

pub mod connection;
pub mod display;
pub mod error;
pub mod file;
pub mod framing;
pub mod resolve;
pub mod shared;
pub mod socket;

pub use connection::{Connection, ConnectionConfig, ConnectionKind, Inbound, Unit};
pub use display::DisplayConnection;
pub use error::{Result, TransportError};
pub use file::FileConnection;
pub use framing::{Framing, Received};
pub use resolve::resolve;
pub use shared::SharedConnection;
pub use socket::{SocketConnection, SocketInbound};
