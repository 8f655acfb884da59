use sonatalink_marshal::Marshall;
use sonatalink_transport::Connection;
use tracing::debug;

use crate::error::Result;
use crate::message::{FrameConfig, Message};

/// Receives header + body messages from a connection.
///
/// Partial reads are handled by the connection; callers always get whole
/// messages.
pub struct MessageReader<C> {
    conn: C,
    config: FrameConfig,
}

impl<C: Connection> MessageReader<C> {
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, FrameConfig::default())
    }

    pub fn with_config(conn: C, config: FrameConfig) -> Self {
        Self { conn, config }
    }

    /// Read the next message (blocking).
    pub fn receive(&mut self) -> Result<Message> {
        let received = self.conn.receive(&self.config.framing())?;
        let message = Message::from_received(received)?;
        debug!(
            conn = self.conn.name(),
            code = message.header.code,
            number = message.header.message_number,
            bytes = message.wire_size(),
            "message received"
        );
        Ok(message)
    }

    /// Read the next message, require `code`, and decode its body as `R`.
    pub fn receive_as<R: Marshall>(&mut self, code: u32) -> Result<R> {
        let message = self.receive()?;
        message.expect_code(code)?.decode()
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &C {
        &self.conn
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}
