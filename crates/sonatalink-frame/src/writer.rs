use bytes::BytesMut;
use sonatalink_marshal::common::{MessageHeader, NssDate, NO_ACTIVITY_ID};
use sonatalink_marshal::{marshall_into, Marshall};
use sonatalink_transport::Connection;
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::message::{FrameConfig, HEADER_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Sends header + body messages on a connection.
///
/// Each message gets the next message number (starting at 1), the current
/// time, and the configured sender and receiver names. Header and body are
/// marshalled into one buffer and handed to the connection in a single send.
pub struct MessageWriter<C> {
    conn: C,
    config: FrameConfig,
    next_number: u32,
    buf: BytesMut,
}

impl<C: Connection> MessageWriter<C> {
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, FrameConfig::default())
    }

    pub fn with_config(conn: C, config: FrameConfig) -> Self {
        Self {
            conn,
            config,
            next_number: 1,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Send `body` under message `code`.
    ///
    /// Returns the header that went out.
    pub fn send<R: Marshall>(&mut self, code: u32, activity_id: i32, body: &R) -> Result<MessageHeader> {
        if R::WIRE_SIZE > self.config.max_body {
            return Err(FrameError::BodyTooLarge {
                size: R::WIRE_SIZE,
                max: self.config.max_body,
            });
        }
        let header = self.stamp(code, activity_id, R::WIRE_SIZE);

        self.buf.clear();
        self.buf.reserve(HEADER_SIZE + R::WIRE_SIZE);
        marshall_into(&header, &mut self.buf);
        marshall_into(body, &mut self.buf);
        self.transmit(header)
    }

    /// Send a header-only message (a request or notification with no body).
    pub fn send_empty(&mut self, code: u32, activity_id: i32) -> Result<MessageHeader> {
        let header = self.stamp(code, activity_id, 0);

        self.buf.clear();
        marshall_into(&header, &mut self.buf);
        self.transmit(header)
    }

    /// Send a message that belongs to no activity.
    pub fn notify<R: Marshall>(&mut self, code: u32, body: &R) -> Result<MessageHeader> {
        self.send(code, NO_ACTIVITY_ID, body)
    }

    fn stamp(&self, code: u32, activity_id: i32, data_length: usize) -> MessageHeader {
        let mut header = MessageHeader {
            code,
            data_length: data_length as u32,
            message_number: self.next_number,
            activity_id,
            timestamp: NssDate::now(),
            ..MessageHeader::default()
        };
        header.set_sender(&self.config.sender);
        header.set_receiver(&self.config.receiver);
        header
    }

    fn transmit(&mut self, header: MessageHeader) -> Result<MessageHeader> {
        self.conn.send(&self.buf)?;
        self.next_number = self.next_number.wrapping_add(1);
        debug!(
            conn = self.conn.name(),
            code = header.code,
            number = header.message_number,
            bytes = self.buf.len(),
            "message sent"
        );
        Ok(header)
    }

    /// Number the next message will carry.
    pub fn next_message_number(&self) -> u32 {
        self.next_number
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

#[cfg(test)]
mod tests {
    use sonatalink_marshal::channelizer::{ChannelizerMessageCode, Status};
    use sonatalink_marshal::common::NssMessage;
    use sonatalink_marshal::demarshall;
    use sonatalink_transport::{ConnectionKind, TransportError, Unit};

    use super::*;

    /// Collects every send; optionally refuses them.
    #[derive(Default)]
    struct Capture {
        sent: Vec<Vec<u8>>,
        connected: bool,
    }

    impl Connection for Capture {
        fn name(&self) -> &str {
            "capture"
        }

        fn unit(&self) -> Unit {
            Unit::NONE
        }

        fn kind(&self) -> ConnectionKind {
            ConnectionKind::File
        }

        fn establish(&mut self) -> sonatalink_transport::Result<()> {
            self.connected = true;
            Ok(())
        }

        fn terminate(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn send(&mut self, bytes: &[u8]) -> sonatalink_transport::Result<()> {
            if !self.connected {
                return Err(TransportError::NotConnected {
                    name: "capture".to_owned(),
                });
            }
            self.sent.push(bytes.to_vec());
            Ok(())
        }
    }

    fn writer() -> MessageWriter<Capture> {
        let mut conn = Capture::default();
        conn.establish().unwrap();
        MessageWriter::with_config(
            conn,
            FrameConfig {
                sender: "chan0".into(),
                receiver: "sse".into(),
                ..FrameConfig::default()
            },
        )
    }

    #[test]
    fn header_and_body_go_out_in_one_send() {
        let mut w = writer();
        let code = ChannelizerMessageCode::SendStatus.code() as u32;
        let header = w.send(code, 17, &Status::default()).unwrap();
        assert_eq!(header.message_number, 1);
        assert_eq!(header.data_length, 32);

        let sent = &w.get_ref().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), HEADER_SIZE + Status::WIRE_SIZE);

        let wire_header: MessageHeader = demarshall(&sent[0][..HEADER_SIZE]).unwrap();
        assert_eq!(wire_header, header);
        assert_eq!(wire_header.code, 80_004);
        assert_eq!(wire_header.activity_id, 17);
        assert_eq!(wire_header.sender_name(), "chan0");
        assert_eq!(wire_header.receiver_name(), "sse");
    }

    #[test]
    fn message_numbers_increase_per_writer() {
        let mut w = writer();
        let numbers: Vec<u32> = (0..3)
            .map(|_| w.send_empty(80_003, NO_ACTIVITY_ID).unwrap().message_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(w.next_message_number(), 4);
        assert!(w.get_ref().sent.iter().all(|m| m.len() == HEADER_SIZE));
    }

    #[test]
    fn failed_send_does_not_consume_a_number() {
        let mut w = writer();
        w.get_mut().terminate();
        let err = w.notify(80_007, &NssMessage::default()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::NotConnected { .. })
        ));
        assert_eq!(w.next_message_number(), 1);
    }

    #[test]
    fn body_larger_than_limit_is_refused() {
        let mut conn = Capture::default();
        conn.establish().unwrap();
        let mut w = MessageWriter::with_config(
            conn,
            FrameConfig {
                max_body: 16,
                ..FrameConfig::default()
            },
        );
        let err = w.send(80_004, NO_ACTIVITY_ID, &Status::default()).unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { size: 32, max: 16 }));
        assert!(w.into_inner().sent.is_empty());
    }
}
