use bytes::Bytes;
use sonatalink_marshal::common::{MessageHeader, DATA_LENGTH_OFFSET};
use sonatalink_marshal::{demarshall, IntegrityError, Marshall};
use sonatalink_transport::framing::DEFAULT_MAX_BODY;
use sonatalink_transport::{Framing, Received};

use crate::error::{FrameError, Result};

/// Size of the message header on the wire.
pub const HEADER_SIZE: usize = <MessageHeader as Marshall>::WIRE_SIZE;

/// How a connection finds message boundaries.
pub const HEADER_FRAMING: Framing = Framing::new(HEADER_SIZE, DATA_LENGTH_OFFSET);

/// Framing configuration shared by writers and readers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest body that will be sent or accepted.
    pub max_body: usize,
    /// Name stamped into the `sender` field of outgoing headers.
    pub sender: String,
    /// Name stamped into the `receiver` field of outgoing headers.
    pub receiver: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body: DEFAULT_MAX_BODY,
            sender: String::new(),
            receiver: String::new(),
        }
    }
}

impl FrameConfig {
    pub(crate) fn framing(&self) -> Framing {
        HEADER_FRAMING.with_max_body(self.max_body)
    }
}

/// One received message: its decoded header and the raw (wire-order) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub body: Bytes,
}

impl Message {
    /// Decode the header of a received frame.
    pub fn from_received(received: Received) -> Result<Self> {
        let header: MessageHeader = demarshall(&received.header)?;
        Ok(Self {
            header,
            body: received.body,
        })
    }

    /// Decode the body as record `R`.
    ///
    /// Fails if the header's `data_length` is not `R`'s wire size.
    pub fn decode<R: Marshall>(&self) -> Result<R> {
        let declared = self.header.data_length as usize;
        if declared != R::WIRE_SIZE {
            return Err(FrameError::BodyLengthMismatch {
                record: R::LAYOUT.name,
                declared,
                expected: R::WIRE_SIZE,
            });
        }
        Ok(demarshall(&self.body)?)
    }

    /// Interpret the header code as a message-code enumeration.
    pub fn code_as<E>(&self) -> Result<E>
    where
        E: TryFrom<u32, Error = IntegrityError>,
    {
        Ok(E::try_from(self.header.code)?)
    }

    /// Fail with [`FrameError::UnexpectedCode`] unless the header carries `code`.
    pub fn expect_code(&self, code: u32) -> Result<&Self> {
        if self.header.code != code {
            return Err(FrameError::UnexpectedCode {
                code: self.header.code,
                expected: code,
            });
        }
        Ok(self)
    }

    /// Total bytes this message occupies on the wire.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}
