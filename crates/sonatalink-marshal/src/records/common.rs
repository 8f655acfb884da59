//! Records and enumerations shared by every interface: the message header,
//! timestamps and free-text notifications.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::layout::{Field, Layout, Scalar};
use crate::marshall::{field_text, get_array, text_field, Marshall};

/// Length of free-form text fields (host names, versions, file names).
pub const MAX_TEXT_STRING: usize = 256;
/// Length of the description in an [`NssMessage`].
pub const MAX_NSS_MESSAGE_STRING: usize = 512;
/// Length of the sender and receiver names in a [`MessageHeader`].
pub const HEADER_ID_SIZE: usize = 16;
/// Activity id carried by messages that belong to no activity.
pub const NO_ACTIVITY_ID: i32 = -1;

/// First message code of each subsystem's range.
pub mod code_range {
    pub const SSE: u32 = 10_000;
    pub const RFC: u32 = 20_000;
    pub const IFC: u32 = 30_000;
    pub const DX: u32 = 40_000;
    pub const TSCOPE: u32 = 50_000;
    pub const TSIG: u32 = 60_000;
    pub const DX_ARCHIVER: u32 = 70_000;
    pub const CHANNELIZER: u32 = 80_000;
}

/// NUL-padded IP address or host name.
pub type IpAddress = [u8; MAX_TEXT_STRING];

wire_enum! {
    /// Boolean carried as a 32-bit integer.
    pub enum BoolT {
        False = 0 => "false",
        True = 1 => "true",
    }
}

impl From<bool> for BoolT {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<BoolT> for bool {
    fn from(value: BoolT) -> bool {
        value == BoolT::True
    }
}

wire_enum! {
    /// Observatory an instrument belongs to.
    pub enum SiteId {
        Uninit = 0 => "uninit",
        Arecibo = 5 => "arecibo",
        JodrellBank = 7 => "jodrell-bank",
        Ata = 8 => "ata",
    }
}

wire_enum! {
    pub enum Polarization {
        RightCircular = 0 => "right",
        LeftCircular = 1 => "left",
        Both = 2 => "both",
        Mixed = 3 => "mixed",
        Uninit = 4 => "uninit",
        XLinear = 5 => "x",
        YLinear = 6 => "y",
        BothLinear = 7 => "both-linear",
    }
}

wire_enum! {
    pub enum NssMessageSeverity {
        Info = 0 => "info",
        Warning = 1 => "warning",
        Error = 2 => "error",
        Fatal = 3 => "fatal",
    }
}

/// Wall-clock time with microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NssDate {
    pub tv_sec: i32,
    pub tv_usec: i32,
}

pub const NSS_DATE: Layout = Layout {
    name: "NssDate",
    size: 8,
    fields: &[
        Field::scalar("tv_sec", 0, Scalar::I32),
        Field::scalar("tv_usec", 4, Scalar::I32),
    ],
};

impl NssDate {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }
}

impl From<SystemTime> for NssDate {
    fn from(time: SystemTime) -> Self {
        let since = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            tv_sec: i32::try_from(since.as_secs()).unwrap_or(i32::MAX),
            tv_usec: since.subsec_micros() as i32,
        }
    }
}

impl Marshall for NssDate {
    const LAYOUT: &'static Layout = &NSS_DATE;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.tv_sec);
        dst.put_i32_ne(self.tv_usec);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            tv_sec: src.get_i32_ne(),
            tv_usec: src.get_i32_ne(),
        })
    }
}

/// Fixed header preceding every message body.
///
/// `data_length` is the byte length of the body that follows; receivers read
/// the header first and use it to size the body read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Type of the body.
    pub code: u32,
    pub data_length: u32,
    /// Per-sender counter starting at 1.
    pub message_number: u32,
    pub activity_id: i32,
    pub timestamp: NssDate,
    pub sender: [u8; HEADER_ID_SIZE],
    pub receiver: [u8; HEADER_ID_SIZE],
}

pub const MESSAGE_HEADER: Layout = Layout {
    name: "MessageHeader",
    size: 56,
    fields: &[
        Field::scalar("code", 0, Scalar::U32),
        Field::scalar("data_length", 4, Scalar::U32),
        Field::scalar("message_number", 8, Scalar::U32),
        Field::scalar("activity_id", 12, Scalar::I32),
        Field::record("timestamp", 16, &NSS_DATE),
        Field::bytes("sender", 24, HEADER_ID_SIZE),
        Field::bytes("receiver", 40, HEADER_ID_SIZE),
    ],
};

/// Offset of `data_length` inside [`MessageHeader`].
pub const DATA_LENGTH_OFFSET: usize = 4;

impl Default for MessageHeader {
    fn default() -> Self {
        Self {
            code: 0,
            data_length: 0,
            message_number: 0,
            activity_id: NO_ACTIVITY_ID,
            timestamp: NssDate::default(),
            sender: [0; HEADER_ID_SIZE],
            receiver: [0; HEADER_ID_SIZE],
        }
    }
}

impl MessageHeader {
    pub fn sender_name(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.sender)
    }

    pub fn receiver_name(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.receiver)
    }

    pub fn set_sender(&mut self, name: &str) {
        self.sender = text_field(name);
    }

    pub fn set_receiver(&mut self, name: &str) {
        self.receiver = text_field(name);
    }
}

impl Marshall for MessageHeader {
    const LAYOUT: &'static Layout = &MESSAGE_HEADER;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_ne(self.code);
        dst.put_u32_ne(self.data_length);
        dst.put_u32_ne(self.message_number);
        dst.put_i32_ne(self.activity_id);
        self.timestamp.write_native(dst);
        dst.put_slice(&self.sender);
        dst.put_slice(&self.receiver);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            code: src.get_u32_ne(),
            data_length: src.get_u32_ne(),
            message_number: src.get_u32_ne(),
            activity_id: src.get_i32_ne(),
            timestamp: NssDate::read_native(src)?,
            sender: get_array(src),
            receiver: get_array(src),
        })
    }
}

/// Free-text notification (error report, status note).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NssMessage {
    pub code: u32,
    pub severity: NssMessageSeverity,
    pub description: [u8; MAX_NSS_MESSAGE_STRING],
}

pub const NSS_MESSAGE: Layout = Layout {
    name: "NssMessage",
    size: 520,
    fields: &[
        Field::scalar("code", 0, Scalar::U32),
        Field::enumerated("severity", 4),
        Field::bytes("description", 8, MAX_NSS_MESSAGE_STRING),
    ],
};

impl NssMessage {
    pub fn new(code: u32, severity: NssMessageSeverity, description: &str) -> Self {
        Self {
            code,
            severity,
            description: text_field(description),
        }
    }

    pub fn description(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.description)
    }
}

impl Default for NssMessage {
    fn default() -> Self {
        Self::new(0, NssMessageSeverity::Info, "")
    }
}

impl Marshall for NssMessage {
    const LAYOUT: &'static Layout = &NSS_MESSAGE;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_ne(self.code);
        dst.put_i32_ne(self.severity.code());
        dst.put_slice(&self.description);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            code: src.get_u32_ne(),
            severity: NssMessageSeverity::try_from(src.get_i32_ne())?,
            description: get_array(src),
        })
    }
}
