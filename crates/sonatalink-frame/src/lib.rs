//! Message framing on top of any [`Connection`](sonatalink_transport::Connection).
//!
//! Every message is a [`MessageHeader`](sonatalink_marshal::common::MessageHeader)
//! followed by a body of exactly `data_length` bytes:
//!
//! ```text
//! ┌──────┬─────────────┬────────────────┬─────────────┬───────────┬─────────────┬───────────────┐
//! │ code │ data_length │ message_number │ activity_id │ timestamp │ sender[16]  │ receiver[16]  │ body ...
//! │ u32  │ u32         │ u32            │ i32         │ 2 x i32   │             │               │
//! └──────┴─────────────┴────────────────┴─────────────┴───────────┴─────────────┴───────────────┘
//! ```
//!
//! All numeric fields are big-endian. [`MessageWriter`] stamps and sends
//! messages, [`MessageReader`] receives them, and [`replay`] reads back the
//! messages a file connection logged.

pub mod error;
pub mod message;
pub mod reader;
pub mod replay;
pub mod writer;

pub use error::{FrameError, Result};
pub use message::{FrameConfig, Message, HEADER_FRAMING, HEADER_SIZE};
pub use reader::MessageReader;
pub use replay::{replay, Replay};
pub use writer::MessageWriter;
