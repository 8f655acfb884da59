//! Byte-order-safe marshalling of fixed-layout records.
//!
//! Every record on the wire is a fixed-size aggregate of 32/64-bit integers,
//! IEEE floats, NUL-padded character arrays and nested records. Multi-byte
//! numbers travel big-endian; character arrays travel verbatim.
//!
//! A record is built with host-native values, turned into wire bytes with
//! [`marshall`] right before it is sent, and recovered with [`demarshall`]
//! right after it is received. Each record also publishes its [`Layout`],
//! which drives the byte swap and the startup self-check in
//! [`check_all_layouts`].
//!
//! ```
//! use sonatalink_marshal::channelizer::{ChannelizerState, Status};
//! use sonatalink_marshal::{demarshall, marshall, Marshall};
//!
//! let status = Status::default();
//! let wire = marshall(&status);
//! assert_eq!(wire.len(), Status::WIRE_SIZE);
//!
//! let back: Status = demarshall(&wire).unwrap();
//! assert_eq!(back.state, ChannelizerState::Idle);
//! ```

#[macro_use]
mod wire_enum;

pub mod error;
pub mod layout;
pub mod marshall;
pub mod order;
pub mod records;
pub mod selfcheck;

pub use error::{IntegrityError, Result};
pub use layout::{Field, FieldKind, Layout, Scalar};
pub use marshall::{demarshall, field_text, marshall, marshall_into, text_field, Marshall};
pub use order::{from_wire, swap_fields, to_wire};
pub use records::{channelizer, common, doppler, dx, tscope};
pub use selfcheck::{check_all_layouts, fingerprint, registry, LayoutSummary, RecordInfo};
