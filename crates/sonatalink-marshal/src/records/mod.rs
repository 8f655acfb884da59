//! Interface records, grouped by the peer they are exchanged with.

pub mod channelizer;
pub mod common;
pub mod doppler;
pub mod dx;
pub mod tscope;
