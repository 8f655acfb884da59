//! Message transport and wire marshalling for the SonATA observing system.
//!
//! # Crate Structure
//!
//! - [`monitor`]: lock, condition and monitor primitives
//! - [`transport`]: display, file and TCP connections behind one trait
//! - [`marshal`]: big-endian marshalling of the fixed interface records
//! - [`frame`]: header + body message framing, numbering and log replay

/// Re-export synchronization primitives.
pub mod monitor {
    pub use sonatalink_monitor::*;
}

/// Re-export transport types.
pub mod transport {
    pub use sonatalink_transport::*;
}

/// Re-export marshalling types and interface records.
pub mod marshal {
    pub use sonatalink_marshal::*;
}

/// Re-export message framing types.
pub mod frame {
    pub use sonatalink_frame::*;
}
