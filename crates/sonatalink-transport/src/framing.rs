use bytes::{Buf, Bytes};

/// Default upper bound on a declared body length: 16 MiB.
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// Shape of a length-prefixed message: a fixed-size header carrying a
/// big-endian `u32` body length at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    /// Header size in bytes.
    pub header_len: usize,
    /// Offset of the big-endian body length inside the header.
    pub length_offset: usize,
    /// Largest body a receiver will allocate for.
    pub max_body: usize,
}

impl Framing {
    pub const fn new(header_len: usize, length_offset: usize) -> Self {
        Self {
            header_len,
            length_offset,
            max_body: DEFAULT_MAX_BODY,
        }
    }

    pub const fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// Body length declared by `header`.
    ///
    /// A length field that does not fit inside `header` reads as `usize::MAX`,
    /// which every receiver rejects as oversize.
    pub fn body_len(&self, header: &[u8]) -> usize {
        match header.get(self.length_offset..self.length_offset + 4) {
            Some(mut field) => field.get_u32() as usize,
            None => usize::MAX,
        }
    }
}

/// One framed message as read off the wire, still in wire byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub header: Bytes,
    pub body: Bytes,
}

impl Received {
    /// Total bytes consumed from the connection.
    pub fn wire_size(&self) -> usize {
        self.header.len() + self.body.len()
    }
}
