use std::borrow::Cow;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::layout::Layout;
use crate::order::{check_len, from_wire, swap_in_place};

/// A fixed-layout record that can be put on the wire.
///
/// Implementors write and read their fields in [`LAYOUT`](Self::LAYOUT) order
/// using host-native byte order (`put_*_ne` / `get_*_ne`), one `put` per
/// number or character array; the layout-driven swap in [`marshall`] and
/// [`demarshall`] takes care of network order. Enumerated fields are
/// range-checked in [`read_native`](Self::read_native).
///
/// [`check_all_layouts`](crate::check_all_layouts) traces every encoder
/// against its layout, so an encoder that drifts from the declared field
/// order fails at startup instead of on the wire.
pub trait Marshall: Sized {
    /// Declared wire layout.
    const LAYOUT: &'static Layout;

    /// Exact size on the wire.
    const WIRE_SIZE: usize = Self::LAYOUT.size;

    /// Append the host-order image of `self`. Must append exactly
    /// [`WIRE_SIZE`](Self::WIRE_SIZE) bytes.
    fn write_native<B: BufMut>(&self, dst: &mut B);

    /// Read a host-order image. `src` holds at least
    /// [`WIRE_SIZE`](Self::WIRE_SIZE) bytes.
    fn read_native(src: &mut &[u8]) -> Result<Self>;
}

/// Encode `record` into its big-endian wire image.
pub fn marshall<R: Marshall>(record: &R) -> Bytes {
    let mut dst = BytesMut::with_capacity(R::WIRE_SIZE);
    marshall_into(record, &mut dst);
    dst.freeze()
}

/// Append the wire image of `record` to `dst`.
pub fn marshall_into<R: Marshall>(record: &R, dst: &mut BytesMut) {
    let start = dst.len();
    record.write_native(dst);
    debug_assert_eq!(
        dst.len() - start,
        R::WIRE_SIZE,
        "{} wrote a wrong-sized image",
        R::LAYOUT.name
    );
    if cfg!(target_endian = "little") {
        swap_in_place(R::LAYOUT, &mut dst[start..]);
    }
}

/// Decode a record from exactly [`Marshall::WIRE_SIZE`] wire bytes.
///
/// Fails with an integrity error if the length is wrong or an enumerated
/// field is out of range.
pub fn demarshall<R: Marshall>(wire: &[u8]) -> Result<R> {
    check_len(R::LAYOUT, wire.len())?;
    let mut native = wire.to_vec();
    from_wire(R::LAYOUT, &mut native)?;
    let mut src = native.as_slice();
    R::read_native(&mut src)
}

/// Pack `text` into a NUL-padded character array, truncating so that at least
/// one terminating NUL remains.
pub fn text_field<const N: usize>(text: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let len = text.len().min(N.saturating_sub(1));
    field[..len].copy_from_slice(&text.as_bytes()[..len]);
    field
}

/// Text held in a NUL-padded character array, up to the first NUL.
pub fn field_text(field: &[u8]) -> Cow<'_, str> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end])
}

pub(crate) fn get_array<const N: usize>(src: &mut &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    src.copy_to_slice(&mut out);
    out
}
