//! Host/network byte order conversion driven by a record [`Layout`].
//!
//! Converting between host order and big-endian is the same operation in both
//! directions: on a little-endian host it reverses the bytes of every
//! multi-byte number, on a big-endian host it does nothing. There is therefore
//! one primitive, [`swap_fields`], and [`to_wire`] / [`from_wire`] are two
//! names for it that document intent at the call site. Applying it twice
//! restores the original bytes.

use crate::error::{IntegrityError, Result};
use crate::layout::{FieldKind, Layout};

const SWAP: bool = cfg!(target_endian = "little");

/// Toggle every numeric field of `bytes` between host and network order.
///
/// Character arrays are left untouched; nested records and arrays of records
/// are walked field by field. `bytes` must be exactly one record.
pub fn swap_fields(layout: &Layout, bytes: &mut [u8]) -> Result<()> {
    check_len(layout, bytes.len())?;
    if SWAP {
        swap_in_place(layout, bytes);
    }
    Ok(())
}

/// Convert a host-order image of a record to wire order.
pub fn to_wire(layout: &Layout, bytes: &mut [u8]) -> Result<()> {
    swap_fields(layout, bytes)
}

/// Convert a wire-order image of a record to host order.
pub fn from_wire(layout: &Layout, bytes: &mut [u8]) -> Result<()> {
    swap_fields(layout, bytes)
}

pub(crate) fn check_len(layout: &Layout, len: usize) -> Result<()> {
    if len < layout.size {
        return Err(IntegrityError::Truncated {
            record: layout.name,
            expected: layout.size,
            actual: len,
        });
    }
    if len > layout.size {
        return Err(IntegrityError::TrailingBytes {
            record: layout.name,
            expected: layout.size,
            actual: len,
        });
    }
    Ok(())
}

/// Caller guarantees `bytes.len() == layout.size`.
pub(crate) fn swap_in_place(layout: &Layout, bytes: &mut [u8]) {
    for field in layout.fields {
        let stride = field.kind.size();
        for index in 0..field.count {
            let start = field.offset + index * stride;
            let Some(slot) = bytes.get_mut(start..start + stride) else {
                return;
            };
            match field.kind {
                FieldKind::Scalar(_) => slot.reverse(),
                FieldKind::Record(inner) => swap_in_place(inner, slot),
                FieldKind::Bytes(_) => {}
            }
        }
    }
}
