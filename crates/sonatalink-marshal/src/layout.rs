use std::fmt;

use crate::error::{IntegrityError, Result};

/// Multi-byte numeric field types carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    I32,
    /// A 32-bit enumerator, range-checked on decode.
    Enum,
    U32,
    U64,
    F32,
    F64,
}

impl Scalar {
    pub const fn size(self) -> usize {
        match self {
            Self::I32 | Self::Enum | Self::U32 | Self::F32 => 4,
            Self::U64 | Self::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::Enum => "enum",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

/// What one field (or one element of an array field) holds.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A number, byte-swapped on little-endian hosts.
    Scalar(Scalar),
    /// A fixed character array of the given length, never reordered.
    Bytes(usize),
    /// A nested record.
    Record(&'static Layout),
}

impl FieldKind {
    /// Size of one element.
    pub const fn size(&self) -> usize {
        match self {
            Self::Scalar(s) => s.size(),
            Self::Bytes(n) => *n,
            Self::Record(layout) => layout.size,
        }
    }

    /// Natural alignment of one element.
    pub fn align(&self) -> usize {
        match self {
            Self::Scalar(s) => s.size(),
            Self::Bytes(_) => 1,
            Self::Record(layout) => layout.align(),
        }
    }

    /// Short type description for reports.
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(s) => s.name().to_owned(),
            Self::Bytes(n) => format!("[u8; {n}]"),
            Self::Record(layout) => layout.name.to_owned(),
        }
    }
}

/// A named field at a fixed byte offset.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
    /// Number of consecutive elements (1 for a plain field).
    pub count: usize,
}

impl Field {
    pub const fn scalar(name: &'static str, offset: usize, scalar: Scalar) -> Self {
        Self::array(name, offset, FieldKind::Scalar(scalar), 1)
    }

    pub const fn enumerated(name: &'static str, offset: usize) -> Self {
        Self::scalar(name, offset, Scalar::Enum)
    }

    pub const fn bytes(name: &'static str, offset: usize, len: usize) -> Self {
        Self::array(name, offset, FieldKind::Bytes(len), 1)
    }

    pub const fn record(name: &'static str, offset: usize, layout: &'static Layout) -> Self {
        Self::array(name, offset, FieldKind::Record(layout), 1)
    }

    pub const fn array(name: &'static str, offset: usize, kind: FieldKind, count: usize) -> Self {
        Self {
            name,
            offset,
            kind,
            count,
        }
    }

    /// Total bytes covered by this field.
    pub const fn size(&self) -> usize {
        self.kind.size() * self.count
    }
}

/// Declared wire layout of a record: its size and every field's offset.
#[derive(Debug)]
pub struct Layout {
    pub name: &'static str,
    pub size: usize,
    pub fields: &'static [Field],
}

impl Layout {
    /// Largest alignment of any field.
    pub fn align(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.kind.align())
            .max()
            .unwrap_or(1)
    }

    /// Check that the fields tile the record exactly: each starts where the
    /// previous ended, each is naturally aligned, and the record size is the
    /// sum of its fields and a multiple of its alignment. Nested records are
    /// checked too.
    pub fn verify(&self) -> Result<()> {
        let mut cursor = 0usize;
        for field in self.fields {
            if field.offset != cursor {
                return Err(IntegrityError::OffsetMismatch {
                    record: self.name,
                    field: field.name,
                    expected: cursor,
                    actual: field.offset,
                });
            }
            let align = field.kind.align();
            if field.offset % align != 0 {
                return Err(IntegrityError::Misaligned {
                    record: self.name,
                    field: field.name,
                    offset: field.offset,
                    align,
                });
            }
            if let FieldKind::Record(inner) = field.kind {
                inner.verify()?;
            }
            cursor += field.size();
        }

        if cursor != self.size {
            return Err(IntegrityError::SizeMismatch {
                record: self.name,
                declared: self.size,
                computed: cursor,
            });
        }
        let align = self.align();
        if self.size % align != 0 {
            return Err(IntegrityError::Misaligned {
                record: self.name,
                field: "<size>",
                offset: self.size,
                align,
            });
        }
        Ok(())
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} bytes)", self.name, self.size)?;
        for field in self.fields {
            let ty = if field.count > 1 {
                format!("{}[{}]", field.kind.describe(), field.count)
            } else {
                field.kind.describe()
            };
            writeln!(f, "  {:>5}  {:<24} {}", field.offset, field.name, ty)?;
        }
        Ok(())
    }
}
