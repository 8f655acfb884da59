/// Protocol integrity failures: bytes that cannot be a valid record, or a
/// record layout that does not match what the wire format requires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// An enumerated field holds a value outside its declared range.
    #[error("{enumeration}: {value} is not a valid enumerator")]
    InvalidEnumerator {
        enumeration: &'static str,
        value: i64,
    },

    /// The buffer is shorter than the record.
    #[error("{record}: need {expected} bytes, got {actual}")]
    Truncated {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The buffer is longer than the record.
    #[error("{record}: expected exactly {expected} bytes, got {actual}")]
    TrailingBytes {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The declared record size differs from the span its fields cover.
    #[error("{record}: declared size {declared}, fields cover {computed}")]
    SizeMismatch {
        record: &'static str,
        declared: usize,
        computed: usize,
    },

    /// A field does not start where the previous one ended.
    #[error("{record}.{field}: declared at offset {actual}, expected {expected}")]
    OffsetMismatch {
        record: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field (or the record size) breaks natural alignment.
    #[error("{record}.{field}: offset {offset} is not a multiple of {align}")]
    Misaligned {
        record: &'static str,
        field: &'static str,
        offset: usize,
        align: usize,
    },

    /// The host encoder disagrees with the declared layout.
    #[error("{record}: {detail}")]
    EncodingMismatch { record: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, IntegrityError>;
