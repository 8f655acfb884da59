//! Startup check that every record's declared layout matches both the wire
//! format rules and what the host encoder actually produces.

use bytes::buf::UninitSlice;
use bytes::BufMut;
use tracing::{debug, error, info};

use crate::error::{IntegrityError, Result};
use crate::layout::{FieldKind, Layout, Scalar};
use crate::marshall::{demarshall, marshall, Marshall};
use crate::records::{channelizer, common, doppler, dx, tscope};

/// One registered record type.
#[derive(Debug, Clone, Copy)]
pub struct RecordInfo {
    pub layout: &'static Layout,
    /// Traces the record's encoder against `layout` and checks that every
    /// field lands at its declared offset.
    pub encoder: fn() -> Result<()>,
}

impl RecordInfo {
    pub const fn of<R: Marshall + Default + PartialEq>() -> Self {
        Self {
            layout: R::LAYOUT,
            encoder: check_encoder::<R>,
        }
    }

    /// Run the layout rules and the encoder check.
    pub fn check(&self) -> Result<()> {
        self.layout.verify()?;
        (self.encoder)()
    }
}

/// Result of a successful [`check_all_layouts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    pub records: usize,
    pub fingerprint: u64,
}

static REGISTRY: &[RecordInfo] = &[
    RecordInfo::of::<common::NssDate>(),
    RecordInfo::of::<common::MessageHeader>(),
    RecordInfo::of::<common::NssMessage>(),
    RecordInfo::of::<channelizer::BaseAddr>(),
    RecordInfo::of::<channelizer::Intrinsics>(),
    RecordInfo::of::<channelizer::Status>(),
    RecordInfo::of::<channelizer::Start>(),
    RecordInfo::of::<channelizer::Started>(),
    RecordInfo::of::<channelizer::NetStatistics>(),
    RecordInfo::of::<channelizer::Complex64>(),
    RecordInfo::of::<channelizer::SampleStatistics>(),
    RecordInfo::of::<channelizer::BeamStatistics>(),
    RecordInfo::of::<channelizer::ChannelizerStatisticsHeader>(),
    RecordInfo::of::<dx::HereIAm>(),
    RecordInfo::of::<dx::ThereYouAre>(),
    RecordInfo::of::<dx::DxBaseAddr>(),
    RecordInfo::of::<dx::DxIntrinsics>(),
    RecordInfo::of::<dx::DxConfiguration>(),
    RecordInfo::of::<dx::FrequencyBand>(),
    RecordInfo::of::<dx::PulseParameters>(),
    RecordInfo::of::<dx::DxScienceDataRequest>(),
    RecordInfo::of::<dx::BaselineLimits>(),
    RecordInfo::of::<dx::DxActivityParameters>(),
    RecordInfo::of::<dx::DxTuned>(),
    RecordInfo::of::<dx::StartActivity>(),
    RecordInfo::of::<dx::SignalId>(),
    RecordInfo::of::<dx::SignalPath>(),
    RecordInfo::of::<dx::SignalDescription>(),
    RecordInfo::of::<dx::ConfirmationStats>(),
    RecordInfo::of::<dx::ArchiveRequest>(),
    RecordInfo::of::<dx::DxActivityStatus>(),
    RecordInfo::of::<dx::DxStatus>(),
    RecordInfo::of::<dx::Count>(),
    RecordInfo::of::<doppler::DopplerParameters>(),
    RecordInfo::of::<tscope::TscopeIntrinsics>(),
    RecordInfo::of::<tscope::TscopePointing>(),
];

/// Every record type known to this crate.
pub fn registry() -> &'static [RecordInfo] {
    REGISTRY
}

/// Look up a registered record by its layout name.
pub fn find(name: &str) -> Option<&'static RecordInfo> {
    REGISTRY.iter().find(|info| info.layout.name == name)
}

fn check_encoder<R: Marshall + Default + PartialEq>() -> Result<()> {
    let layout = R::LAYOUT;
    let record = R::default();
    let mismatch = |detail: String| IntegrityError::EncodingMismatch {
        record: layout.name,
        detail,
    };

    let mut trace = Trace::default();
    record.write_native(&mut trace);
    if trace.image.len() != layout.size {
        return Err(mismatch(format!(
            "encoder wrote {} bytes, layout declares {}",
            trace.image.len(),
            layout.size
        )));
    }

    let mut leaves = Vec::new();
    collect_leaves(layout, 0, "", &mut leaves);
    for (index, leaf) in leaves.iter().enumerate() {
        match trace.widths.get(index) {
            Some(&width) if width == leaf.width => {}
            Some(&width) => {
                return Err(mismatch(format!(
                    "encoder wrote {width} bytes where {} (offset {}) declares {}",
                    leaf.path, leaf.offset, leaf.width
                )))
            }
            None => {
                return Err(mismatch(format!(
                    "encoder stopped before {} (offset {})",
                    leaf.path, leaf.offset
                )))
            }
        }
    }
    if trace.widths.len() != leaves.len() {
        return Err(mismatch(format!(
            "encoder made {} writes, layout declares {} fields",
            trace.widths.len(),
            leaves.len()
        )));
    }

    let wire = marshall(&record);
    let again = marshall(&demarshall::<R>(&wire)?);
    if wire != again {
        return Err(mismatch(
            "decode then encode changed the wire image".to_string(),
        ));
    }

    // Plant a marker in one field at a time; it has to come back out of the
    // encoder at the same offset, and reach the wire big-endian.
    for leaf in leaves.iter().filter(|leaf| leaf.scalar != Some(Scalar::Enum)) {
        let (native, network) = leaf.marker();
        let span = leaf.offset..leaf.offset + leaf.width;

        let mut planted = trace.image.clone();
        planted[span.clone()].copy_from_slice(&native);

        let decoded = R::read_native(&mut planted.as_slice()).map_err(|e| {
            mismatch(format!(
                "{} (offset {}): decoding a marker failed: {e}",
                leaf.path, leaf.offset
            ))
        })?;
        let mut encoded = Vec::with_capacity(layout.size);
        decoded.write_native(&mut encoded);
        if let Some(at) = first_difference(&planted, &encoded) {
            return Err(mismatch(format!(
                "{} (offset {}) does not survive decode and encode; bytes differ at {at}",
                leaf.path, leaf.offset
            )));
        }
        if marshall(&decoded).get(span) != Some(&network[..]) {
            return Err(mismatch(format!(
                "{} (offset {}) is not big-endian on the wire",
                leaf.path, leaf.offset
            )));
        }
    }

    // Every marker at once.
    let mut populated = trace.image.clone();
    let mut expected = wire.to_vec();
    for leaf in leaves.iter().filter(|leaf| leaf.scalar != Some(Scalar::Enum)) {
        let (native, network) = leaf.marker();
        let span = leaf.offset..leaf.offset + leaf.width;
        populated[span.clone()].copy_from_slice(&native);
        expected[span].copy_from_slice(&network);
    }
    let record = R::read_native(&mut populated.as_slice())?;
    let on_wire = marshall(&record);
    if let Some(at) = first_difference(&expected, &on_wire) {
        return Err(mismatch(format!(
            "populated record differs from its field markers at byte {at}"
        )));
    }
    if demarshall::<R>(&on_wire)? != record {
        return Err(mismatch(
            "populated record does not survive marshall and demarshall".to_string(),
        ));
    }
    Ok(())
}

/// One number or character array of a flattened layout.
#[derive(Debug)]
struct Leaf {
    path: String,
    offset: usize,
    width: usize,
    /// `None` for character arrays.
    scalar: Option<Scalar>,
}

impl Leaf {
    /// A value derived from the offset, as (host order, network order) bytes.
    fn marker(&self) -> (Vec<u8>, Vec<u8>) {
        let tag = self.offset as u64;
        match self.scalar {
            Some(Scalar::I32 | Scalar::Enum | Scalar::U32) => {
                let v = 0x5a5a_0000 | (tag as u32 & 0xffff);
                (v.to_ne_bytes().to_vec(), v.to_be_bytes().to_vec())
            }
            Some(Scalar::U64) => {
                let v = 0x5a5a_5a5a_0000_0000 | tag;
                (v.to_ne_bytes().to_vec(), v.to_be_bytes().to_vec())
            }
            Some(Scalar::F32) => {
                let v = tag as f32 + 0.25;
                (v.to_ne_bytes().to_vec(), v.to_be_bytes().to_vec())
            }
            Some(Scalar::F64) => {
                let v = tag as f64 + 0.5;
                (v.to_ne_bytes().to_vec(), v.to_be_bytes().to_vec())
            }
            None => {
                let text: Vec<u8> = (0..self.width)
                    .map(|i| ((self.offset + i) % 251 + 1) as u8)
                    .collect();
                (text.clone(), text)
            }
        }
    }
}

fn collect_leaves(layout: &Layout, base: usize, prefix: &str, out: &mut Vec<Leaf>) {
    for field in layout.fields {
        let stride = field.kind.size();
        for index in 0..field.count {
            let offset = base + field.offset + index * stride;
            let path = if field.count > 1 {
                format!("{prefix}{}[{index}]", field.name)
            } else {
                format!("{prefix}{}", field.name)
            };
            match field.kind {
                FieldKind::Scalar(scalar) => out.push(Leaf {
                    path,
                    offset,
                    width: stride,
                    scalar: Some(scalar),
                }),
                FieldKind::Bytes(width) => out.push(Leaf {
                    path,
                    offset,
                    width,
                    scalar: None,
                }),
                FieldKind::Record(inner) => collect_leaves(inner, offset, &format!("{path}."), out),
            }
        }
    }
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    if a.len() != b.len() {
        return Some(a.len().min(b.len()));
    }
    a.iter().zip(b).position(|(x, y)| x != y)
}

/// Host-order sink that remembers the width of every write an encoder makes.
#[derive(Default)]
struct Trace {
    image: Vec<u8>,
    widths: Vec<usize>,
}

// SAFETY: storage and capacity are those of the inner `Vec<u8>`, whose
// `BufMut` implementation upholds the contract; `put_slice` only appends.
unsafe impl BufMut for Trace {
    fn remaining_mut(&self) -> usize {
        self.image.remaining_mut()
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        self.widths.push(cnt);
        // SAFETY: the caller initialized `cnt` bytes of the last `chunk_mut`.
        unsafe { self.image.advance_mut(cnt) }
    }

    fn chunk_mut(&mut self) -> &mut UninitSlice {
        self.image.chunk_mut()
    }

    fn put_slice(&mut self, src: &[u8]) {
        if !src.is_empty() {
            self.widths.push(src.len());
            self.image.extend_from_slice(src);
        }
    }
}

/// Validate every registered layout and log its size and field offsets.
///
/// All records are checked even after a failure; the first failure is
/// returned.
pub fn check_all_layouts() -> Result<LayoutSummary> {
    let mut first_failure = None;
    for info in REGISTRY {
        let layout = info.layout;
        debug!(record = layout.name, size = layout.size, "record layout");
        for field in layout.fields {
            debug!(
                record = layout.name,
                field = field.name,
                offset = field.offset,
                size = field.size(),
                "field"
            );
        }
        if let Err(e) = info.check() {
            error!(record = layout.name, error = %e, "layout check failed");
            first_failure.get_or_insert(e);
        }
    }
    if let Some(e) = first_failure {
        return Err(e);
    }

    let summary = LayoutSummary {
        records: REGISTRY.len(),
        fingerprint: fingerprint(),
    };
    info!(
        records = summary.records,
        fingerprint = %format!("{:016x}", summary.fingerprint),
        "record layouts verified"
    );
    Ok(summary)
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

struct Fnv(u64);

impl Fnv {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 ^= u64::from(*b);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn write_usize(&mut self, n: usize) {
        self.write(&(n as u64).to_be_bytes());
    }
}

fn hash_layout(h: &mut Fnv, layout: &Layout) {
    h.write(layout.name.as_bytes());
    h.write_usize(layout.size);
    for field in layout.fields {
        h.write(field.name.as_bytes());
        h.write_usize(field.offset);
        h.write_usize(field.count);
        match field.kind {
            FieldKind::Scalar(s) => h.write(s.name().as_bytes()),
            FieldKind::Bytes(n) => {
                h.write(b"bytes");
                h.write_usize(n);
            }
            FieldKind::Record(inner) => hash_layout(h, inner),
        }
    }
}

/// FNV-1a digest of every registered layout. Two builds agree on the wire
/// format exactly when their fingerprints match.
pub fn fingerprint() -> u64 {
    let mut h = Fnv(FNV_OFFSET);
    for info in REGISTRY {
        hash_layout(&mut h, info.layout);
    }
    h.0
}
