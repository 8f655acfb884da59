//! System controller <-> channelizer interface.

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::layout::{Field, Layout, Scalar};
use crate::marshall::{field_text, get_array, text_field, Marshall};
use crate::records::common::{IpAddress, NssDate, Polarization, MAX_TEXT_STRING, NSS_DATE};

pub const INTERFACE_VERSION: &str = "SSE-CHAN Interface Version 1.0.3 2010-Jan-14  0:34:13 UTC";

wire_enum! {
    pub enum ChannelizerMessageCode {
        Uninit = 80000 => "uninit",
        RequestIntrinsics = 80001 => "request-intrinsics",
        SendIntrinsics = 80002 => "send-intrinsics",
        RequestStatus = 80003 => "request-status",
        SendStatus = 80004 => "send-status",
        Start = 80005 => "start",
        Started = 80006 => "started",
        SendMessage = 80007 => "send-message",
        Stop = 80008 => "stop",
        Shutdown = 80009 => "shutdown",
        End = 80010 => "end",
    }
}

wire_enum! {
    pub enum ChannelizerState {
        Idle = 0 => "idle",
        Pending = 1 => "pending",
        Running = 2 => "running",
    }
}

/// Multicast base address of a packet stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseAddr {
    pub addr: IpAddress,
    pub port: i32,
}

pub const BASE_ADDR: Layout = Layout {
    name: "BaseAddr",
    size: 260,
    fields: &[
        Field::bytes("addr", 0, MAX_TEXT_STRING),
        Field::scalar("port", 256, Scalar::I32),
    ],
};

impl BaseAddr {
    pub fn new(addr: &str, port: i32) -> Self {
        Self {
            addr: text_field(addr),
            port,
        }
    }

    pub fn host(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.addr)
    }
}

impl Default for BaseAddr {
    fn default() -> Self {
        Self::new("", -1)
    }
}

impl Marshall for BaseAddr {
    const LAYOUT: &'static Layout = &BASE_ADDR;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.addr);
        dst.put_i32_ne(self.port);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            addr: get_array(src),
            port: src.get_i32_ne(),
        })
    }
}

/// Static description a channelizer reports about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Intrinsics {
    pub interface_version: [u8; MAX_TEXT_STRING],
    pub name: [u8; MAX_TEXT_STRING],
    pub host: [u8; MAX_TEXT_STRING],
    pub code_version: [u8; MAX_TEXT_STRING],
    /// Input (beam) stream.
    pub beam_base: BaseAddr,
    pub beam_id: i32,
    pub pol: Polarization,
    /// Output (channel) stream.
    pub channel_base: BaseAddr,
    pub total_channels: i32,
    pub output_channels: i32,
    pub mhz_per_channel: f64,
    pub foldings: i32,
    pub oversampling: f32,
    pub filter_name: [u8; MAX_TEXT_STRING],
}

pub const INTRINSICS: Layout = Layout {
    name: "Intrinsics",
    size: 1832,
    fields: &[
        Field::bytes("interface_version", 0, MAX_TEXT_STRING),
        Field::bytes("name", 256, MAX_TEXT_STRING),
        Field::bytes("host", 512, MAX_TEXT_STRING),
        Field::bytes("code_version", 768, MAX_TEXT_STRING),
        Field::record("beam_base", 1024, &BASE_ADDR),
        Field::scalar("beam_id", 1284, Scalar::I32),
        Field::enumerated("pol", 1288),
        Field::record("channel_base", 1292, &BASE_ADDR),
        Field::scalar("total_channels", 1552, Scalar::I32),
        Field::scalar("output_channels", 1556, Scalar::I32),
        Field::scalar("mhz_per_channel", 1560, Scalar::F64),
        Field::scalar("foldings", 1568, Scalar::I32),
        Field::scalar("oversampling", 1572, Scalar::F32),
        Field::bytes("filter_name", 1576, MAX_TEXT_STRING),
    ],
};

impl Default for Intrinsics {
    fn default() -> Self {
        Self {
            interface_version: text_field(INTERFACE_VERSION),
            name: [0; MAX_TEXT_STRING],
            host: [0; MAX_TEXT_STRING],
            code_version: [0; MAX_TEXT_STRING],
            beam_base: BaseAddr::default(),
            beam_id: -1,
            pol: Polarization::Uninit,
            channel_base: BaseAddr::default(),
            total_channels: -1,
            output_channels: -1,
            mhz_per_channel: -1.0,
            foldings: -1,
            oversampling: -1.0,
            filter_name: [0; MAX_TEXT_STRING],
        }
    }
}

impl Marshall for Intrinsics {
    const LAYOUT: &'static Layout = &INTRINSICS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.interface_version);
        dst.put_slice(&self.name);
        dst.put_slice(&self.host);
        dst.put_slice(&self.code_version);
        self.beam_base.write_native(dst);
        dst.put_i32_ne(self.beam_id);
        dst.put_i32_ne(self.pol.code());
        self.channel_base.write_native(dst);
        dst.put_i32_ne(self.total_channels);
        dst.put_i32_ne(self.output_channels);
        dst.put_f64_ne(self.mhz_per_channel);
        dst.put_i32_ne(self.foldings);
        dst.put_f32_ne(self.oversampling);
        dst.put_slice(&self.filter_name);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            interface_version: get_array(src),
            name: get_array(src),
            host: get_array(src),
            code_version: get_array(src),
            beam_base: BaseAddr::read_native(src)?,
            beam_id: src.get_i32_ne(),
            pol: Polarization::try_from(src.get_i32_ne())?,
            channel_base: BaseAddr::read_native(src)?,
            total_channels: src.get_i32_ne(),
            output_channels: src.get_i32_ne(),
            mhz_per_channel: src.get_f64_ne(),
            foldings: src.get_i32_ne(),
            oversampling: src.get_f32_ne(),
            filter_name: get_array(src),
        })
    }
}

/// Current channelizer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub timestamp: NssDate,
    pub start_time: NssDate,
    pub center_sky_freq_mhz: f64,
    pub state: ChannelizerState,
    pub align_pad: i32,
}

pub const STATUS: Layout = Layout {
    name: "Status",
    size: 32,
    fields: &[
        Field::record("timestamp", 0, &NSS_DATE),
        Field::record("start_time", 8, &NSS_DATE),
        Field::scalar("center_sky_freq_mhz", 16, Scalar::F64),
        Field::enumerated("state", 24),
        Field::scalar("align_pad", 28, Scalar::I32),
    ],
};

impl Default for Status {
    fn default() -> Self {
        Self {
            timestamp: NssDate::default(),
            start_time: NssDate::default(),
            center_sky_freq_mhz: -1.0,
            state: ChannelizerState::Idle,
            align_pad: 0,
        }
    }
}

impl Marshall for Status {
    const LAYOUT: &'static Layout = &STATUS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.timestamp.write_native(dst);
        self.start_time.write_native(dst);
        dst.put_f64_ne(self.center_sky_freq_mhz);
        dst.put_i32_ne(self.state.code());
        dst.put_i32_ne(self.align_pad);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            timestamp: NssDate::read_native(src)?,
            start_time: NssDate::read_native(src)?,
            center_sky_freq_mhz: src.get_f64_ne(),
            state: ChannelizerState::try_from(src.get_i32_ne())?,
            align_pad: src.get_i32_ne(),
        })
    }
}

/// Request to start channelizing at a given time and sky frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Start {
    pub start_time: NssDate,
    pub center_sky_freq_mhz: f64,
}

pub const START: Layout = Layout {
    name: "Start",
    size: 16,
    fields: &[
        Field::record("start_time", 0, &NSS_DATE),
        Field::scalar("center_sky_freq_mhz", 8, Scalar::F64),
    ],
};

impl Default for Start {
    fn default() -> Self {
        Self {
            start_time: NssDate::default(),
            center_sky_freq_mhz: -1.0,
        }
    }
}

impl Marshall for Start {
    const LAYOUT: &'static Layout = &START;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.start_time.write_native(dst);
        dst.put_f64_ne(self.center_sky_freq_mhz);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            start_time: NssDate::read_native(src)?,
            center_sky_freq_mhz: src.get_f64_ne(),
        })
    }
}

/// Acknowledges a [`Start`] with the actual start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Started {
    pub start_time: NssDate,
}

pub const STARTED: Layout = Layout {
    name: "Started",
    size: 8,
    fields: &[Field::record("start_time", 0, &NSS_DATE)],
};

impl Marshall for Started {
    const LAYOUT: &'static Layout = &STARTED;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.start_time.write_native(dst);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            start_time: NssDate::read_native(src)?,
        })
    }
}

/// Packet counters for one input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetStatistics {
    pub total: u64,
    pub invalid: u64,
    pub wrong: u64,
    pub missed: u64,
    pub late: u64,
}

pub const NET_STATISTICS: Layout = Layout {
    name: "NetStatistics",
    size: 40,
    fields: &[
        Field::scalar("total", 0, Scalar::U64),
        Field::scalar("invalid", 8, Scalar::U64),
        Field::scalar("wrong", 16, Scalar::U64),
        Field::scalar("missed", 24, Scalar::U64),
        Field::scalar("late", 32, Scalar::U64),
    ],
};

impl Marshall for NetStatistics {
    const LAYOUT: &'static Layout = &NET_STATISTICS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_ne(self.total);
        dst.put_u64_ne(self.invalid);
        dst.put_u64_ne(self.wrong);
        dst.put_u64_ne(self.missed);
        dst.put_u64_ne(self.late);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            total: src.get_u64_ne(),
            invalid: src.get_u64_ne(),
            wrong: src.get_u64_ne(),
            missed: src.get_u64_ne(),
            late: src.get_u64_ne(),
        })
    }
}

/// Complex sample as a real/imaginary pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

pub const COMPLEX64: Layout = Layout {
    name: "Complex64",
    size: 16,
    fields: &[
        Field::scalar("re", 0, Scalar::F64),
        Field::scalar("im", 8, Scalar::F64),
    ],
};

impl Marshall for Complex64 {
    const LAYOUT: &'static Layout = &COMPLEX64;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f64_ne(self.re);
        dst.put_f64_ne(self.im);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            re: src.get_f64_ne(),
            im: src.get_f64_ne(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleStatistics {
    pub samples: u64,
    pub sum_sq: f64,
    pub min: Complex64,
    pub max: Complex64,
    pub sum: Complex64,
}

pub const SAMPLE_STATISTICS: Layout = Layout {
    name: "SampleStatistics",
    size: 64,
    fields: &[
        Field::scalar("samples", 0, Scalar::U64),
        Field::scalar("sum_sq", 8, Scalar::F64),
        Field::record("min", 16, &COMPLEX64),
        Field::record("max", 32, &COMPLEX64),
        Field::record("sum", 48, &COMPLEX64),
    ],
};

impl Marshall for SampleStatistics {
    const LAYOUT: &'static Layout = &SAMPLE_STATISTICS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_ne(self.samples);
        dst.put_f64_ne(self.sum_sq);
        self.min.write_native(dst);
        self.max.write_native(dst);
        self.sum.write_native(dst);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            samples: src.get_u64_ne(),
            sum_sq: src.get_f64_ne(),
            min: Complex64::read_native(src)?,
            max: Complex64::read_native(src)?,
            sum: Complex64::read_native(src)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeamStatistics {
    pub net_stats: NetStatistics,
    /// Input samples (beam).
    pub input_stats: SampleStatistics,
    /// Output samples (channels).
    pub output_stats: SampleStatistics,
}

pub const BEAM_STATISTICS: Layout = Layout {
    name: "BeamStatistics",
    size: 168,
    fields: &[
        Field::record("net_stats", 0, &NET_STATISTICS),
        Field::record("input_stats", 40, &SAMPLE_STATISTICS),
        Field::record("output_stats", 104, &SAMPLE_STATISTICS),
    ],
};

impl Marshall for BeamStatistics {
    const LAYOUT: &'static Layout = &BEAM_STATISTICS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.net_stats.write_native(dst);
        self.input_stats.write_native(dst);
        self.output_stats.write_native(dst);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            net_stats: NetStatistics::read_native(src)?,
            input_stats: SampleStatistics::read_native(src)?,
            output_stats: SampleStatistics::read_native(src)?,
        })
    }
}

/// Fixed head of a statistics report; `number_of_channels` per-channel
/// [`SampleStatistics`] records follow it in the same body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelizerStatisticsHeader {
    pub beam: BeamStatistics,
    pub channels: SampleStatistics,
    pub number_of_channels: i32,
    pub pad0: i32,
}

pub const CHANNELIZER_STATISTICS_HEADER: Layout = Layout {
    name: "ChannelizerStatisticsHeader",
    size: 240,
    fields: &[
        Field::record("beam", 0, &BEAM_STATISTICS),
        Field::record("channels", 168, &SAMPLE_STATISTICS),
        Field::scalar("number_of_channels", 232, Scalar::I32),
        Field::scalar("pad0", 236, Scalar::I32),
    ],
};

impl Marshall for ChannelizerStatisticsHeader {
    const LAYOUT: &'static Layout = &CHANNELIZER_STATISTICS_HEADER;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.beam.write_native(dst);
        self.channels.write_native(dst);
        dst.put_i32_ne(self.number_of_channels);
        dst.put_i32_ne(self.pad0);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            beam: BeamStatistics::read_native(src)?,
            channels: SampleStatistics::read_native(src)?,
            number_of_channels: src.get_i32_ne(),
            pad0: src.get_i32_ne(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrityError;
    use crate::marshall::{demarshall, marshall};

    #[test]
    fn idle_status_with_sentinel_frequency_round_trips() {
        let status = Status {
            state: ChannelizerState::Idle,
            center_sky_freq_mhz: -1.0,
            ..Status::default()
        };
        let wire = marshall(&status);
        assert_eq!(wire.len(), Status::WIRE_SIZE);
        assert_eq!(&wire[16..24], &(-1.0f64).to_be_bytes());
        assert_eq!(&wire[24..28], &[0, 0, 0, 0]);

        let back: Status = demarshall(&wire).unwrap();
        assert_eq!(back, status);
        assert_eq!(marshall(&back), wire);
    }

    #[test]
    fn out_of_range_state_is_an_integrity_error() {
        let mut wire = marshall(&Status::default()).to_vec();
        wire[24..28].copy_from_slice(&3i32.to_be_bytes());
        assert!(matches!(
            demarshall::<Status>(&wire),
            Err(IntegrityError::InvalidEnumerator {
                enumeration: "ChannelizerState",
                value: 3,
            })
        ));
    }

    #[test]
    fn intrinsics_text_fields_travel_verbatim() {
        let intrinsics = Intrinsics {
            name: text_field("chan1x"),
            beam_base: BaseAddr::new("227.1.1.1", 50000),
            pol: Polarization::XLinear,
            mhz_per_channel: 0.8192,
            ..Intrinsics::default()
        };
        let wire = marshall(&intrinsics);
        assert_eq!(wire.len(), 1832);
        assert!(wire.starts_with(b"SSE-CHAN Interface Version 1.0.3"));
        assert_eq!(&wire[256..262], b"chan1x");
        assert_eq!(&wire[1024..1033], b"227.1.1.1");
        assert_eq!(&wire[1280..1284], &50000i32.to_be_bytes());
        assert_eq!(&wire[1288..1292], &[0, 0, 0, 5]);

        let back: Intrinsics = demarshall(&wire).unwrap();
        assert_eq!(back, intrinsics);
        assert_eq!(back.beam_base.host(), "227.1.1.1");
    }

    #[test]
    fn beam_statistics_nesting_round_trips() {
        let stats = ChannelizerStatisticsHeader {
            beam: BeamStatistics {
                net_stats: NetStatistics {
                    total: 1 << 40,
                    late: 3,
                    ..NetStatistics::default()
                },
                input_stats: SampleStatistics {
                    samples: 4096,
                    sum_sq: 12.5,
                    min: Complex64 { re: -1.0, im: 0.5 },
                    ..SampleStatistics::default()
                },
                ..BeamStatistics::default()
            },
            number_of_channels: 128,
            ..ChannelizerStatisticsHeader::default()
        };
        let wire = marshall(&stats);
        assert_eq!(&wire[0..8], &(1u64 << 40).to_be_bytes());
        assert_eq!(&wire[232..236], &128i32.to_be_bytes());
        assert_eq!(demarshall::<ChannelizerStatisticsHeader>(&wire).unwrap(), stats);
    }

    #[test]
    fn start_and_started_carry_their_fields() {
        let start_time = NssDate {
            tv_sec: 1_263_431_000,
            tv_usec: 250_000,
        };
        let start = Start {
            start_time,
            center_sky_freq_mhz: 1420.0,
        };
        let wire = marshall(&start);
        assert_eq!(&wire[0..4], &1_263_431_000i32.to_be_bytes());
        assert_eq!(&wire[4..8], &250_000i32.to_be_bytes());
        assert_eq!(&wire[8..16], &1420.0f64.to_be_bytes());
        assert_eq!(demarshall::<Start>(&wire).unwrap(), start);

        let started = Started { start_time };
        let wire = marshall(&started);
        assert_eq!(wire.len(), 8);
        assert_eq!(&wire[4..8], &250_000i32.to_be_bytes());
        assert_eq!(demarshall::<Started>(&wire).unwrap(), started);
    }

    #[test]
    fn net_statistics_counters_are_big_endian_u64() {
        let stats = NetStatistics {
            total: 0x0102_0304_0506_0708,
            invalid: 1,
            wrong: 2,
            missed: 3,
            late: u64::MAX - 1,
        };
        let wire = marshall(&stats);
        assert_eq!(&wire[0..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&wire[8..16], &1u64.to_be_bytes());
        assert_eq!(&wire[24..32], &3u64.to_be_bytes());
        assert_eq!(&wire[32..40], &(u64::MAX - 1).to_be_bytes());
        assert_eq!(demarshall::<NetStatistics>(&wire).unwrap(), stats);
    }

    #[test]
    fn running_status_round_trips() {
        let status = Status {
            timestamp: NssDate {
                tv_sec: 100,
                tv_usec: 1,
            },
            start_time: NssDate {
                tv_sec: 110,
                tv_usec: 2,
            },
            center_sky_freq_mhz: 8400.125,
            state: ChannelizerState::Running,
            align_pad: 0,
        };
        let wire = marshall(&status);
        assert_eq!(&wire[8..12], &110i32.to_be_bytes());
        assert_eq!(&wire[16..24], &8400.125f64.to_be_bytes());
        assert_eq!(&wire[24..28], &[0, 0, 0, 2]);
        assert_eq!(demarshall::<Status>(&wire).unwrap(), status);
    }

    #[test]
    fn sample_statistics_complex_parts_land_in_order() {
        let stats = SampleStatistics {
            samples: 65_536,
            sum_sq: 2.5,
            min: Complex64 { re: -3.0, im: -4.0 },
            max: Complex64 { re: 3.0, im: 4.0 },
            sum: Complex64 { re: 0.125, im: -0.125 },
        };
        let wire = marshall(&stats);
        assert_eq!(&wire[0..8], &65_536u64.to_be_bytes());
        assert_eq!(&wire[24..32], &(-4.0f64).to_be_bytes());
        assert_eq!(&wire[32..40], &3.0f64.to_be_bytes());
        assert_eq!(&wire[56..64], &(-0.125f64).to_be_bytes());
        assert_eq!(demarshall::<SampleStatistics>(&wire).unwrap(), stats);
    }

    #[test]
    fn message_codes_start_at_channelizer_range() {
        assert_eq!(
            ChannelizerMessageCode::Uninit.code() as u32,
            crate::records::common::code_range::CHANNELIZER
        );
        assert_eq!(
            ChannelizerMessageCode::try_from(80_004u32),
            Ok(ChannelizerMessageCode::SendStatus)
        );
        assert!(ChannelizerMessageCode::try_from(u32::MAX).is_err());
    }
}
