//! System controller <-> telescope array interface.

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::layout::{Field, Layout, Scalar};
use crate::marshall::{field_text, get_array, text_field, Marshall};
use crate::records::common::MAX_TEXT_STRING;

pub const INTERFACE_VERSION: &str = "$Revision: 1.45 $ $Date: 2009/04/08 21:40:23 $";

wire_enum! {
    pub enum TscopeMessageCode {
        Uninit = 50000 => "uninit",
        Allocate = 50001 => "allocate",
        Deallocate = 50002 => "deallocate",
        Monitor = 50003 => "monitor",
        PointSubarray = 50004 => "point-subarray",
        RequestIntrinsics = 50005 => "request-intrinsics",
        Reset = 50006 => "reset",
        Tune = 50007 => "tune",
        Shutdown = 50008 => "shutdown",
        RequestStatus = 50009 => "request-status",
        Stop = 50010 => "stop",
        Stow = 50011 => "stow",
        Wrap = 50012 => "wrap",
        Connect = 50013 => "connect",
        Disconnect = 50014 => "disconnect",
        Simulate = 50015 => "simulate",
        Unsimulate = 50016 => "unsimulate",
        Zfocus = 50017 => "zfocus",
        LnaOn = 50018 => "lna-on",
        PamSet = 50019 => "pam-set",
        RequestPointCheck = 50020 => "request-point-check",
        SendBackendCmd = 50021 => "send-backend-cmd",
        AntgroupAutoselect = 50022 => "antgroup-autoselect",
        BeginSendingCommandSequence = 50023 => "begin-sending-command-sequence",
        DoneSendingCommandSequence = 50024 => "done-sending-command-sequence",
        BfReset = 50025 => "bf-reset",
        BfInit = 50026 => "bf-init",
        BfAutoatten = 50027 => "bf-autoatten",
        BfSetAnts = 50028 => "bf-set-ants",
        BfClearAnts = 50029 => "bf-clear-ants",
        BfSetAttn = 50030 => "bf-set-attn",
        BfSetObslen = 50031 => "bf-set-obslen",
        BfSetCoords = 50032 => "bf-set-coords",
        BfClearCoords = 50033 => "bf-clear-coords",
        BfSetNullType = 50034 => "bf-set-null-type",
        BfAddNull = 50035 => "bf-add-null",
        BfClearNulls = 50036 => "bf-clear-nulls",
        BfCal = 50037 => "bf-cal",
        BfPoint = 50038 => "bf-point",
        BfStop = 50039 => "bf-stop",
        BfDest = 50040 => "bf-dest",
        Error = 50041 => "error",
        Message = 50042 => "message",
        Intrinsics = 50043 => "intrinsics",
        TrackingOn = 50044 => "tracking-on",
        TrackingOff = 50045 => "tracking-off",
        StatusMultibeam = 50046 => "status-multibeam",
        Ready = 50047 => "ready",
        End = 50048 => "end",
    }
}

wire_enum! {
    /// Coordinate system a [`TscopePointing`] is expressed in.
    pub enum CoordSys {
        Azel = 0 => "azel",
        J2000 = 1 => "j2000",
        Gal = 2 => "gal",
        Uninit = 3 => "uninit",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TscopeIntrinsics {
    pub interface_version: [u8; MAX_TEXT_STRING],
    pub name: [u8; MAX_TEXT_STRING],
}

pub const TSCOPE_INTRINSICS: Layout = Layout {
    name: "TscopeIntrinsics",
    size: 512,
    fields: &[
        Field::bytes("interface_version", 0, MAX_TEXT_STRING),
        Field::bytes("name", 256, MAX_TEXT_STRING),
    ],
};

impl TscopeIntrinsics {
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.name)
    }
}

impl Default for TscopeIntrinsics {
    fn default() -> Self {
        Self {
            interface_version: text_field(INTERFACE_VERSION),
            name: [0; MAX_TEXT_STRING],
        }
    }
}

impl Marshall for TscopeIntrinsics {
    const LAYOUT: &'static Layout = &TSCOPE_INTRINSICS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.interface_version);
        dst.put_slice(&self.name);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            interface_version: get_array(src),
            name: get_array(src),
        })
    }
}

/// A sky position. Only the pair matching `coord_sys` is meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TscopePointing {
    pub coord_sys: CoordSys,
    pub align_pad: i32,
    pub az_deg: f64,
    pub el_deg: f64,
    pub ra_hours: f64,
    pub dec_deg: f64,
    pub gal_long_deg: f64,
    pub gal_lat_deg: f64,
}

pub const TSCOPE_POINTING: Layout = Layout {
    name: "TscopePointing",
    size: 56,
    fields: &[
        Field::enumerated("coord_sys", 0),
        Field::scalar("align_pad", 4, Scalar::I32),
        Field::scalar("az_deg", 8, Scalar::F64),
        Field::scalar("el_deg", 16, Scalar::F64),
        Field::scalar("ra_hours", 24, Scalar::F64),
        Field::scalar("dec_deg", 32, Scalar::F64),
        Field::scalar("gal_long_deg", 40, Scalar::F64),
        Field::scalar("gal_lat_deg", 48, Scalar::F64),
    ],
};

impl TscopePointing {
    pub fn azel(az_deg: f64, el_deg: f64) -> Self {
        Self {
            coord_sys: CoordSys::Azel,
            az_deg,
            el_deg,
            ..Self::default()
        }
    }

    pub fn j2000(ra_hours: f64, dec_deg: f64) -> Self {
        Self {
            coord_sys: CoordSys::J2000,
            ra_hours,
            dec_deg,
            ..Self::default()
        }
    }
}

impl Default for TscopePointing {
    fn default() -> Self {
        Self {
            coord_sys: CoordSys::Uninit,
            align_pad: 0,
            az_deg: -1.0,
            el_deg: -1.0,
            ra_hours: -1.0,
            dec_deg: -1.0,
            gal_long_deg: -1.0,
            gal_lat_deg: -1.0,
        }
    }
}

impl Marshall for TscopePointing {
    const LAYOUT: &'static Layout = &TSCOPE_POINTING;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.coord_sys.code());
        dst.put_i32_ne(self.align_pad);
        dst.put_f64_ne(self.az_deg);
        dst.put_f64_ne(self.el_deg);
        dst.put_f64_ne(self.ra_hours);
        dst.put_f64_ne(self.dec_deg);
        dst.put_f64_ne(self.gal_long_deg);
        dst.put_f64_ne(self.gal_lat_deg);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            coord_sys: CoordSys::try_from(src.get_i32_ne())?,
            align_pad: src.get_i32_ne(),
            az_deg: src.get_f64_ne(),
            el_deg: src.get_f64_ne(),
            ra_hours: src.get_f64_ne(),
            dec_deg: src.get_f64_ne(),
            gal_long_deg: src.get_f64_ne(),
            gal_lat_deg: src.get_f64_ne(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrityError;
    use crate::marshall::{demarshall, marshall};
    use crate::records::common::code_range;

    #[test]
    fn pointing_round_trips_with_fields_at_their_offsets() {
        let pointing = TscopePointing {
            gal_long_deg: 184.557,
            gal_lat_deg: -5.784,
            ..TscopePointing::j2000(5.575_5, 22.014_5)
        };
        let wire = marshall(&pointing);
        assert_eq!(wire.len(), 56);
        assert_eq!(&wire[0..4], &[0, 0, 0, 1]);
        assert_eq!(&wire[8..16], &(-1.0f64).to_be_bytes());
        assert_eq!(&wire[24..32], &5.575_5f64.to_be_bytes());
        assert_eq!(&wire[32..40], &22.014_5f64.to_be_bytes());
        assert_eq!(&wire[48..56], &(-5.784f64).to_be_bytes());
        assert_eq!(demarshall::<TscopePointing>(&wire).unwrap(), pointing);
    }

    #[test]
    fn unknown_coordinate_system_is_rejected() {
        let mut wire = marshall(&TscopePointing::azel(180.0, 45.0)).to_vec();
        wire[0..4].copy_from_slice(&4i32.to_be_bytes());
        assert_eq!(
            demarshall::<TscopePointing>(&wire),
            Err(IntegrityError::InvalidEnumerator {
                enumeration: "CoordSys",
                value: 4,
            })
        );
    }

    #[test]
    fn intrinsics_round_trip() {
        let intrinsics = TscopeIntrinsics {
            name: text_field("ata-tscope"),
            ..TscopeIntrinsics::default()
        };
        let wire = marshall(&intrinsics);
        assert_eq!(&wire[0..11], b"$Revision: ");
        assert_eq!(&wire[256..266], b"ata-tscope");
        assert_eq!(wire[266], 0);
        let back: TscopeIntrinsics = demarshall(&wire).unwrap();
        assert_eq!(back.name(), "ata-tscope");
        assert_eq!(back, intrinsics);
    }

    #[test]
    fn message_codes_start_at_the_tscope_range() {
        assert_eq!(TscopeMessageCode::Uninit.code() as u32, code_range::TSCOPE);
        assert_eq!(
            TscopeMessageCode::try_from(50_043u32),
            Ok(TscopeMessageCode::Intrinsics)
        );
        assert_eq!(TscopeMessageCode::End.code(), 50_048);
    }
}
