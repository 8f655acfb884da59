use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::layout::{Field, Layout, Scalar};
use crate::marshall::Marshall;

/// Marks a Doppler factor that has not been computed.
pub const UNSET_FACTOR: f64 = -99_999.0;

/// Doppler correction applied when following a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DopplerParameters {
    pub f_ratio: f64,
    pub drift_offset_factor: f64,
    pub curv_main_factor: f64,
    pub curv_remote_factor: f64,
}

pub const DOPPLER_PARAMETERS: Layout = Layout {
    name: "DopplerParameters",
    size: 32,
    fields: &[
        Field::scalar("f_ratio", 0, Scalar::F64),
        Field::scalar("drift_offset_factor", 8, Scalar::F64),
        Field::scalar("curv_main_factor", 16, Scalar::F64),
        Field::scalar("curv_remote_factor", 24, Scalar::F64),
    ],
};

impl Default for DopplerParameters {
    fn default() -> Self {
        Self {
            f_ratio: UNSET_FACTOR,
            drift_offset_factor: UNSET_FACTOR,
            curv_main_factor: UNSET_FACTOR,
            curv_remote_factor: UNSET_FACTOR,
        }
    }
}

impl Marshall for DopplerParameters {
    const LAYOUT: &'static Layout = &DOPPLER_PARAMETERS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f64_ne(self.f_ratio);
        dst.put_f64_ne(self.drift_offset_factor);
        dst.put_f64_ne(self.curv_main_factor);
        dst.put_f64_ne(self.curv_remote_factor);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            f_ratio: src.get_f64_ne(),
            drift_offset_factor: src.get_f64_ne(),
            curv_main_factor: src.get_f64_ne(),
            curv_remote_factor: src.get_f64_ne(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshall::{demarshall, marshall};

    #[test]
    fn unset_factors_survive_the_wire() {
        let wire = marshall(&DopplerParameters::default());
        assert_eq!(&wire[..8], &UNSET_FACTOR.to_be_bytes());
        assert_eq!(demarshall::<DopplerParameters>(&wire).unwrap(), DopplerParameters::default());
    }

    #[test]
    fn field_order_is_preserved() {
        let params = DopplerParameters {
            f_ratio: 1.000_000_5,
            drift_offset_factor: 2.0,
            curv_main_factor: -3.5,
            curv_remote_factor: 0.0,
        };
        let wire = marshall(&params);
        assert_eq!(&wire[16..24], &(-3.5f64).to_be_bytes());
        assert_eq!(demarshall::<DopplerParameters>(&wire).unwrap(), params);
    }
}
