//! System controller <-> detector (DX) interface.

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::layout::{Field, FieldKind, Layout, Scalar};
use crate::marshall::{field_text, get_array, text_field, Marshall};
use crate::records::common::{
    BoolT, IpAddress, NssDate, Polarization, SiteId, MAX_TEXT_STRING, NO_ACTIVITY_ID, NSS_DATE,
};

pub const INTERFACE_VERSION: &str = "SSE-DX Interface Version 1.130 2010-Jan-14  0:39:37 UTC";

/// Activities a detector can run at once.
pub const MAX_DX_ACTIVITIES: usize = 2;

wire_enum! {
    pub enum DxMessageCode {
        Uninit = 40000 => "uninit",
        RequestIntrinsics = 40001 => "request-intrinsics",
        SendIntrinsics = 40002 => "send-intrinsics",
        ConfigureDx = 40003 => "configure-dx",
        PermRfiMask = 40004 => "perm-rfi-mask",
        BirdieMask = 40005 => "birdie-mask",
        RcvrBirdieMask = 40006 => "rcvr-birdie-mask",
        RecentRfiMask = 40007 => "recent-rfi-mask",
        TestSignalMask = 40008 => "test-signal-mask",
        RequestDxStatus = 40009 => "request-dx-status",
        SendDxStatus = 40010 => "send-dx-status",
        SendDxActivityParameters = 40011 => "send-dx-activity-parameters",
        DxTuned = 40012 => "dx-tuned",
        DxScienceDataRequest = 40013 => "dx-science-data-request",
        StartTime = 40014 => "start-time",
        BaselineInitAccumStarted = 40015 => "baseline-init-accum-started",
        BaselineInitAccumComplete = 40016 => "baseline-init-accum-complete",
        DataCollectionStarted = 40017 => "data-collection-started",
        DataCollectionComplete = 40018 => "data-collection-complete",
        SignalDetectionStarted = 40019 => "signal-detection-started",
        SignalDetectionComplete = 40020 => "signal-detection-complete",
        BeginSendingCandidates = 40021 => "begin-sending-candidates",
        SendCandidateCwPowerSignal = 40022 => "send-candidate-cw-power-signal",
        SendCandidatePulseSignal = 40023 => "send-candidate-pulse-signal",
        DoneSendingCandidates = 40024 => "done-sending-candidates",
        BeginSendingSignals = 40025 => "begin-sending-signals",
        SendCwPowerSignal = 40026 => "send-cw-power-signal",
        SendPulseSignal = 40027 => "send-pulse-signal",
        DoneSendingSignals = 40028 => "done-sending-signals",
        BeginSendingCwCoherentSignals = 40029 => "begin-sending-cw-coherent-signals",
        SendCwCoherentSignal = 40030 => "send-cw-coherent-signal",
        DoneSendingCwCoherentSignals = 40031 => "done-sending-cw-coherent-signals",
        BeginSendingCandidateResults = 40032 => "begin-sending-candidate-results",
        SendCwCoherentCandidateResult = 40033 => "send-cw-coherent-candidate-result",
        SendPulseCandidateResult = 40034 => "send-pulse-candidate-result",
        DoneSendingCandidateResults = 40035 => "done-sending-candidate-results",
        BeginSendingFollowUpSignals = 40036 => "begin-sending-follow-up-signals",
        SendFollowUpCwSignal = 40037 => "send-follow-up-cw-signal",
        SendFollowUpPulseSignal = 40038 => "send-follow-up-pulse-signal",
        DoneSendingFollowUpSignals = 40039 => "done-sending-follow-up-signals",
        RequestArchiveData = 40040 => "request-archive-data",
        DiscardArchiveData = 40041 => "discard-archive-data",
        ArchiveSignal = 40042 => "archive-signal",
        BeginSendingArchiveComplexAmplitudes = 40043 => "begin-sending-archive-complex-amplitudes",
        SendArchiveComplexAmplitudes = 40044 => "send-archive-complex-amplitudes",
        DoneSendingArchiveComplexAmplitudes = 40045 => "done-sending-archive-complex-amplitudes",
        ArchiveComplete = 40046 => "archive-complete",
        SendDxMessage = 40047 => "send-dx-message",
        SendBaseline = 40048 => "send-baseline",
        SendComplexAmplitudes = 40049 => "send-complex-amplitudes",
        StopDxActivity = 40050 => "stop-dx-activity",
        ShutdownDx = 40051 => "shutdown-dx",
        RestartDx = 40052 => "restart-dx",
        DxActivityComplete = 40053 => "dx-activity-complete",
        SendBaselineStatistics = 40054 => "send-baseline-statistics",
        BaselineWarningLimitsExceeded = 40055 => "baseline-warning-limits-exceeded",
        BaselineErrorLimitsExceeded = 40056 => "baseline-error-limits-exceeded",
        BeginSendingBadBands = 40057 => "begin-sending-bad-bands",
        SendPulseBadBand = 40058 => "send-pulse-bad-band",
        SendCwBadBand = 40059 => "send-cw-bad-band",
        DoneSendingBadBands = 40060 => "done-sending-bad-bands",
        End = 40061 => "end",
    }
}

wire_enum! {
    pub enum SignalClass {
        Uninit = 0 => "uninit",
        Candidate = 1 => "cand",
        Rfi = 2 => "rfi",
        Test = 3 => "test",
        Unknown = 4 => "unknown",
    }
}

wire_enum! {
    /// Why a signal was given its [`SignalClass`].
    pub enum SignalClassReason {
        Uninit = 0 => "uninit",
        PassedPowerThresh = 1 => "passed-power-thresh",
        PassedCoherentDetect = 2 => "passed-coherent-detect",
        Confirm = 3 => "confirm",
        Reconfirm = 4 => "reconfirm",
        NotSeenOff = 5 => "not-seen-off",
        SecondaryFoundSignal = 6 => "secondary-found-signal",
        SeenGridWest = 7 => "seen-grid-west",
        NotSeenGridWest = 8 => "not-seen-grid-west",
        SeenGridSouth = 9 => "seen-grid-south",
        NotSeenGridSouth = 10 => "not-seen-grid-south",
        SeenGridOn = 11 => "seen-grid-on",
        NotSeenGridOn = 12 => "not-seen-grid-on",
        SeenGridNorth = 13 => "seen-grid-north",
        NotSeenGridNorth = 14 => "not-seen-grid-north",
        SeenGridEast = 15 => "seen-grid-east",
        NotSeenGridEast = 16 => "not-seen-grid-east",
        GridPrediction = 17 => "grid-prediction",
        ZeroDrift = 18 => "zero-drift",
        RecentRfiMatch = 19 => "recent-rfi-match",
        FailedCoherentDetect = 20 => "failed-coherent-detect",
        FailedPowerThresh = 21 => "failed-power-thresh",
        NoSignalFound = 22 => "no-signal-found",
        SnrTooHigh = 23 => "snr-too-high",
        SnrTooLow = 24 => "snr-too-low",
        DriftTooHigh = 25 => "drift-too-high",
        SeenOff = 26 => "seen-off",
        NoReconfirm = 27 => "no-reconfirm",
        SeenMultipleBeams = 28 => "seen-multiple-beams",
        FallsInBadBand = 29 => "falls-in-bad-band",
        FailedCoherentDetectGridWest = 30 => "failed-coherent-detect-grid-west",
        ZeroDriftGridWest = 31 => "zero-drift-grid-west",
        RecentRfiMatchGridWest = 32 => "recent-rfi-match-grid-west",
        FailedCoherentDetectGridSouth = 33 => "failed-coherent-detect-grid-south",
        ZeroDriftGridSouth = 34 => "zero-drift-grid-south",
        RecentRfiMatchGridSouth = 35 => "recent-rfi-match-grid-south",
        FailedCoherentDetectGridOn = 36 => "failed-coherent-detect-grid-on",
        ZeroDriftGridOn = 37 => "zero-drift-grid-on",
        RecentRfiMatchGridOn = 38 => "recent-rfi-match-grid-on",
        FailedCoherentDetectGridNorth = 39 => "failed-coherent-detect-grid-north",
        ZeroDriftGridNorth = 40 => "zero-drift-grid-north",
        RecentRfiMatchGridNorth = 41 => "recent-rfi-match-grid-north",
        FailedCoherentDetectGridEast = 42 => "failed-coherent-detect-grid-east",
        ZeroDriftGridEast = 43 => "zero-drift-grid-east",
        RecentRfiMatchGridEast = 44 => "recent-rfi-match-grid-east",
        TestSignalMatch = 45 => "test-signal-match",
        TooManyCandidates = 46 => "too-many-candidates",
        BirdieScan = 47 => "birdie-scan",
        RfiScan = 48 => "rfi-scan",
        SecondaryNoSignalFound = 49 => "secondary-no-signal-found",
        End = 50 => "end",
    }
}

wire_enum! {
    pub enum DxActivityState {
        None = 0 => "none",
        Init = 1 => "init",
        Tuned = 2 => "tuned",
        PendBaseAccum = 3 => "pend-base-accum",
        RunBaseAccum = 4 => "run-base-accum",
        BaseAccumComplete = 5 => "base-accum-complete",
        PendDc = 6 => "pend-dc",
        RunDc = 7 => "run-dc",
        DcComplete = 8 => "dc-complete",
        PendSd = 9 => "pend-sd",
        RunSd = 10 => "run-sd",
        SdComplete = 11 => "sd-complete",
        Complete = 12 => "complete",
        Stopping = 13 => "stopping",
        Stopped = 14 => "stopped",
        Error = 15 => "error",
    }
}

/// First message a detector sends after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HereIAm {
    pub interface_version: [u8; MAX_TEXT_STRING],
}

pub const HERE_I_AM: Layout = Layout {
    name: "HereIAm",
    size: 256,
    fields: &[Field::bytes("interface_version", 0, MAX_TEXT_STRING)],
};

impl HereIAm {
    pub fn version(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.interface_version)
    }
}

impl Default for HereIAm {
    fn default() -> Self {
        Self {
            interface_version: text_field(INTERFACE_VERSION),
        }
    }
}

impl Marshall for HereIAm {
    const LAYOUT: &'static Layout = &HERE_I_AM;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.interface_version);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            interface_version: get_array(src),
        })
    }
}

/// Tells a detector where the controller listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThereYouAre {
    pub sse_ip: IpAddress,
    pub port_id: i32,
    pub interface_version: [u8; MAX_TEXT_STRING],
}

pub const THERE_YOU_ARE: Layout = Layout {
    name: "ThereYouAre",
    size: 516,
    fields: &[
        Field::bytes("sse_ip", 0, MAX_TEXT_STRING),
        Field::scalar("port_id", 256, Scalar::I32),
        Field::bytes("interface_version", 260, MAX_TEXT_STRING),
    ],
};

impl Default for ThereYouAre {
    fn default() -> Self {
        Self {
            sse_ip: [0; MAX_TEXT_STRING],
            port_id: -1,
            interface_version: text_field(INTERFACE_VERSION),
        }
    }
}

impl Marshall for ThereYouAre {
    const LAYOUT: &'static Layout = &THERE_YOU_ARE;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.sse_ip);
        dst.put_i32_ne(self.port_id);
        dst.put_slice(&self.interface_version);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            sse_ip: get_array(src),
            port_id: src.get_i32_ne(),
            interface_version: get_array(src),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DxConfiguration {
    pub site: SiteId,
    /// Logical detector id.
    pub dx_id: i32,
    /// MHz.
    pub a2d_clockrate: f64,
    pub archiver_hostname: [u8; MAX_TEXT_STRING],
    pub archiver_port: i32,
    pub align_pad: i32,
}

pub const DX_CONFIGURATION: Layout = Layout {
    name: "DxConfiguration",
    size: 280,
    fields: &[
        Field::enumerated("site", 0),
        Field::scalar("dx_id", 4, Scalar::I32),
        Field::scalar("a2d_clockrate", 8, Scalar::F64),
        Field::bytes("archiver_hostname", 16, MAX_TEXT_STRING),
        Field::scalar("archiver_port", 272, Scalar::I32),
        Field::scalar("align_pad", 276, Scalar::I32),
    ],
};

impl Default for DxConfiguration {
    fn default() -> Self {
        Self {
            site: SiteId::Uninit,
            dx_id: -1,
            a2d_clockrate: -1.0,
            archiver_hostname: [0; MAX_TEXT_STRING],
            archiver_port: -1,
            align_pad: 0,
        }
    }
}

impl Marshall for DxConfiguration {
    const LAYOUT: &'static Layout = &DX_CONFIGURATION;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.site.code());
        dst.put_i32_ne(self.dx_id);
        dst.put_f64_ne(self.a2d_clockrate);
        dst.put_slice(&self.archiver_hostname);
        dst.put_i32_ne(self.archiver_port);
        dst.put_i32_ne(self.align_pad);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            site: SiteId::try_from(src.get_i32_ne())?,
            dx_id: src.get_i32_ne(),
            a2d_clockrate: src.get_f64_ne(),
            archiver_hostname: get_array(src),
            archiver_port: src.get_i32_ne(),
            align_pad: src.get_i32_ne(),
        })
    }
}

/// A band of sky frequencies, in MHz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub center_freq: f64,
    pub bandwidth: f32,
    pub align_pad: i32,
}

pub const FREQUENCY_BAND: Layout = Layout {
    name: "FrequencyBand",
    size: 16,
    fields: &[
        Field::scalar("center_freq", 0, Scalar::F64),
        Field::scalar("bandwidth", 8, Scalar::F32),
        Field::scalar("align_pad", 12, Scalar::I32),
    ],
};

impl Default for FrequencyBand {
    fn default() -> Self {
        Self {
            center_freq: -1.0,
            bandwidth: -1.0,
            align_pad: 0,
        }
    }
}

impl Marshall for FrequencyBand {
    const LAYOUT: &'static Layout = &FREQUENCY_BAND;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f64_ne(self.center_freq);
        dst.put_f32_ne(self.bandwidth);
        dst.put_i32_ne(self.align_pad);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            center_freq: src.get_f64_ne(),
            bandwidth: src.get_f32_ne(),
            align_pad: src.get_i32_ne(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DxTuned {
    /// Sky frequency of the band center, MHz.
    pub dx_sky_freq: f64,
    /// Seconds.
    pub data_collection_length: i32,
    pub data_collection_frames: i32,
}

pub const DX_TUNED: Layout = Layout {
    name: "DxTuned",
    size: 16,
    fields: &[
        Field::scalar("dx_sky_freq", 0, Scalar::F64),
        Field::scalar("data_collection_length", 8, Scalar::I32),
        Field::scalar("data_collection_frames", 12, Scalar::I32),
    ],
};

impl Default for DxTuned {
    fn default() -> Self {
        Self {
            dx_sky_freq: -1.0,
            data_collection_length: -1,
            data_collection_frames: -1,
        }
    }
}

impl Marshall for DxTuned {
    const LAYOUT: &'static Layout = &DX_TUNED;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f64_ne(self.dx_sky_freq);
        dst.put_i32_ne(self.data_collection_length);
        dst.put_i32_ne(self.data_collection_frames);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            dx_sky_freq: src.get_f64_ne(),
            data_collection_length: src.get_i32_ne(),
            data_collection_frames: src.get_i32_ne(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartActivity {
    pub start_time: NssDate,
}

pub const START_ACTIVITY: Layout = Layout {
    name: "StartActivity",
    size: 8,
    fields: &[Field::record("start_time", 0, &NSS_DATE)],
};

impl Marshall for StartActivity {
    const LAYOUT: &'static Layout = &START_ACTIVITY;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.start_time.write_native(dst);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            start_time: NssDate::read_native(src)?,
        })
    }
}

/// Identifies one detected signal; unique across observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalId {
    pub dx_number: i32,
    pub activity_id: i32,
    pub activity_start_time: NssDate,
    /// Per-activity counter starting at zero.
    pub number: i32,
    pub align_pad: i32,
}

pub const SIGNAL_ID: Layout = Layout {
    name: "SignalId",
    size: 24,
    fields: &[
        Field::scalar("dx_number", 0, Scalar::I32),
        Field::scalar("activity_id", 4, Scalar::I32),
        Field::record("activity_start_time", 8, &NSS_DATE),
        Field::scalar("number", 16, Scalar::I32),
        Field::scalar("align_pad", 20, Scalar::I32),
    ],
};

impl Default for SignalId {
    fn default() -> Self {
        Self {
            dx_number: -1,
            activity_id: NO_ACTIVITY_ID,
            activity_start_time: NssDate::default(),
            number: -1,
            align_pad: 0,
        }
    }
}

impl Marshall for SignalId {
    const LAYOUT: &'static Layout = &SIGNAL_ID;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.dx_number);
        dst.put_i32_ne(self.activity_id);
        self.activity_start_time.write_native(dst);
        dst.put_i32_ne(self.number);
        dst.put_i32_ne(self.align_pad);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            dx_number: src.get_i32_ne(),
            activity_id: src.get_i32_ne(),
            activity_start_time: NssDate::read_native(src)?,
            number: src.get_i32_ne(),
            align_pad: src.get_i32_ne(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPath {
    /// MHz.
    pub rf_freq: f64,
    /// Hz/s.
    pub drift: f32,
    /// Hz.
    pub width: f32,
    pub power: f32,
    pub align_pad: i32,
}

pub const SIGNAL_PATH: Layout = Layout {
    name: "SignalPath",
    size: 24,
    fields: &[
        Field::scalar("rf_freq", 0, Scalar::F64),
        Field::scalar("drift", 8, Scalar::F32),
        Field::scalar("width", 12, Scalar::F32),
        Field::scalar("power", 16, Scalar::F32),
        Field::scalar("align_pad", 20, Scalar::I32),
    ],
};

impl Default for SignalPath {
    fn default() -> Self {
        Self {
            rf_freq: -1.0,
            drift: -1.0,
            width: -1.0,
            power: -1.0,
            align_pad: 0,
        }
    }
}

impl Marshall for SignalPath {
    const LAYOUT: &'static Layout = &SIGNAL_PATH;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f64_ne(self.rf_freq);
        dst.put_f32_ne(self.drift);
        dst.put_f32_ne(self.width);
        dst.put_f32_ne(self.power);
        dst.put_i32_ne(self.align_pad);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            rf_freq: src.get_f64_ne(),
            drift: src.get_f32_ne(),
            width: src.get_f32_ne(),
            power: src.get_f32_ne(),
            align_pad: src.get_i32_ne(),
        })
    }
}

/// Everything known about a detected signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalDescription {
    pub path: SignalPath,
    pub pol: Polarization,
    pub sig_class: SignalClass,
    pub reason: SignalClassReason,
    /// Subchannel containing the signal.
    pub subchannel_number: i32,
    pub contains_bad_bands: BoolT,
    pub signal_id: SignalId,
    /// Id of the signal this one follows up, if any.
    pub orig_signal_id: SignalId,
    pub align_pad: i32,
}

pub const SIGNAL_DESCRIPTION: Layout = Layout {
    name: "SignalDescription",
    size: 96,
    fields: &[
        Field::record("path", 0, &SIGNAL_PATH),
        Field::enumerated("pol", 24),
        Field::enumerated("sig_class", 28),
        Field::enumerated("reason", 32),
        Field::scalar("subchannel_number", 36, Scalar::I32),
        Field::enumerated("contains_bad_bands", 40),
        Field::record("signal_id", 44, &SIGNAL_ID),
        Field::record("orig_signal_id", 68, &SIGNAL_ID),
        Field::scalar("align_pad", 92, Scalar::I32),
    ],
};

impl Default for SignalDescription {
    fn default() -> Self {
        Self {
            path: SignalPath::default(),
            pol: Polarization::Uninit,
            sig_class: SignalClass::Uninit,
            reason: SignalClassReason::Uninit,
            subchannel_number: -1,
            contains_bad_bands: BoolT::False,
            signal_id: SignalId::default(),
            orig_signal_id: SignalId::default(),
            align_pad: 0,
        }
    }
}

impl Marshall for SignalDescription {
    const LAYOUT: &'static Layout = &SIGNAL_DESCRIPTION;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.path.write_native(dst);
        dst.put_i32_ne(self.pol.code());
        dst.put_i32_ne(self.sig_class.code());
        dst.put_i32_ne(self.reason.code());
        dst.put_i32_ne(self.subchannel_number);
        dst.put_i32_ne(self.contains_bad_bands.code());
        self.signal_id.write_native(dst);
        self.orig_signal_id.write_native(dst);
        dst.put_i32_ne(self.align_pad);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            path: SignalPath::read_native(src)?,
            pol: Polarization::try_from(src.get_i32_ne())?,
            sig_class: SignalClass::try_from(src.get_i32_ne())?,
            reason: SignalClassReason::try_from(src.get_i32_ne())?,
            subchannel_number: src.get_i32_ne(),
            contains_bad_bands: BoolT::try_from(src.get_i32_ne())?,
            signal_id: SignalId::read_native(src)?,
            orig_signal_id: SignalId::read_native(src)?,
            align_pad: src.get_i32_ne(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmationStats {
    /// Probability of false alarm (e to the -x).
    pub pfa: f32,
    /// SNR in a 1 Hz channel.
    pub snr: f32,
}

pub const CONFIRMATION_STATS: Layout = Layout {
    name: "ConfirmationStats",
    size: 8,
    fields: &[
        Field::scalar("pfa", 0, Scalar::F32),
        Field::scalar("snr", 4, Scalar::F32),
    ],
};

impl Default for ConfirmationStats {
    fn default() -> Self {
        Self {
            pfa: -1.0,
            snr: -1.0,
        }
    }
}

impl Marshall for ConfirmationStats {
    const LAYOUT: &'static Layout = &CONFIRMATION_STATS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f32_ne(self.pfa);
        dst.put_f32_ne(self.snr);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            pfa: src.get_f32_ne(),
            snr: src.get_f32_ne(),
        })
    }
}

/// Asks a detector for the archived data of one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveRequest {
    pub signal_id: SignalId,
}

pub const ARCHIVE_REQUEST: Layout = Layout {
    name: "ArchiveRequest",
    size: 24,
    fields: &[Field::record("signal_id", 0, &SIGNAL_ID)],
};

impl Marshall for ArchiveRequest {
    const LAYOUT: &'static Layout = &ARCHIVE_REQUEST;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.signal_id.write_native(dst);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            signal_id: SignalId::read_native(src)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DxActivityStatus {
    pub activity_id: i32,
    pub current_state: DxActivityState,
}

pub const DX_ACTIVITY_STATUS: Layout = Layout {
    name: "DxActivityStatus",
    size: 8,
    fields: &[
        Field::scalar("activity_id", 0, Scalar::I32),
        Field::enumerated("current_state", 4),
    ],
};

impl Default for DxActivityStatus {
    fn default() -> Self {
        Self {
            activity_id: NO_ACTIVITY_ID,
            current_state: DxActivityState::None,
        }
    }
}

impl Marshall for DxActivityStatus {
    const LAYOUT: &'static Layout = &DX_ACTIVITY_STATUS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.activity_id);
        dst.put_i32_ne(self.current_state.code());
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            activity_id: src.get_i32_ne(),
            current_state: DxActivityState::try_from(src.get_i32_ne())?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DxStatus {
    pub timestamp: NssDate,
    pub number_of_activities: i32,
    pub align_pad: i32,
    pub act: [DxActivityStatus; MAX_DX_ACTIVITIES],
}

pub const DX_STATUS: Layout = Layout {
    name: "DxStatus",
    size: 32,
    fields: &[
        Field::record("timestamp", 0, &NSS_DATE),
        Field::scalar("number_of_activities", 8, Scalar::I32),
        Field::scalar("align_pad", 12, Scalar::I32),
        Field::array(
            "act",
            16,
            FieldKind::Record(&DX_ACTIVITY_STATUS),
            MAX_DX_ACTIVITIES,
        ),
    ],
};

impl Marshall for DxStatus {
    const LAYOUT: &'static Layout = &DX_STATUS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        self.timestamp.write_native(dst);
        dst.put_i32_ne(self.number_of_activities);
        dst.put_i32_ne(self.align_pad);
        for act in &self.act {
            act.write_native(dst);
        }
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        let timestamp = NssDate::read_native(src)?;
        let number_of_activities = src.get_i32_ne();
        let align_pad = src.get_i32_ne();
        let mut act = [DxActivityStatus::default(); MAX_DX_ACTIVITIES];
        for slot in &mut act {
            *slot = DxActivityStatus::read_native(src)?;
        }
        Ok(Self {
            timestamp,
            number_of_activities,
            align_pad,
            act,
        })
    }
}

/// Number of records in a following batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Count {
    pub count: i32,
}

pub const COUNT: Layout = Layout {
    name: "Count",
    size: 4,
    fields: &[Field::scalar("count", 0, Scalar::I32)],
};

impl Marshall for Count {
    const LAYOUT: &'static Layout = &COUNT;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.count);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            count: src.get_i32_ne(),
        })
    }
}

/// Resolutions a detector can process, 1 Hz to 1 kHz.
pub const MAX_RESOLUTIONS: usize = 11;

wire_enum! {
    pub enum Resolution {
        Res1Hz = 0 => "1hz",
        Res2Hz = 1 => "2hz",
        Res4Hz = 2 => "4hz",
        Res8Hz = 3 => "8hz",
        Res16Hz = 4 => "16hz",
        Res32Hz = 5 => "32hz",
        Res64Hz = 6 => "64hz",
        Res128Hz = 7 => "128hz",
        Res256Hz = 8 => "256hz",
        Res512Hz = 9 => "512hz",
        Res1KHz = 10 => "1khz",
        Uninit = 11 => "uninit",
    }
}

wire_enum! {
    /// How complex amplitudes are requested.
    pub enum SciDataRequestType {
        Freq = 0 => "freq",
        Subchannel = 1 => "subchannel",
    }
}

wire_enum! {
    /// Bit positions in [`DxActivityParameters::operations`].
    pub enum DxOperation {
        DataCollection = 0 => "data-collection",
        Baselining = 1 => "baselining",
        FreqInversion = 2 => "freq-inversion",
        PulseDetection = 3 => "pulse-detection",
        PowerCwd = 4 => "power-cwd",
        CoherentCwd = 5 => "coherent-cwd",
        ApplyBirdieMask = 6 => "apply-birdie-mask",
        ApplyRcvrBirdieMask = 7 => "apply-rcvr-birdie-mask",
        ApplyPermanentRfiMask = 8 => "apply-permanent-rfi-mask",
        ApplyRecentRfiMask = 9 => "apply-recent-rfi-mask",
        ApplyTestSignalMask = 10 => "apply-test-signal-mask",
        ApplyDoppler = 11 => "apply-doppler",
        RejectZeroDriftSignals = 12 => "reject-zero-drift-signals",
        CandidateSelection = 13 => "candidate-selection",
        ProcessSecondaryCandidates = 14 => "process-secondary-candidates",
        FollowUpCandidates = 15 => "follow-up-candidates",
        SendRawSignalDetectionProducts = 16 => "send-raw-signal-detection-products",
    }
}

impl DxOperation {
    pub const fn bit(self) -> u32 {
        1u32 << self.code()
    }
}

/// Multicast base address a detector reads channel packets from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DxBaseAddr {
    pub addr: IpAddress,
    pub port: i32,
}

pub const DX_BASE_ADDR: Layout = Layout {
    name: "DxBaseAddr",
    size: 260,
    fields: &[
        Field::bytes("addr", 0, MAX_TEXT_STRING),
        Field::scalar("port", 256, Scalar::I32),
    ],
};

impl DxBaseAddr {
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

impl Default for DxBaseAddr {
    fn default() -> Self {
        Self::new("", -1)
    }
}

impl Marshall for DxBaseAddr {
    const LAYOUT: &'static Layout = &DX_BASE_ADDR;

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

/// Fixed capabilities a detector reports when asked.
#[derive(Debug, Clone, PartialEq)]
pub struct DxIntrinsics {
    pub interface_version: [u8; MAX_TEXT_STRING],
    pub name: [u8; MAX_TEXT_STRING],
    pub host: [u8; MAX_TEXT_STRING],
    pub code_version: [u8; MAX_TEXT_STRING],
    pub channel_base: DxBaseAddr,
    /// Filter bank foldings.
    pub foldings: i32,
    /// Percentage overlap.
    pub oversampling: f32,
    pub filter_name: [u8; MAX_TEXT_STRING],
    /// Zero on the wire; keeps `hz_per_subchannel` 8-aligned.
    pub align_pad: i32,
    /// Usable subchannel width.
    pub hz_per_subchannel: f64,
    pub max_subchannels: i32,
    pub serial_number: i32,
    pub birdie_mask_date: NssDate,
    pub rcvr_birdie_mask_date: NssDate,
    pub perm_mask_date: NssDate,
}

pub const DX_INTRINSICS: Layout = Layout {
    name: "DxIntrinsics",
    size: 1592,
    fields: &[
        Field::bytes("interface_version", 0, MAX_TEXT_STRING),
        Field::bytes("name", 256, MAX_TEXT_STRING),
        Field::bytes("host", 512, MAX_TEXT_STRING),
        Field::bytes("code_version", 768, MAX_TEXT_STRING),
        Field::record("channel_base", 1024, &DX_BASE_ADDR),
        Field::scalar("foldings", 1284, Scalar::I32),
        Field::scalar("oversampling", 1288, Scalar::F32),
        Field::bytes("filter_name", 1292, MAX_TEXT_STRING),
        Field::scalar("align_pad", 1548, Scalar::I32),
        Field::scalar("hz_per_subchannel", 1552, Scalar::F64),
        Field::scalar("max_subchannels", 1560, Scalar::I32),
        Field::scalar("serial_number", 1564, Scalar::I32),
        Field::record("birdie_mask_date", 1568, &NSS_DATE),
        Field::record("rcvr_birdie_mask_date", 1576, &NSS_DATE),
        Field::record("perm_mask_date", 1584, &NSS_DATE),
    ],
};

impl DxIntrinsics {
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.name)
    }

    pub fn host(&self) -> std::borrow::Cow<'_, str> {
        field_text(&self.host)
    }
}

impl Default for DxIntrinsics {
    fn default() -> Self {
        Self {
            interface_version: text_field(INTERFACE_VERSION),
            name: [0; MAX_TEXT_STRING],
            host: [0; MAX_TEXT_STRING],
            code_version: [0; MAX_TEXT_STRING],
            channel_base: DxBaseAddr::default(),
            foldings: -1,
            oversampling: -1.0,
            filter_name: [0; MAX_TEXT_STRING],
            align_pad: 0,
            hz_per_subchannel: -1.0,
            max_subchannels: -1,
            serial_number: -1,
            birdie_mask_date: NssDate::default(),
            rcvr_birdie_mask_date: NssDate::default(),
            perm_mask_date: NssDate::default(),
        }
    }
}

impl Marshall for DxIntrinsics {
    const LAYOUT: &'static Layout = &DX_INTRINSICS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.interface_version);
        dst.put_slice(&self.name);
        dst.put_slice(&self.host);
        dst.put_slice(&self.code_version);
        self.channel_base.write_native(dst);
        dst.put_i32_ne(self.foldings);
        dst.put_f32_ne(self.oversampling);
        dst.put_slice(&self.filter_name);
        dst.put_i32_ne(self.align_pad);
        dst.put_f64_ne(self.hz_per_subchannel);
        dst.put_i32_ne(self.max_subchannels);
        dst.put_i32_ne(self.serial_number);
        self.birdie_mask_date.write_native(dst);
        self.rcvr_birdie_mask_date.write_native(dst);
        self.perm_mask_date.write_native(dst);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            interface_version: get_array(src),
            name: get_array(src),
            host: get_array(src),
            code_version: get_array(src),
            channel_base: DxBaseAddr::read_native(src)?,
            foldings: src.get_i32_ne(),
            oversampling: src.get_f32_ne(),
            filter_name: get_array(src),
            align_pad: src.get_i32_ne(),
            hz_per_subchannel: src.get_f64_ne(),
            max_subchannels: src.get_i32_ne(),
            serial_number: src.get_i32_ne(),
            birdie_mask_date: NssDate::read_native(src)?,
            rcvr_birdie_mask_date: NssDate::read_native(src)?,
            perm_mask_date: NssDate::read_native(src)?,
        })
    }
}

/// Pulse detection thresholds for one resolution, in sigma.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PulseParameters {
    pub pulse_threshold: f64,
    pub triplet_threshold: f64,
    pub singlet_threshold: f64,
}

pub const PULSE_PARAMETERS: Layout = Layout {
    name: "PulseParameters",
    size: 24,
    fields: &[
        Field::scalar("pulse_threshold", 0, Scalar::F64),
        Field::scalar("triplet_threshold", 8, Scalar::F64),
        Field::scalar("singlet_threshold", 16, Scalar::F64),
    ],
};

impl Marshall for PulseParameters {
    const LAYOUT: &'static Layout = &PULSE_PARAMETERS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f64_ne(self.pulse_threshold);
        dst.put_f64_ne(self.triplet_threshold);
        dst.put_f64_ne(self.singlet_threshold);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            pulse_threshold: src.get_f64_ne(),
            triplet_threshold: src.get_f64_ne(),
            singlet_threshold: src.get_f64_ne(),
        })
    }
}

/// Which science products a detector streams back during an activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DxScienceDataRequest {
    pub send_baselines: BoolT,
    pub send_baseline_statistics: BoolT,
    pub check_baseline_warning_limits: BoolT,
    pub check_baseline_error_limits: BoolT,
    /// Half frames between baseline reports.
    pub baseline_reporting_half_frames: i32,
    pub send_complex_amplitudes: BoolT,
    pub request_type: SciDataRequestType,
    pub subchannel: i32,
    /// MHz; selects the subchannel when `request_type` is `Freq`.
    pub rf_freq: f64,
}

pub const DX_SCIENCE_DATA_REQUEST: Layout = Layout {
    name: "DxScienceDataRequest",
    size: 40,
    fields: &[
        Field::enumerated("send_baselines", 0),
        Field::enumerated("send_baseline_statistics", 4),
        Field::enumerated("check_baseline_warning_limits", 8),
        Field::enumerated("check_baseline_error_limits", 12),
        Field::scalar("baseline_reporting_half_frames", 16, Scalar::I32),
        Field::enumerated("send_complex_amplitudes", 20),
        Field::enumerated("request_type", 24),
        Field::scalar("subchannel", 28, Scalar::I32),
        Field::scalar("rf_freq", 32, Scalar::F64),
    ],
};

impl Default for DxScienceDataRequest {
    fn default() -> Self {
        Self {
            send_baselines: BoolT::False,
            send_baseline_statistics: BoolT::False,
            check_baseline_warning_limits: BoolT::False,
            check_baseline_error_limits: BoolT::False,
            baseline_reporting_half_frames: 0,
            send_complex_amplitudes: BoolT::False,
            request_type: SciDataRequestType::Freq,
            subchannel: 0,
            rf_freq: 0.0,
        }
    }
}

impl Marshall for DxScienceDataRequest {
    const LAYOUT: &'static Layout = &DX_SCIENCE_DATA_REQUEST;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.send_baselines.code());
        dst.put_i32_ne(self.send_baseline_statistics.code());
        dst.put_i32_ne(self.check_baseline_warning_limits.code());
        dst.put_i32_ne(self.check_baseline_error_limits.code());
        dst.put_i32_ne(self.baseline_reporting_half_frames);
        dst.put_i32_ne(self.send_complex_amplitudes.code());
        dst.put_i32_ne(self.request_type.code());
        dst.put_i32_ne(self.subchannel);
        dst.put_f64_ne(self.rf_freq);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            send_baselines: BoolT::try_from(src.get_i32_ne())?,
            send_baseline_statistics: BoolT::try_from(src.get_i32_ne())?,
            check_baseline_warning_limits: BoolT::try_from(src.get_i32_ne())?,
            check_baseline_error_limits: BoolT::try_from(src.get_i32_ne())?,
            baseline_reporting_half_frames: src.get_i32_ne(),
            send_complex_amplitudes: BoolT::try_from(src.get_i32_ne())?,
            request_type: SciDataRequestType::try_from(src.get_i32_ne())?,
            subchannel: src.get_i32_ne(),
            rf_freq: src.get_f64_ne(),
        })
    }
}

/// Bounds outside which baseline statistics raise a warning or an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaselineLimits {
    pub mean_upper_bound: f32,
    pub mean_lower_bound: f32,
    pub std_dev_percent: f32,
    pub max_range: f32,
}

pub const BASELINE_LIMITS: Layout = Layout {
    name: "BaselineLimits",
    size: 16,
    fields: &[
        Field::scalar("mean_upper_bound", 0, Scalar::F32),
        Field::scalar("mean_lower_bound", 4, Scalar::F32),
        Field::scalar("std_dev_percent", 8, Scalar::F32),
        Field::scalar("max_range", 12, Scalar::F32),
    ],
};

impl Marshall for BaselineLimits {
    const LAYOUT: &'static Layout = &BASELINE_LIMITS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_f32_ne(self.mean_upper_bound);
        dst.put_f32_ne(self.mean_lower_bound);
        dst.put_f32_ne(self.std_dev_percent);
        dst.put_f32_ne(self.max_range);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            mean_upper_bound: src.get_f32_ne(),
            mean_lower_bound: src.get_f32_ne(),
            std_dev_percent: src.get_f32_ne(),
            max_range: src.get_f32_ne(),
        })
    }
}

/// Everything a detector needs to run one activity.
///
/// Frequencies are sky frequencies in MHz; tolerances are Hz or Hz/s;
/// thresholds are sigma. Limits prefixed `bad_band` are per kHz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DxActivityParameters {
    pub activity_id: i32,
    /// Seconds.
    pub data_collection_length: i32,
    pub rcvr_sky_freq: f64,
    pub ifc_sky_freq: f64,
    pub dx_sky_freq: f64,
    pub channel_number: i32,
    /// [`DxOperation`] bits.
    pub operations: u32,
    /// Main/remote relative sensitivity.
    pub sensitivity_ratio: f32,
    pub max_number_of_candidates: i32,
    pub clustering_freq_tolerance: f32,
    pub zero_drift_tolerance: f32,
    pub max_drift_rate_tolerance: f32,
    pub align_pad1: f32,

    pub bad_band_cw_path_limit: f64,
    /// Bins.
    pub cw_clustering_delta_freq: i32,
    pub dadd_resolution: Resolution,
    pub dadd_threshold: f64,
    pub cw_coherent_threshold: f64,
    pub secondary_cw_coherent_threshold: f64,
    pub secondary_pfa_margin: f64,
    pub limits_for_coherent_detection: f64,

    pub bad_band_pulse_triplet_limit: f64,
    pub bad_band_pulse_limit: f64,
    /// Bins.
    pub pulse_clustering_delta_freq: i32,
    pub pulse_train_signif_thresh: f32,
    pub secondary_pulse_train_signif_thresh: f32,
    pub max_pulses_per_half_frame: i32,
    pub max_pulses_per_subchannel_per_half_frame: i32,
    pub request_pulse_resolution: [BoolT; MAX_RESOLUTIONS],
    pub pd: [PulseParameters; MAX_RESOLUTIONS],

    pub science_data_request: DxScienceDataRequest,
    /// Subchannels averaged together for baseline statistics.
    pub baseline_subchannel_average: i32,
    /// Half frames of baseline accumulation before data collection.
    pub baseline_init_accum_half_frames: i32,
    pub baseline_decay: f32,
    pub baseline_warning_limits: BaselineLimits,
    pub baseline_error_limits: BaselineLimits,
    pub align_pad2: i32,
}

pub const DX_ACTIVITY_PARAMETERS: Layout = Layout {
    name: "DxActivityParameters",
    size: 552,
    fields: &[
        Field::scalar("activity_id", 0, Scalar::I32),
        Field::scalar("data_collection_length", 4, Scalar::I32),
        Field::scalar("rcvr_sky_freq", 8, Scalar::F64),
        Field::scalar("ifc_sky_freq", 16, Scalar::F64),
        Field::scalar("dx_sky_freq", 24, Scalar::F64),
        Field::scalar("channel_number", 32, Scalar::I32),
        Field::scalar("operations", 36, Scalar::U32),
        Field::scalar("sensitivity_ratio", 40, Scalar::F32),
        Field::scalar("max_number_of_candidates", 44, Scalar::I32),
        Field::scalar("clustering_freq_tolerance", 48, Scalar::F32),
        Field::scalar("zero_drift_tolerance", 52, Scalar::F32),
        Field::scalar("max_drift_rate_tolerance", 56, Scalar::F32),
        Field::scalar("align_pad1", 60, Scalar::F32),
        Field::scalar("bad_band_cw_path_limit", 64, Scalar::F64),
        Field::scalar("cw_clustering_delta_freq", 72, Scalar::I32),
        Field::enumerated("dadd_resolution", 76),
        Field::scalar("dadd_threshold", 80, Scalar::F64),
        Field::scalar("cw_coherent_threshold", 88, Scalar::F64),
        Field::scalar("secondary_cw_coherent_threshold", 96, Scalar::F64),
        Field::scalar("secondary_pfa_margin", 104, Scalar::F64),
        Field::scalar("limits_for_coherent_detection", 112, Scalar::F64),
        Field::scalar("bad_band_pulse_triplet_limit", 120, Scalar::F64),
        Field::scalar("bad_band_pulse_limit", 128, Scalar::F64),
        Field::scalar("pulse_clustering_delta_freq", 136, Scalar::I32),
        Field::scalar("pulse_train_signif_thresh", 140, Scalar::F32),
        Field::scalar("secondary_pulse_train_signif_thresh", 144, Scalar::F32),
        Field::scalar("max_pulses_per_half_frame", 148, Scalar::I32),
        Field::scalar("max_pulses_per_subchannel_per_half_frame", 152, Scalar::I32),
        Field::array(
            "request_pulse_resolution",
            156,
            FieldKind::Scalar(Scalar::Enum),
            MAX_RESOLUTIONS,
        ),
        Field::array(
            "pd",
            200,
            FieldKind::Record(&PULSE_PARAMETERS),
            MAX_RESOLUTIONS,
        ),
        Field::record("science_data_request", 464, &DX_SCIENCE_DATA_REQUEST),
        Field::scalar("baseline_subchannel_average", 504, Scalar::I32),
        Field::scalar("baseline_init_accum_half_frames", 508, Scalar::I32),
        Field::scalar("baseline_decay", 512, Scalar::F32),
        Field::record("baseline_warning_limits", 516, &BASELINE_LIMITS),
        Field::record("baseline_error_limits", 532, &BASELINE_LIMITS),
        Field::scalar("align_pad2", 548, Scalar::I32),
    ],
};

impl DxActivityParameters {
    pub fn has_operation(&self, op: DxOperation) -> bool {
        self.operations & op.bit() != 0
    }

    pub fn set_operation(&mut self, op: DxOperation, on: bool) {
        if on {
            self.operations |= op.bit();
        } else {
            self.operations &= !op.bit();
        }
    }
}

impl Default for DxActivityParameters {
    fn default() -> Self {
        Self {
            activity_id: 0,
            data_collection_length: 0,
            rcvr_sky_freq: 0.0,
            ifc_sky_freq: 0.0,
            dx_sky_freq: 0.0,
            channel_number: 0,
            operations: 0,
            sensitivity_ratio: 0.0,
            max_number_of_candidates: 0,
            clustering_freq_tolerance: 0.0,
            zero_drift_tolerance: 0.0,
            max_drift_rate_tolerance: 0.0,
            align_pad1: 0.0,
            bad_band_cw_path_limit: 0.0,
            cw_clustering_delta_freq: 0,
            dadd_resolution: Resolution::Res1Hz,
            dadd_threshold: 0.0,
            cw_coherent_threshold: 0.0,
            secondary_cw_coherent_threshold: 0.0,
            secondary_pfa_margin: 0.0,
            limits_for_coherent_detection: 0.0,
            bad_band_pulse_triplet_limit: 0.0,
            bad_band_pulse_limit: 0.0,
            pulse_clustering_delta_freq: 0,
            pulse_train_signif_thresh: 0.0,
            secondary_pulse_train_signif_thresh: 0.0,
            max_pulses_per_half_frame: 0,
            max_pulses_per_subchannel_per_half_frame: 0,
            request_pulse_resolution: [BoolT::False; MAX_RESOLUTIONS],
            pd: [PulseParameters::default(); MAX_RESOLUTIONS],
            science_data_request: DxScienceDataRequest::default(),
            baseline_subchannel_average: 0,
            baseline_init_accum_half_frames: 0,
            baseline_decay: 0.0,
            baseline_warning_limits: BaselineLimits::default(),
            baseline_error_limits: BaselineLimits::default(),
            align_pad2: 0,
        }
    }
}

impl Marshall for DxActivityParameters {
    const LAYOUT: &'static Layout = &DX_ACTIVITY_PARAMETERS;

    fn write_native<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_ne(self.activity_id);
        dst.put_i32_ne(self.data_collection_length);
        dst.put_f64_ne(self.rcvr_sky_freq);
        dst.put_f64_ne(self.ifc_sky_freq);
        dst.put_f64_ne(self.dx_sky_freq);
        dst.put_i32_ne(self.channel_number);
        dst.put_u32_ne(self.operations);
        dst.put_f32_ne(self.sensitivity_ratio);
        dst.put_i32_ne(self.max_number_of_candidates);
        dst.put_f32_ne(self.clustering_freq_tolerance);
        dst.put_f32_ne(self.zero_drift_tolerance);
        dst.put_f32_ne(self.max_drift_rate_tolerance);
        dst.put_f32_ne(self.align_pad1);

        dst.put_f64_ne(self.bad_band_cw_path_limit);
        dst.put_i32_ne(self.cw_clustering_delta_freq);
        dst.put_i32_ne(self.dadd_resolution.code());
        dst.put_f64_ne(self.dadd_threshold);
        dst.put_f64_ne(self.cw_coherent_threshold);
        dst.put_f64_ne(self.secondary_cw_coherent_threshold);
        dst.put_f64_ne(self.secondary_pfa_margin);
        dst.put_f64_ne(self.limits_for_coherent_detection);

        dst.put_f64_ne(self.bad_band_pulse_triplet_limit);
        dst.put_f64_ne(self.bad_band_pulse_limit);
        dst.put_i32_ne(self.pulse_clustering_delta_freq);
        dst.put_f32_ne(self.pulse_train_signif_thresh);
        dst.put_f32_ne(self.secondary_pulse_train_signif_thresh);
        dst.put_i32_ne(self.max_pulses_per_half_frame);
        dst.put_i32_ne(self.max_pulses_per_subchannel_per_half_frame);
        for flag in &self.request_pulse_resolution {
            dst.put_i32_ne(flag.code());
        }
        for pd in &self.pd {
            pd.write_native(dst);
        }

        self.science_data_request.write_native(dst);
        dst.put_i32_ne(self.baseline_subchannel_average);
        dst.put_i32_ne(self.baseline_init_accum_half_frames);
        dst.put_f32_ne(self.baseline_decay);
        self.baseline_warning_limits.write_native(dst);
        self.baseline_error_limits.write_native(dst);
        dst.put_i32_ne(self.align_pad2);
    }

    fn read_native(src: &mut &[u8]) -> Result<Self> {
        let mut params = Self {
            activity_id: src.get_i32_ne(),
            data_collection_length: src.get_i32_ne(),
            rcvr_sky_freq: src.get_f64_ne(),
            ifc_sky_freq: src.get_f64_ne(),
            dx_sky_freq: src.get_f64_ne(),
            channel_number: src.get_i32_ne(),
            operations: src.get_u32_ne(),
            sensitivity_ratio: src.get_f32_ne(),
            max_number_of_candidates: src.get_i32_ne(),
            clustering_freq_tolerance: src.get_f32_ne(),
            zero_drift_tolerance: src.get_f32_ne(),
            max_drift_rate_tolerance: src.get_f32_ne(),
            align_pad1: src.get_f32_ne(),

            bad_band_cw_path_limit: src.get_f64_ne(),
            cw_clustering_delta_freq: src.get_i32_ne(),
            dadd_resolution: Resolution::try_from(src.get_i32_ne())?,
            dadd_threshold: src.get_f64_ne(),
            cw_coherent_threshold: src.get_f64_ne(),
            secondary_cw_coherent_threshold: src.get_f64_ne(),
            secondary_pfa_margin: src.get_f64_ne(),
            limits_for_coherent_detection: src.get_f64_ne(),

            bad_band_pulse_triplet_limit: src.get_f64_ne(),
            bad_band_pulse_limit: src.get_f64_ne(),
            pulse_clustering_delta_freq: src.get_i32_ne(),
            pulse_train_signif_thresh: src.get_f32_ne(),
            secondary_pulse_train_signif_thresh: src.get_f32_ne(),
            max_pulses_per_half_frame: src.get_i32_ne(),
            max_pulses_per_subchannel_per_half_frame: src.get_i32_ne(),
            ..Self::default()
        };
        for flag in &mut params.request_pulse_resolution {
            *flag = BoolT::try_from(src.get_i32_ne())?;
        }
        for pd in &mut params.pd {
            *pd = PulseParameters::read_native(src)?;
        }
        params.science_data_request = DxScienceDataRequest::read_native(src)?;
        params.baseline_subchannel_average = src.get_i32_ne();
        params.baseline_init_accum_half_frames = src.get_i32_ne();
        params.baseline_decay = src.get_f32_ne();
        params.baseline_warning_limits = BaselineLimits::read_native(src)?;
        params.baseline_error_limits = BaselineLimits::read_native(src)?;
        params.align_pad2 = src.get_i32_ne();
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrityError;
    use crate::marshall::{demarshall, marshall};

    fn sample_signal() -> SignalDescription {
        SignalDescription {
            path: SignalPath {
                rf_freq: 1420.405_751_7,
                drift: -0.25,
                width: 1.0,
                power: 77.5,
                align_pad: 0,
            },
            pol: Polarization::LeftCircular,
            sig_class: SignalClass::Candidate,
            reason: SignalClassReason::PassedPowerThresh,
            subchannel_number: 311,
            contains_bad_bands: BoolT::True,
            signal_id: SignalId {
                dx_number: 7,
                activity_id: 4242,
                activity_start_time: NssDate {
                    tv_sec: 1_263_430_000,
                    tv_usec: 0,
                },
                number: 3,
                align_pad: 0,
            },
            ..SignalDescription::default()
        }
    }

    #[test]
    fn signal_description_round_trips() {
        let sig = sample_signal();
        let wire = marshall(&sig);
        assert_eq!(wire.len(), 96);
        assert_eq!(&wire[0..8], &1420.405_751_7f64.to_be_bytes());
        assert_eq!(&wire[28..32], &[0, 0, 0, 1]);
        assert_eq!(&wire[44..48], &[0, 0, 0, 7]);
        // Follow-up id keeps its sentinels.
        assert_eq!(&wire[68..72], &[0xff; 4]);
        assert_eq!(demarshall::<SignalDescription>(&wire).unwrap(), sig);
    }

    #[test]
    fn nested_enum_out_of_range_is_rejected() {
        let mut wire = marshall(&sample_signal()).to_vec();
        wire[32..36].copy_from_slice(&51i32.to_be_bytes());
        assert_eq!(
            demarshall::<SignalDescription>(&wire),
            Err(IntegrityError::InvalidEnumerator {
                enumeration: "SignalClassReason",
                value: 51,
            })
        );
    }

    #[test]
    fn dx_status_activity_array_round_trips() {
        let status = DxStatus {
            timestamp: NssDate {
                tv_sec: 10,
                tv_usec: 20,
            },
            number_of_activities: 1,
            act: [
                DxActivityStatus {
                    activity_id: 99,
                    current_state: DxActivityState::RunDc,
                },
                DxActivityStatus::default(),
            ],
            ..DxStatus::default()
        };
        let wire = marshall(&status);
        assert_eq!(&wire[16..24], &[0, 0, 0, 99, 0, 0, 0, 7]);
        assert_eq!(&wire[24..28], &[0xff; 4]);
        assert_eq!(demarshall::<DxStatus>(&wire).unwrap(), status);
    }

    #[test]
    fn configuration_defaults_are_sentinels() {
        let config = DxConfiguration::default();
        assert_eq!(config.site, SiteId::Uninit);
        assert_eq!(config.dx_id, -1);

        let configured = DxConfiguration {
            site: SiteId::Ata,
            dx_id: 1001,
            a2d_clockrate: 104.8576,
            archiver_hostname: text_field("archiver1"),
            archiver_port: 8888,
            align_pad: 0,
        };
        let wire = marshall(&configured);
        assert_eq!(&wire[0..4], &[0, 0, 0, 8]);
        assert_eq!(&wire[16..25], b"archiver1");
        assert_eq!(&wire[272..276], &8888i32.to_be_bytes());
        assert_eq!(demarshall::<DxConfiguration>(&wire).unwrap(), configured);
    }

    #[test]
    fn here_i_am_carries_interface_version() {
        let wire = marshall(&HereIAm::default());
        let back: HereIAm = demarshall(&wire).unwrap();
        assert_eq!(back.version(), INTERFACE_VERSION);
    }

    #[test]
    fn tuned_and_band_fields_land_at_their_offsets() {
        let tuned = DxTuned {
            dx_sky_freq: 1420.5,
            data_collection_length: 98,
            data_collection_frames: 50,
        };
        let wire = marshall(&tuned);
        assert_eq!(&wire[0..8], &1420.5f64.to_be_bytes());
        assert_eq!(&wire[8..12], &98i32.to_be_bytes());
        assert_eq!(&wire[12..16], &50i32.to_be_bytes());
        assert_eq!(demarshall::<DxTuned>(&wire).unwrap(), tuned);

        let band = FrequencyBand {
            center_freq: 2250.75,
            bandwidth: 0.533,
            align_pad: 0,
        };
        let wire = marshall(&band);
        assert_eq!(&wire[0..8], &2250.75f64.to_be_bytes());
        assert_eq!(&wire[8..12], &0.533f32.to_be_bytes());
        assert_eq!(demarshall::<FrequencyBand>(&wire).unwrap(), band);
    }

    #[test]
    fn signal_id_and_path_round_trip() {
        let id = SignalId {
            dx_number: 1002,
            activity_id: 31_337,
            activity_start_time: NssDate {
                tv_sec: 1_263_430_100,
                tv_usec: 5,
            },
            number: 12,
            align_pad: 0,
        };
        let wire = marshall(&id);
        assert_eq!(&wire[0..4], &1002i32.to_be_bytes());
        assert_eq!(&wire[4..8], &31_337i32.to_be_bytes());
        assert_eq!(&wire[8..12], &1_263_430_100i32.to_be_bytes());
        assert_eq!(&wire[12..16], &5i32.to_be_bytes());
        assert_eq!(&wire[16..20], &12i32.to_be_bytes());
        assert_eq!(demarshall::<SignalId>(&wire).unwrap(), id);

        let request = ArchiveRequest { signal_id: id };
        assert_eq!(marshall(&request), wire);
        assert_eq!(demarshall::<ArchiveRequest>(&wire).unwrap(), request);

        let path = SignalPath {
            rf_freq: 1420.001_234,
            drift: 0.125,
            width: 2.0,
            power: 31.5,
            align_pad: 0,
        };
        let wire = marshall(&path);
        assert_eq!(&wire[0..8], &1420.001_234f64.to_be_bytes());
        assert_eq!(&wire[8..12], &0.125f32.to_be_bytes());
        assert_eq!(&wire[12..16], &2.0f32.to_be_bytes());
        assert_eq!(&wire[16..20], &31.5f32.to_be_bytes());
        assert_eq!(demarshall::<SignalPath>(&wire).unwrap(), path);
    }

    #[test]
    fn there_you_are_round_trips() {
        let there = ThereYouAre {
            sse_ip: text_field("10.1.49.2"),
            port_id: 8889,
            ..ThereYouAre::default()
        };
        let wire = marshall(&there);
        assert_eq!(&wire[0..9], b"10.1.49.2");
        assert_eq!(wire[9], 0);
        assert_eq!(&wire[256..260], &8889i32.to_be_bytes());
        assert!(wire[260..].starts_with(b"SSE-DX Interface Version 1.130"));
        assert_eq!(demarshall::<ThereYouAre>(&wire).unwrap(), there);
    }

    #[test]
    fn small_records_round_trip() {
        let stats = ConfirmationStats {
            pfa: 25.5,
            snr: 0.75,
        };
        let wire = marshall(&stats);
        assert_eq!(&wire[0..4], &25.5f32.to_be_bytes());
        assert_eq!(&wire[4..8], &0.75f32.to_be_bytes());
        assert_eq!(demarshall::<ConfirmationStats>(&wire).unwrap(), stats);

        let start = StartActivity {
            start_time: NssDate {
                tv_sec: 1_263_430_200,
                tv_usec: 0,
            },
        };
        let wire = marshall(&start);
        assert_eq!(&wire[0..4], &1_263_430_200i32.to_be_bytes());
        assert_eq!(demarshall::<StartActivity>(&wire).unwrap(), start);

        let count = Count { count: 258 };
        assert_eq!(&marshall(&count)[..], &[0, 0, 1, 2]);
        assert_eq!(demarshall::<Count>(&[0, 0, 1, 2]).unwrap(), count);
    }

    #[test]
    fn intrinsics_keep_alignment_pad_before_subchannel_width() {
        let intrinsics = DxIntrinsics {
            name: text_field("dx1000"),
            host: text_field("sonata-dx0"),
            channel_base: DxBaseAddr::new("227.1.1.3", 51000),
            foldings: 10,
            oversampling: 0.25,
            filter_name: text_field("LS1024"),
            hz_per_subchannel: 533.333,
            max_subchannels: 3072,
            serial_number: 7,
            perm_mask_date: NssDate {
                tv_sec: 1_200_000_000,
                tv_usec: 0,
            },
            ..DxIntrinsics::default()
        };
        let wire = marshall(&intrinsics);
        assert_eq!(wire.len(), 1592);
        assert_eq!(&wire[1024..1033], b"227.1.1.3");
        assert_eq!(&wire[1280..1284], &51000i32.to_be_bytes());
        assert_eq!(&wire[1284..1288], &10i32.to_be_bytes());
        assert_eq!(&wire[1288..1292], &0.25f32.to_be_bytes());
        assert_eq!(&wire[1292..1298], b"LS1024");
        assert_eq!(&wire[1548..1552], &[0; 4]);
        assert_eq!(&wire[1552..1560], &533.333f64.to_be_bytes());
        assert_eq!(&wire[1560..1564], &3072i32.to_be_bytes());
        assert_eq!(&wire[1584..1588], &1_200_000_000i32.to_be_bytes());

        let back: DxIntrinsics = demarshall(&wire).unwrap();
        assert_eq!(back, intrinsics);
        assert_eq!(back.name(), "dx1000");
        assert_eq!(back.channel_base.host(), "227.1.1.3");
    }

    fn sample_activity_parameters() -> DxActivityParameters {
        let mut params = DxActivityParameters {
            activity_id: 4242,
            data_collection_length: 98,
            rcvr_sky_freq: 1420.0,
            ifc_sky_freq: 1420.5,
            dx_sky_freq: 1420.25,
            channel_number: 3,
            sensitivity_ratio: 1.5,
            max_number_of_candidates: 8,
            dadd_resolution: Resolution::Res2Hz,
            dadd_threshold: 6.0,
            pulse_train_signif_thresh: 9.5,
            baseline_decay: 0.95,
            baseline_error_limits: BaselineLimits {
                mean_upper_bound: 1.1,
                mean_lower_bound: 0.9,
                std_dev_percent: 10.0,
                max_range: 2.0,
            },
            ..DxActivityParameters::default()
        };
        params.set_operation(DxOperation::DataCollection, true);
        params.set_operation(DxOperation::PulseDetection, true);
        params.request_pulse_resolution[1] = BoolT::True;
        params.pd[1] = PulseParameters {
            pulse_threshold: 4.5,
            triplet_threshold: 5.5,
            singlet_threshold: 6.5,
        };
        params.science_data_request = DxScienceDataRequest {
            send_complex_amplitudes: BoolT::True,
            request_type: SciDataRequestType::Subchannel,
            subchannel: 1536,
            ..DxScienceDataRequest::default()
        };
        params
    }

    #[test]
    fn activity_parameters_round_trip_with_nested_arrays() {
        let params = sample_activity_parameters();
        let wire = marshall(&params);
        assert_eq!(wire.len(), 552);
        assert_eq!(&wire[0..4], &4242i32.to_be_bytes());
        assert_eq!(&wire[24..32], &1420.25f64.to_be_bytes());
        assert_eq!(&wire[36..40], &0b1001u32.to_be_bytes());
        assert_eq!(&wire[76..80], &[0, 0, 0, 1]);
        assert_eq!(&wire[140..144], &9.5f32.to_be_bytes());
        // request_pulse_resolution[1], then pd[1].
        assert_eq!(&wire[160..164], &[0, 0, 0, 1]);
        assert_eq!(&wire[224..232], &4.5f64.to_be_bytes());
        assert_eq!(&wire[240..248], &6.5f64.to_be_bytes());
        // science_data_request.request_type and .subchannel.
        assert_eq!(&wire[488..492], &[0, 0, 0, 1]);
        assert_eq!(&wire[492..496], &1536i32.to_be_bytes());
        assert_eq!(&wire[512..516], &0.95f32.to_be_bytes());
        assert_eq!(&wire[532..536], &1.1f32.to_be_bytes());

        let back: DxActivityParameters = demarshall(&wire).unwrap();
        assert_eq!(back, params);
        assert!(back.has_operation(DxOperation::PulseDetection));
        assert!(!back.has_operation(DxOperation::Baselining));
    }

    #[test]
    fn bad_pulse_resolution_flag_is_rejected() {
        let mut wire = marshall(&sample_activity_parameters()).to_vec();
        wire[196..200].copy_from_slice(&2i32.to_be_bytes());
        assert_eq!(
            demarshall::<DxActivityParameters>(&wire),
            Err(IntegrityError::InvalidEnumerator {
                enumeration: "BoolT",
                value: 2,
            })
        );
    }

    #[test]
    fn clearing_an_operation_leaves_the_others() {
        let mut params = sample_activity_parameters();
        params.set_operation(DxOperation::DataCollection, false);
        assert_eq!(params.operations, DxOperation::PulseDetection.bit());
        assert_eq!(DxOperation::SendRawSignalDetectionProducts.bit(), 1 << 16);
    }

    #[test]
    fn variant_named_error_converts_both_ways() {
        assert_eq!(DxActivityState::try_from(15i32), Ok(DxActivityState::Error));
        assert_eq!(DxActivityState::try_from(15u32), Ok(DxActivityState::Error));
        assert!(DxActivityState::try_from(16i32).is_err());
        let status = DxActivityStatus {
            activity_id: 5,
            current_state: DxActivityState::Error,
        };
        assert_eq!(demarshall::<DxActivityStatus>(&marshall(&status)).unwrap(), status);
    }

    #[test]
    fn message_code_lookup() {
        assert_eq!(DxMessageCode::try_from(40_012u32), Ok(DxMessageCode::DxTuned));
        assert_eq!(DxMessageCode::from_name("shutdown-dx"), Some(DxMessageCode::ShutdownDx));
        assert_eq!(DxMessageCode::End.code(), 40_061);
    }
}
