pub mod acc;
pub mod bit;
pub mod cfg;
pub mod de;
pub mod demux;
pub mod error;
pub mod event;
pub mod rate;
pub mod samples;
pub mod ser;
pub mod strobe;

pub use error::{Error, Result};

/// Kind code for a sorted or unsorted spike waveform
pub const KIND_SPIKE: u8 = 1;
/// Kind code for an external (digital input) event
pub const KIND_EXTERNAL: u8 = 4;
/// Kind code for a block of continuous (A/D) samples
pub const KIND_CONTINUOUS: u8 = 5;

/// External channel carrying strobed words
pub const CHAN_STROBED: u16 = 257;
/// External channel marking the start of a recording
pub const CHAN_START: u16 = 258;
/// External channel marking the end of a recording
pub const CHAN_STOP: u16 = 259;
/// External channel marking a recording pause
pub const CHAN_PAUSE: u16 = 260;
/// External channel marking a recording resume
pub const CHAN_RESUME: u16 = 261;

/// Kind of a raw event record as delivered by the device service.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum RawKind {
    SpikeWaveform,
    ContinuousBlock,
    ExternalEvent,
    /// A kind code this client does not interpret
    Other(u8),
}

impl From<u8> for RawKind {
    fn from(code: u8) -> Self {
        match code {
            KIND_SPIKE => RawKind::SpikeWaveform,
            KIND_CONTINUOUS => RawKind::ContinuousBlock,
            KIND_EXTERNAL => RawKind::ExternalEvent,
            x => RawKind::Other(x),
        }
    }
}

impl From<RawKind> for u8 {
    fn from(kind: RawKind) -> Self {
        match kind {
            RawKind::SpikeWaveform => KIND_SPIKE,
            RawKind::ContinuousBlock => KIND_CONTINUOUS,
            RawKind::ExternalEvent => KIND_EXTERNAL,
            RawKind::Other(x) => x,
        }
    }
}

/// One record drained from the device service in a single poll.
///
/// The meaning of `unit` depends on `kind`: the sorted unit (0 = unsorted)
/// for spikes, the 16-bit payload word for external events. `samples` is
/// only populated for continuous blocks, and all samples share `timestamp`
/// as the time of the first one.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct RawEvent {
    pub kind: RawKind,
    pub channel: u16,
    pub unit: u16,
    /// Device ticks since the start of the session
    pub timestamp: u64,
    pub samples: Vec<i16>,
}

impl RawEvent {
    pub fn spike(channel: u16, unit: u16, timestamp: u64) -> Self {
        RawEvent {
            kind: RawKind::SpikeWaveform,
            channel,
            unit,
            timestamp,
            samples: Vec::new(),
        }
    }

    pub fn external(channel: u16, unit: u16, timestamp: u64) -> Self {
        RawEvent {
            kind: RawKind::ExternalEvent,
            channel,
            unit,
            timestamp,
            samples: Vec::new(),
        }
    }

    pub fn continuous(channel: u16, timestamp: u64, samples: Vec<i16>) -> Self {
        RawEvent {
            kind: RawKind::ContinuousBlock,
            channel,
            unit: 0,
            timestamp,
            samples,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
