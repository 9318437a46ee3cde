//! Classification of raw event records into a closed set of variants

use serde::{Deserialize, Serialize};

use crate::strobe::{self, DecodedWord};
use crate::{RawEvent, RawKind, CHAN_PAUSE, CHAN_RESUME, CHAN_START, CHAN_STOP, CHAN_STROBED};

/// Recording lifecycle markers carried on dedicated external channels
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Lifecycle {
    Start,
    Stop,
    Pause,
    Resume,
}

impl Lifecycle {
    pub fn from_channel(channel: u16) -> Option<Self> {
        match channel {
            CHAN_START => Some(Lifecycle::Start),
            CHAN_STOP => Some(Lifecycle::Stop),
            CHAN_PAUSE => Some(Lifecycle::Pause),
            CHAN_RESUME => Some(Lifecycle::Resume),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Start => "start",
            Lifecycle::Stop => "stop",
            Lifecycle::Pause => "pause",
            Lifecycle::Resume => "resume",
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum External {
    Strobed(DecodedWord),
    Lifecycle { kind: Lifecycle, timestamp: u64 },
    /// Unstrobed single-bit input; `section` is the DSP section of the board
    DigitalLine { channel: u16, section: u16, timestamp: u64 },
}

/// A raw event, classified once by kind, channel and unit.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Event<'a> {
    /// Spike assigned to sorted unit `unit` ('a' to 'd')
    Spike { channel: u16, unit: char, timestamp: u64 },
    /// Spike with unit 0 (unsorted) or outside 1 to 4
    UnsortedSpike { channel: u16, unit: u16 },
    Continuous { channel: u16, timestamp: u64, samples: &'a [i16] },
    External(External),
    /// Kind code this client does not interpret
    Unrecognized(u8),
}

/// Sorted unit letter for units 1 to 4
pub fn unit_letter(unit: u16) -> Option<char> {
    match unit {
        1..=4 => Some((b'a' + (unit - 1) as u8) as char),
        _ => None,
    }
}

impl<'a> Event<'a> {
    pub fn classify(raw: &'a RawEvent) -> Self {
        match raw.kind {
            RawKind::SpikeWaveform => match unit_letter(raw.unit) {
                Some(unit) => Event::Spike {
                    channel: raw.channel,
                    unit,
                    timestamp: raw.timestamp,
                },
                None => Event::UnsortedSpike {
                    channel: raw.channel,
                    unit: raw.unit,
                },
            },
            RawKind::ContinuousBlock => Event::Continuous {
                channel: raw.channel,
                timestamp: raw.timestamp,
                samples: &raw.samples,
            },
            RawKind::ExternalEvent => Event::External(External::classify(raw.channel, raw.unit, raw.timestamp)),
            RawKind::Other(code) => Event::Unrecognized(code),
        }
    }
}

impl External {
    pub fn classify(channel: u16, unit: u16, timestamp: u64) -> Self {
        if channel == CHAN_STROBED {
            return External::Strobed(strobe::decode(unit, timestamp));
        }
        match Lifecycle::from_channel(channel) {
            Some(kind) => External::Lifecycle { kind, timestamp },
            None => External::DigitalLine {
                channel,
                section: unit,
                timestamp,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_letters() {
        assert_eq!(unit_letter(0), None);
        assert_eq!(unit_letter(1), Some('a'));
        assert_eq!(unit_letter(2), Some('b'));
        assert_eq!(unit_letter(3), Some('c'));
        assert_eq!(unit_letter(4), Some('d'));
        assert_eq!(unit_letter(5), None);
        assert_eq!(unit_letter(u16::MAX), None);
    }

    #[test]
    fn spikes() {
        let raw = RawEvent::spike(12, 3, 99);
        assert_eq!(
            Event::classify(&raw),
            Event::Spike { channel: 12, unit: 'c', timestamp: 99 }
        );
        let raw = RawEvent::spike(12, 0, 99);
        assert_eq!(
            Event::classify(&raw),
            Event::UnsortedSpike { channel: 12, unit: 0 }
        );
    }

    #[test]
    fn externals() {
        let strobed = RawEvent::external(CHAN_STROBED, 0x8003, 10);
        match Event::classify(&strobed) {
            Event::External(External::Strobed(w)) => {
                assert_eq!((w.value, w.high_flag, w.timestamp), (3, true, 10));
            }
            other => panic!("unexpected {:?}", other),
        }
        for (chan, kind) in [
            (CHAN_START, Lifecycle::Start),
            (CHAN_STOP, Lifecycle::Stop),
            (CHAN_PAUSE, Lifecycle::Pause),
            (CHAN_RESUME, Lifecycle::Resume),
        ] {
            let raw = RawEvent::external(chan, 0, 5);
            assert_eq!(
                Event::classify(&raw),
                Event::External(External::Lifecycle { kind, timestamp: 5 })
            );
        }
        let line = RawEvent::external(9, 1, 77);
        assert_eq!(
            Event::classify(&line),
            Event::External(External::DigitalLine { channel: 9, section: 1, timestamp: 77 })
        );
    }

    #[test]
    fn continuous_borrows_samples() {
        let raw = RawEvent::continuous(0, 1000, vec![1, 2, 3]);
        match Event::classify(&raw) {
            Event::Continuous { channel, timestamp, samples } => {
                assert_eq!((channel, timestamp), (0, 1000));
                assert_eq!(samples, &[1, 2, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unrecognized_kind() {
        let mut raw = RawEvent::spike(1, 1, 1);
        raw.kind = RawKind::from(9);
        assert_eq!(Event::classify(&raw), Event::Unrecognized(9));
    }
}
