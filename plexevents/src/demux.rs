//! Demultiplexing of drained events into typed records
//!
//! Events are handled strictly in the order given. Continuous blocks expand
//! into one record per sample, and strobed words go through the packet
//! accumulator, so reordering would corrupt both.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::acc::{Accumulator, Admission, CompositePacket, PacketDecoder};
use crate::event::{Event, External, Lifecycle};
use crate::rate::RateContext;
use crate::samples::SampleTimes;
use crate::strobe::DecodedWord;
use crate::RawEvent;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SpikeRecord {
    pub channel: u16,
    pub unit: char,
    pub ticks: u64,
    pub time: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SampleRecord {
    pub channel: u16,
    pub value: i16,
    pub ticks: u64,
    pub time: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MarkerRecord {
    pub kind: Lifecycle,
    pub ticks: u64,
    pub time: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DigitalRecord {
    pub channel: u16,
    pub section: u16,
    pub ticks: u64,
    pub time: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StrobedRecord {
    pub word: DecodedWord,
    pub time: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct PacketRecord<M> {
    pub packet: CompositePacket<M>,
    /// Time of the first word, in seconds
    pub time: f64,
}

/// Everything handed to downstream consumers, in stream order.
/// Times are in seconds; the raw tick counts are kept alongside.
#[derive(Clone, PartialEq, Debug)]
pub enum Record<M> {
    Spike(SpikeRecord),
    Sample(SampleRecord),
    Marker(MarkerRecord),
    Digital(DigitalRecord),
    Strobed(StrobedRecord),
    Packet(PacketRecord<M>),
}

/// Receives records as they are demultiplexed
pub trait RecordSink<M> {
    fn record(&mut self, record: Record<M>) -> Result<()>;
}

impl<M> RecordSink<M> for Vec<Record<M>> {
    fn record(&mut self, record: Record<M>) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Which record kinds are passed on to the sink
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Outputs {
    pub spikes: bool,
    pub samples: bool,
    pub markers: bool,
    pub digital: bool,
    /// Individual strobed words, before accumulation
    pub strobed: bool,
    pub packets: bool,
}

impl Default for Outputs {
    fn default() -> Self {
        Outputs {
            spikes: true,
            samples: true,
            markers: true,
            digital: true,
            strobed: false,
            packets: true,
        }
    }
}

/// Running totals for a session. Drop reports and silent exclusions are
/// only visible here.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub polls: u64,
    pub events: u64,
    pub backlog: u64,
    pub spikes: u64,
    pub unsorted_spikes: u64,
    pub continuous_blocks: u64,
    pub continuous_skipped: u64,
    pub samples: u64,
    pub markers: u64,
    pub digital: u64,
    pub strobed: u64,
    pub packets: u64,
    pub discarded_words: u64,
    pub unrecognized: u64,
    pub server_drops: u64,
    pub mmf_drops: u64,
}

pub struct Demux<D: PacketDecoder> {
    rates: RateContext,
    acc: Accumulator<D>,
    outputs: Outputs,
    continuous_channels: Vec<u16>,
    counters: Counters,
}

impl<D: PacketDecoder> Demux<D> {
    /// Words of one packet must arrive within one update period of a tracker
    /// running at `tracking_rate` Hz.
    pub fn new(rates: RateContext, decoder: D, tracking_rate: f64) -> Self {
        let delay = rates.acceptable_delay(tracking_rate);
        Demux {
            rates,
            acc: Accumulator::new(decoder, delay),
            outputs: Outputs::default(),
            continuous_channels: Vec::new(),
            counters: Counters::default(),
        }
    }

    pub fn with_outputs(mut self, outputs: Outputs) -> Self {
        self.outputs = outputs;
        self
    }

    /// Restrict sample reconstruction to these continuous channels; empty
    /// means all channels.
    pub fn with_continuous_channels(mut self, channels: Vec<u16>) -> Self {
        self.continuous_channels = channels;
        self
    }

    pub fn rates(&self) -> &RateContext {
        &self.rates
    }

    pub fn accumulator(&self) -> &Accumulator<D> {
        &self.acc
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    /// Handle every event of one drained batch, in order
    pub fn dispatch(&mut self, events: &[RawEvent], sink: &mut impl RecordSink<D::Mode>) -> Result<()> {
        for raw in events {
            self.handle(raw, sink)?;
        }
        Ok(())
    }

    pub fn handle(&mut self, raw: &RawEvent, sink: &mut impl RecordSink<D::Mode>) -> Result<()> {
        self.counters.events += 1;
        match Event::classify(raw) {
            Event::Spike { channel, unit, timestamp } => {
                self.counters.spikes += 1;
                if self.outputs.spikes {
                    sink.record(Record::Spike(SpikeRecord {
                        channel,
                        unit,
                        ticks: timestamp,
                        time: self.rates.seconds(timestamp),
                    }))?;
                }
            }
            Event::UnsortedSpike { .. } => {
                self.counters.unsorted_spikes += 1;
            }
            Event::Continuous { channel, timestamp, samples } => {
                self.counters.continuous_blocks += 1;
                if !self.continuous_channels.is_empty() && !self.continuous_channels.contains(&channel) {
                    self.counters.continuous_skipped += 1;
                    return Ok(());
                }
                self.counters.samples += samples.len() as u64;
                if self.outputs.samples {
                    for (value, ticks) in SampleTimes::with_rates(samples, timestamp, &self.rates) {
                        sink.record(Record::Sample(SampleRecord {
                            channel,
                            value,
                            ticks,
                            time: self.rates.seconds(ticks),
                        }))?;
                    }
                }
            }
            Event::External(External::Strobed(word)) => {
                self.counters.strobed += 1;
                if self.outputs.strobed {
                    sink.record(Record::Strobed(StrobedRecord {
                        word,
                        time: self.rates.seconds(word.timestamp),
                    }))?;
                }
                self.strobed(word, sink)?;
            }
            Event::External(External::Lifecycle { kind, timestamp }) => {
                self.counters.markers += 1;
                if self.outputs.markers {
                    sink.record(Record::Marker(MarkerRecord {
                        kind,
                        ticks: timestamp,
                        time: self.rates.seconds(timestamp),
                    }))?;
                }
            }
            Event::External(External::DigitalLine { channel, section, timestamp }) => {
                self.counters.digital += 1;
                if self.outputs.digital {
                    sink.record(Record::Digital(DigitalRecord {
                        channel,
                        section,
                        ticks: timestamp,
                        time: self.rates.seconds(timestamp),
                    }))?;
                }
            }
            Event::Unrecognized(kind) => {
                trace!(kind, channel = raw.channel, "dropping unrecognized event");
                self.counters.unrecognized += 1;
            }
        }
        Ok(())
    }

    fn strobed(&mut self, word: DecodedWord, sink: &mut impl RecordSink<D::Mode>) -> Result<()> {
        if let Admission::Rejected { flushed, discarded } = self.acc.push(word) {
            self.counters.discarded_words += discarded as u64;
            if let Some(packet) = flushed {
                self.emit(packet, sink)?;
            }
        }
        Ok(())
    }

    /// Flush the packet in progress if its mode is known. Used when the
    /// stream ends or stalls.
    pub fn flush(&mut self, sink: &mut impl RecordSink<D::Mode>) -> Result<bool> {
        match self.acc.take() {
            Some(packet) => {
                self.emit(packet, sink)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn emit(&mut self, packet: CompositePacket<D::Mode>, sink: &mut impl RecordSink<D::Mode>) -> Result<()> {
        self.counters.packets += 1;
        if self.outputs.packets {
            let time = self.rates.seconds(packet.start());
            sink.record(Record::Packet(PacketRecord { packet, time }))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acc::FixedLength;
    use crate::rate::TRACKING_RATE;
    use crate::{RawKind, CHAN_START, CHAN_STROBED};

    fn demux(words: usize) -> Demux<FixedLength> {
        let rates = RateContext::new(25, 1000).unwrap();
        Demux::new(rates, FixedLength { words }, TRACKING_RATE)
    }

    #[test]
    fn interleaved_kinds_keep_order() {
        let mut d = demux(1);
        let events = vec![
            RawEvent::spike(3, 2, 400),
            RawEvent::continuous(0, 1000, vec![5, 6]),
            RawEvent::external(CHAN_START, 0, 1000),
            RawEvent::external(17, 1, 1040),
            RawEvent::spike(4, 0, 1040),
        ];
        let mut out = Vec::new();
        d.dispatch(&events, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                Record::Spike(SpikeRecord { channel: 3, unit: 'b', ticks: 400, time: 0.01 }),
                Record::Sample(SampleRecord { channel: 0, value: 5, ticks: 1000, time: 0.025 }),
                Record::Sample(SampleRecord { channel: 0, value: 6, ticks: 1040, time: 0.026 }),
                Record::Marker(MarkerRecord { kind: Lifecycle::Start, ticks: 1000, time: 0.025 }),
                Record::Digital(DigitalRecord { channel: 17, section: 1, ticks: 1040, time: 0.026 }),
            ]
        );
        let c = d.counters();
        assert_eq!(c.events, 5);
        assert_eq!(c.spikes, 1);
        assert_eq!(c.unsorted_spikes, 1);
        assert_eq!(c.samples, 2);
    }

    #[test]
    fn unrecognized_kinds_are_counted_not_emitted() {
        let mut d = demux(1);
        let mut raw = RawEvent::spike(1, 1, 1);
        raw.kind = RawKind::Other(2);
        let mut out = Vec::new();
        d.handle(&raw, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(d.counters().unrecognized, 1);
    }

    #[test]
    fn continuous_channel_filter() {
        let mut d = demux(1).with_continuous_channels(vec![0]);
        let events = vec![
            RawEvent::continuous(1, 0, vec![1, 2, 3]),
            RawEvent::continuous(0, 0, vec![4]),
        ];
        let mut out = Vec::new();
        d.dispatch(&events, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(d.counters().continuous_skipped, 1);
        assert_eq!(d.counters().continuous_blocks, 2);
    }

    #[test]
    fn strobed_words_flush_on_late_word() {
        let mut d = demux(2);
        let delay = d.accumulator().acceptable_delay();
        let events = vec![
            RawEvent::external(CHAN_STROBED, 1, 0),
            RawEvent::external(CHAN_STROBED, 2, 10),
            RawEvent::external(CHAN_STROBED, 3, 10 + delay + 1),
        ];
        let mut out = Vec::new();
        d.dispatch(&events, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        match &out[0] {
            Record::Packet(p) => {
                assert_eq!(p.packet.mode, 2);
                let values: Vec<u16> = p.packet.words.iter().map(|w| w.value).collect();
                assert_eq!(values, vec![1, 2]);
                assert_eq!(p.time, 0.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        // The late word is pending but unclassified
        assert!(!d.flush(&mut out).unwrap());
        assert_eq!(d.accumulator().words().len(), 1);
    }

    #[test]
    fn outputs_mask_records_but_not_counters() {
        let outputs = Outputs { spikes: false, strobed: true, ..Default::default() };
        let mut d = demux(1).with_outputs(outputs);
        let events = vec![
            RawEvent::spike(1, 1, 0),
            RawEvent::external(CHAN_STROBED, 0x8001, 5),
        ];
        let mut out = Vec::new();
        d.dispatch(&events, &mut out).unwrap();
        assert_eq!(d.counters().spikes, 1);
        assert!(matches!(out.as_slice(), [Record::Strobed(s)] if s.word.value == 1 && s.word.high_flag));
        assert!(d.flush(&mut out).unwrap());
        assert!(matches!(out.last(), Some(Record::Packet(_))));
    }
}
