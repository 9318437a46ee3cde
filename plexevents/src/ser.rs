//! Serialization of records and raw events to tab-separated values

use crate::demux::{Record, RecordSink};
use crate::RawEvent;
use anyhow::Result;
use std::fmt::Debug;
use std::io::Write;

/// Build a tab-separated writer without headers
pub fn tsv_writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(wtr)
}

/// Serialize raw events to tab-separated values
/// (kind, channel, unit, timestamp, samples...), the format read back by
/// [`crate::de::raw_events`].
pub fn raw_events(wtr: &mut csv::Writer<impl Write>, events: &[RawEvent]) -> Result<()> {
    for ev in events.iter() {
        let mut row = Vec::with_capacity(4 + ev.samples.len());
        row.push(u8::from(ev.kind).to_string());
        row.push(ev.channel.to_string());
        row.push(ev.unit.to_string());
        row.push(ev.timestamp.to_string());
        row.extend(ev.samples.iter().map(|s| s.to_string()));
        wtr.write_record(&row)?;
    }
    Ok(())
}

/// Writes records as tab-separated rows of
/// (record, channel, detail, ticks, seconds).
///
/// Strobed values from a board outside the first DSP section are prefixed
/// with `*`.
pub struct TsvSink<W: Write> {
    wtr: csv::Writer<W>,
    fmt: ryu::Buffer,
}

impl<W: Write> TsvSink<W> {
    pub fn new(wtr: W) -> Self {
        TsvSink {
            wtr: tsv_writer(wtr),
            fmt: ryu::Buffer::new(),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }

    fn row(&mut self, record: &str, channel: &str, detail: &str, ticks: u64, time: f64) -> Result<()> {
        let ticks = ticks.to_string();
        let time = self.fmt.format(time);
        self.wtr.write_record(&[record, channel, detail, ticks.as_str(), time])?;
        Ok(())
    }
}

fn strobed_value(value: u16, high_flag: bool) -> String {
    if high_flag {
        format!("*{}", value)
    } else {
        value.to_string()
    }
}

impl<W: Write, M: Debug> RecordSink<M> for TsvSink<W> {
    fn record(&mut self, record: Record<M>) -> Result<()> {
        match record {
            Record::Spike(s) => {
                let unit = s.unit.to_string();
                self.row("spike", &s.channel.to_string(), &unit, s.ticks, s.time)
            }
            Record::Sample(s) => {
                self.row("sample", &s.channel.to_string(), &s.value.to_string(), s.ticks, s.time)
            }
            Record::Marker(m) => self.row("marker", "", m.kind.as_str(), m.ticks, m.time),
            Record::Digital(d) => {
                self.row("digital", &d.channel.to_string(), &d.section.to_string(), d.ticks, d.time)
            }
            Record::Strobed(s) => {
                let value = strobed_value(s.word.value, s.word.high_flag);
                self.row("strobed", "", &value, s.word.timestamp, s.time)
            }
            Record::Packet(p) => {
                let words = p
                    .packet
                    .words
                    .iter()
                    .map(|w| strobed_value(w.value, w.high_flag))
                    .collect::<Vec<_>>()
                    .join(" ");
                let mode = format!("{:?}", p.packet.mode);
                let start = p.packet.start();
                self.row("packet", &mode, &words, start, p.time)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acc::CompositePacket;
    use crate::demux::{PacketRecord, SpikeRecord};
    use crate::strobe::decode;

    #[test]
    fn tsv_rows() {
        let mut buf = Vec::new();
        {
            let mut sink = TsvSink::new(&mut buf);
            sink.record(Record::<usize>::Spike(SpikeRecord { channel: 4, unit: 'a', ticks: 40_000, time: 1.0 }))
                .unwrap();
            sink.record(Record::Packet(PacketRecord {
                packet: CompositePacket { mode: 2usize, words: vec![decode(5, 100), decode(0x8006, 110)] },
                time: 0.0025,
            }))
            .unwrap();
            sink.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "spike\t4\ta\t40000\t1.0\npacket\t2\t5 *6\t100\t0.0025\n");
    }
}
