//! Deserialization of recorded raw events from tab-separated values

use crate::{Error, RawEvent, RawKind, Result};
use std::io::Read;
use std::str::FromStr;

/// Build a tab-separated reader without headers, allowing rows of varying
/// length (continuous blocks carry their samples inline)
pub fn tsv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(rdr)
}

fn field<T: FromStr>(record: &csv::StringRecord, i: usize, name: &str) -> Result<T> {
    let raw = record
        .get(i)
        .ok_or_else(|| Error::Parse(format!("missing {} in {:?}", name, record)))?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Parse(format!("bad {} {:?}", name, raw)))
}

/// Parse one row of (kind, channel, unit, timestamp, samples...)
pub fn raw_event(record: &csv::StringRecord) -> Result<RawEvent> {
    let kind = RawKind::from(field::<u8>(record, 0, "kind")?);
    let channel = field(record, 1, "channel")?;
    let unit = field(record, 2, "unit")?;
    let timestamp = field(record, 3, "timestamp")?;
    let samples = (4..record.len())
        .map(|i| field::<i16>(record, i, "sample"))
        .collect::<Result<Vec<_>>>()?;
    Ok(RawEvent {
        kind,
        channel,
        unit,
        timestamp,
        samples,
    })
}

/// Deserialize all raw events from tab-separated values
pub fn raw_events(rdr: &mut csv::Reader<impl Read>) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for result in rdr.records() {
        let record = result?;
        events.push(raw_event(&record)?);
    }
    Ok(events)
}
