#![allow(dead_code)]

use plexevents::demux::Record;
use plexevents::strobe::{decode, DecodedWord};
use plexevents::{RawEvent, CHAN_STROBED};

/// Strobed words at the given inter-arrival gaps (the first gap is from 0),
/// valued 1, 2, 3, ...
pub fn strobed_at_gaps(gaps: &[u64]) -> Vec<RawEvent> {
    let mut t = 0;
    gaps.iter()
        .enumerate()
        .map(|(i, &gap)| {
            t += gap;
            RawEvent::external(CHAN_STROBED, i as u16 + 1, t)
        })
        .collect()
}

pub fn words_at_gaps(gaps: &[u64]) -> Vec<DecodedWord> {
    strobed_at_gaps(gaps)
        .iter()
        .map(|ev| decode(ev.unit, ev.timestamp))
        .collect()
}

/// Values of the words in every packet record, in order
pub fn packet_values<M>(records: &[Record<M>]) -> Vec<Vec<u16>> {
    records
        .iter()
        .filter_map(|r| match r {
            Record::Packet(p) => Some(p.packet.words.iter().map(|w| w.value).collect()),
            _ => None,
        })
        .collect()
}
