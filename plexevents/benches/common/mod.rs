#![allow(dead_code)]

use plexevents::{RawEvent, CHAN_STROBED};

/// A deterministic batch mixing every event kind, roughly in the
/// proportions a busy recording produces: mostly spikes, a continuous block
/// every few hundred ticks, and a strobed burst at 105 Hz.
pub fn mixed_batch(n: usize) -> Vec<RawEvent> {
    let mut events = Vec::with_capacity(n);
    let mut t = 0u64;
    let mut i = 0usize;
    while events.len() < n {
        t += 7;
        match i % 50 {
            0 => events.push(RawEvent::continuous(0, t, (0..40).collect())),
            10 | 11 | 12 => events.push(RawEvent::external(CHAN_STROBED, i as u16, t)),
            20 => events.push(RawEvent::external(3, 0, t)),
            _ => events.push(RawEvent::spike((i % 16) as u16 + 1, (i % 5) as u16, t)),
        }
        i += 1;
    }
    events
}
