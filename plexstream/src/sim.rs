//! A synthetic device producing a plausible event stream in real time

use anyhow::Result;
use plexevents::{RawEvent, CHAN_START, CHAN_STROBED};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::time::{Duration, Instant};

use crate::device::{DeviceService, PollStatus, PollTime, WaitOutcome};

/// Generates spikes, continuous blocks, digital lines and strobed bursts
/// from a seeded random number generator. Events are timestamped by the
/// wall clock since the first drain.
pub struct SyntheticDevice {
    rng: StdRng,
    tick_us: u32,
    aux_rate: u32,
    /// Spiking channels, numbered from 1
    pub spike_channels: u16,
    /// Mean firing rate per channel, in Hz
    pub spike_rate: f64,
    /// Continuous channels, numbered from 0
    pub continuous_channels: u16,
    /// Tracker frames per second; each frame is one burst of strobed words
    pub frame_rate: f64,
    pub packet_words: usize,
    /// Mean rate of digital line events, in Hz
    pub digital_rate: f64,
    start: Option<Instant>,
    generated: u64,
    next_spike: Vec<u64>,
    next_sample: u64,
    frames: u64,
    next_digital: u64,
    /// Burst words stamped past the end of the last advance
    held: Vec<RawEvent>,
}

impl SyntheticDevice {
    pub fn new(tick_us: u32, aux_rate: u32, seed: u64) -> Self {
        SyntheticDevice {
            rng: StdRng::seed_from_u64(seed),
            tick_us,
            aux_rate,
            spike_channels: 8,
            spike_rate: 20.0,
            continuous_channels: 4,
            frame_rate: 60.0,
            packet_words: 1,
            digital_rate: 0.5,
            start: None,
            generated: 0,
            next_spike: Vec::new(),
            next_sample: 0,
            frames: 0,
            next_digital: 0,
            held: Vec::new(),
        }
    }

    fn ticks_per_sec(&self) -> f64 {
        1e6 / self.tick_us.max(1) as f64
    }

    /// Ticks until the next event of a Poisson process with rate `hz`
    fn gap(&mut self, hz: f64) -> u64 {
        let u: f64 = self.rng.gen();
        let secs = -(1.0 - u).ln() / hz;
        ((secs * self.ticks_per_sec()) as u64).max(1)
    }

    /// Generate every event timestamped before `end` ticks, sorted by
    /// timestamp
    pub fn advance(&mut self, end: u64) -> Vec<RawEvent> {
        let mut events = Vec::new();
        if self.generated == 0 && end > 0 {
            events.push(RawEvent::external(CHAN_START, 0, 0));
        }
        if end <= self.generated {
            return events;
        }

        if self.next_spike.len() != self.spike_channels as usize {
            self.next_spike = (0..self.spike_channels)
                .map(|_| self.gap(self.spike_rate))
                .collect();
        }
        for ch in 0..self.spike_channels as usize {
            while self.next_spike[ch] < end {
                let unit = self.rng.gen_range(0..5);
                events.push(RawEvent::spike(ch as u16 + 1, unit, self.next_spike[ch]));
                let gap = self.gap(self.spike_rate);
                self.next_spike[ch] += gap;
            }
        }

        let tps = self.ticks_per_sec();
        let step = (tps / self.aux_rate.max(1) as f64).round().max(1.0) as u64;
        if self.next_sample < end {
            let first = self.next_sample;
            let n = (end - first - 1) / step + 1;
            for ch in 0..self.continuous_channels {
                let rng = &mut self.rng;
                let samples = (0..n)
                    .map(|i| {
                        let t = (first + i * step) as f64 / tps;
                        let noise: f64 = rng.gen_range(-50.0..50.0);
                        (1000.0 * (2.0 * PI * 8.0 * t + ch as f64).sin() + noise) as i16
                    })
                    .collect();
                events.push(RawEvent::continuous(ch, first, samples));
            }
            self.next_sample += n * step;
        }

        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.held)
            .into_iter()
            .partition(|ev| ev.timestamp < end);
        events.extend(due);
        self.held = later;
        loop {
            let mut t = (self.frames as f64 * tps / self.frame_rate).round() as u64;
            if t >= end {
                break;
            }
            for _ in 0..self.packet_words {
                let value = self.rng.gen_range(0..0x8000u16);
                let word = RawEvent::external(CHAN_STROBED, value, t);
                // A burst may straddle the end; its tail waits for the next call
                if t < end {
                    events.push(word);
                } else {
                    self.held.push(word);
                }
                t += self.rng.gen_range(1..8);
            }
            self.frames += 1;
        }

        if self.next_digital == 0 {
            self.next_digital = self.gap(self.digital_rate);
        }
        while self.next_digital < end {
            let line = self.rng.gen_range(1..17);
            events.push(RawEvent::external(line, 0, self.next_digital));
            let gap = self.gap(self.digital_rate);
            self.next_digital += gap;
        }

        self.generated = end;
        events.sort_by_key(|ev| ev.timestamp);
        events
    }
}

impl DeviceService for SyntheticDevice {
    fn tick_us(&mut self) -> Result<u32> {
        Ok(self.tick_us)
    }

    fn aux_rate(&mut self) -> Result<u32> {
        Ok(self.aux_rate)
    }

    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus> {
        let start = *self.start.get_or_insert_with(Instant::now);
        let now = (start.elapsed().as_secs_f64() * self.ticks_per_sec()) as u64;
        let events = self.advance(now);
        // Anything past capacity is lost, as on the real service
        let server_dropped = events.len() > capacity;
        buf.clear();
        buf.extend(events.into_iter().take(capacity));
        Ok(PollStatus {
            server_dropped,
            mmf_dropped: false,
            poll_time: PollTime::from_u64(now),
        })
    }

    fn wait_for_more_data(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        std::thread::sleep(timeout.min(Duration::from_millis(50)));
        Ok(WaitOutcome::Signaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexevents::RawKind;

    #[test]
    fn one_second_of_data() {
        let mut dev = SyntheticDevice::new(25, 1000, 7);
        dev.packet_words = 3;
        let events = dev.advance(40_000);

        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(events[0].channel, CHAN_START);

        let samples: usize = events
            .iter()
            .filter(|ev| ev.kind == RawKind::ContinuousBlock)
            .map(|ev| ev.sample_count())
            .sum();
        assert_eq!(samples, 4 * 1000);

        let strobed = events.iter().filter(|ev| ev.channel == CHAN_STROBED).count();
        assert_eq!(strobed, 60 * 3);
    }

    #[test]
    fn bursts_straddling_calls_stay_in_order() {
        for seed in 0..4 {
            let mut dev = SyntheticDevice::new(25, 1000, seed);
            dev.packet_words = 4;
            let mut stream = Vec::new();
            let mut end = 0;
            for _ in 0..200 {
                end += 667;
                let events = dev.advance(end);
                assert!(events.iter().all(|ev| ev.timestamp < end));
                stream.extend(events);
            }
            assert!(stream.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            let strobed = stream.iter().filter(|ev| ev.channel == CHAN_STROBED).count();
            assert_eq!(strobed + dev.held.len(), 4 * dev.frames as usize);
        }
    }

    #[test]
    fn drain_reuses_buffer() {
        let mut dev = SyntheticDevice::new(25, 1000, 3);
        let mut buf = Vec::with_capacity(10_000);
        buf.extend(dev.advance(4_000));
        let stale = buf.len();
        assert!(stale > 0);
        dev.drain(&mut buf, 10_000).unwrap();
        assert!(buf.capacity() >= 10_000);
        assert!(buf.iter().all(|ev| ev.timestamp >= 4_000) || buf.is_empty());
    }

    #[test]
    fn seeded_streams_repeat() {
        let mut a = SyntheticDevice::new(25, 1000, 42);
        let mut b = SyntheticDevice::new(25, 1000, 42);
        assert_eq!(a.advance(4_000), b.advance(4_000));
        assert_eq!(a.advance(8_000), b.advance(8_000));
    }

    #[test]
    fn samples_continue_across_calls() {
        let mut dev = SyntheticDevice::new(25, 1000, 1);
        dev.continuous_channels = 1;
        let first = dev.advance(1_000);
        let second = dev.advance(2_000);
        let block = |evs: &[RawEvent]| {
            evs.iter()
                .find(|ev| ev.kind == RawKind::ContinuousBlock)
                .map(|ev| (ev.timestamp, ev.sample_count()))
        };
        assert_eq!(block(&first), Some((0, 25)));
        assert_eq!(block(&second), Some((1_000, 25)));
    }
}
