//! Sample rate resolution from the device's timestamp tick

use crate::{Error, Result};

/// Update rate of the position tracking system, in Hz
pub const TRACKING_RATE: f64 = 105.0;

/// Map the timestamp tick duration (in microseconds) to the primary sample rate.
///
/// Any tick other than 25, 40 or 50 us is a fatal configuration error: the
/// stream cannot be scaled to seconds correctly without it.
pub fn map_rate(tick_us: u32) -> Result<u32> {
    match tick_us {
        25 => Ok(40_000),
        40 => Ok(25_000),
        50 => Ok(20_000),
        x => Err(Error::UnsupportedTick(x)),
    }
}

/// Resolved sample rates for one session.
///
/// Construction guarantees `map_rate % aux_rate == 0`, so that the per-sample
/// step of a continuous block is an exact number of ticks.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct RateContext {
    tick_us: u32,
    map_rate: u32,
    aux_rate: u32,
}

impl RateContext {
    /// Resolve the rates from the device tick and the continuous channel rate.
    pub fn new(tick_us: u32, aux_rate: u32) -> Result<Self> {
        let map_rate = map_rate(tick_us)?;
        if aux_rate == 0 || map_rate % aux_rate != 0 {
            return Err(Error::RateRatio { map_rate, aux_rate });
        }
        Ok(RateContext {
            tick_us,
            map_rate,
            aux_rate,
        })
    }

    pub fn tick_us(&self) -> u32 {
        self.tick_us
    }

    pub fn map_rate(&self) -> u32 {
        self.map_rate
    }

    pub fn aux_rate(&self) -> u32 {
        self.aux_rate
    }

    /// Ticks between consecutive samples of a continuous block
    pub fn sample_step(&self) -> u64 {
        (self.map_rate / self.aux_rate) as u64
    }

    /// Convert device ticks to seconds
    pub fn seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.map_rate as f64
    }

    /// Longest gap, in ticks, between two strobed words of the same packet:
    /// one update period of a tracker running at `tracking_rate` Hz, rounded
    /// to the nearest tick.
    pub fn acceptable_delay(&self, tracking_rate: f64) -> u64 {
        (1e6 / self.tick_us as f64 / tracking_rate).round() as u64
    }
}
