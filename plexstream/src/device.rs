//! Calling contract of the device service
//!
//! The device service owns the acquisition hardware and buffers every event
//! it produces until a client drains it. Connecting to it is outside this
//! crate; implementations of [`DeviceService`] wrap an established
//! connection, a recording, or a generator.

use anyhow::Result;
use plexevents::RawEvent;
use std::time::Duration;

/// 64-bit wall time of a drain, as delivered in two 32-bit halves
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct PollTime {
    pub high: u32,
    pub low: u32,
}

impl PollTime {
    pub fn from_u64(t: u64) -> Self {
        PollTime {
            high: (t >> 32) as u32,
            low: t as u32,
        }
    }

    pub fn as_u64(&self) -> u64 {
        (self.high as u64) << 32 | self.low as u64
    }
}

/// Everything a drain reports besides the events themselves
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct PollStatus {
    /// The service's own ring buffer overflowed since the last drain
    pub server_dropped: bool,
    /// The shared-memory buffer between service and client overflowed
    pub mmf_dropped: bool,
    pub poll_time: PollTime,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
}

pub trait DeviceService {
    /// Timestamp tick in microseconds
    fn tick_us(&mut self) -> Result<u32>;

    /// Sample rate of the continuous channels, in Hz
    fn aux_rate(&mut self) -> Result<u32>;

    /// Replace the contents of `buf` with at most `capacity` events, in
    /// arrival order, that arrived since the previous drain. Never blocks.
    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus>;

    /// Block until the service signals new data or `timeout` elapses
    fn wait_for_more_data(&mut self, timeout: Duration) -> Result<WaitOutcome>;

    /// True once a finite source has delivered its last event
    fn exhausted(&self) -> bool {
        false
    }
}

impl<S: DeviceService + ?Sized> DeviceService for Box<S> {
    fn tick_us(&mut self) -> Result<u32> {
        (**self).tick_us()
    }

    fn aux_rate(&mut self) -> Result<u32> {
        (**self).aux_rate()
    }

    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus> {
        (**self).drain(buf, capacity)
    }

    fn wait_for_more_data(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        (**self).wait_for_more_data(timeout)
    }

    fn exhausted(&self) -> bool {
        (**self).exhausted()
    }
}

impl<S: DeviceService + ?Sized> DeviceService for &mut S {
    fn tick_us(&mut self) -> Result<u32> {
        (**self).tick_us()
    }

    fn aux_rate(&mut self) -> Result<u32> {
        (**self).aux_rate()
    }

    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus> {
        (**self).drain(buf, capacity)
    }

    fn wait_for_more_data(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        (**self).wait_for_more_data(timeout)
    }

    fn exhausted(&self) -> bool {
        (**self).exhausted()
    }
}
