#![allow(dead_code)]

use anyhow::Result;
use plexevents::cfg::{Session, SessionLimit, WaitMode};
use plexevents::RawEvent;
use plexstream::device::{DeviceService, PollStatus, WaitOutcome};
use std::collections::VecDeque;
use std::time::Duration;

/// A device service driven by a script.
///
/// `pending` is what the service has buffered before the first drain. After
/// every drain the next entry of `arrivals` is appended to it. Drains and
/// waits beyond the end of their scripts report nothing new and time out.
pub struct ScriptedDevice {
    pub tick_us: u32,
    pub aux_rate: u32,
    pub pending: VecDeque<RawEvent>,
    pub arrivals: VecDeque<Vec<RawEvent>>,
    pub statuses: VecDeque<PollStatus>,
    pub waits: VecDeque<WaitOutcome>,
    pub drains: usize,
    pub capacities: Vec<usize>,
    pub timeouts: Vec<Duration>,
}

impl ScriptedDevice {
    pub fn new(tick_us: u32, aux_rate: u32) -> Self {
        ScriptedDevice {
            tick_us,
            aux_rate,
            pending: VecDeque::new(),
            arrivals: VecDeque::new(),
            statuses: VecDeque::new(),
            waits: VecDeque::new(),
            drains: 0,
            capacities: Vec::new(),
            timeouts: Vec::new(),
        }
    }

    pub fn with_backlog(mut self, events: Vec<RawEvent>) -> Self {
        self.pending.extend(events);
        self
    }

    pub fn then(mut self, events: Vec<RawEvent>) -> Self {
        self.arrivals.push_back(events);
        self.waits.push_back(WaitOutcome::Signaled);
        self
    }
}

impl DeviceService for ScriptedDevice {
    fn tick_us(&mut self) -> Result<u32> {
        Ok(self.tick_us)
    }

    fn aux_rate(&mut self) -> Result<u32> {
        Ok(self.aux_rate)
    }

    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus> {
        self.drains += 1;
        self.capacities.push(capacity);
        buf.clear();
        let n = capacity.min(self.pending.len());
        buf.extend(self.pending.drain(..n));
        if let Some(next) = self.arrivals.pop_front() {
            self.pending.extend(next);
        }
        Ok(self.statuses.pop_front().unwrap_or_default())
    }

    fn wait_for_more_data(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        self.timeouts.push(timeout);
        Ok(self.waits.pop_front().unwrap_or(WaitOutcome::TimedOut))
    }
}

/// Spikes on channel 1, unit a, at the given timestamps
pub fn spikes(timestamps: &[u64]) -> Vec<RawEvent> {
    timestamps.iter().map(|&t| RawEvent::spike(1, 1, t)).collect()
}

/// A session waiting on notifications with a 10 ms timeout
pub fn notify_session(capacity: usize, limit: Option<SessionLimit>) -> Session {
    Session {
        name: String::from("scripted"),
        limit,
        capacity: Some(capacity),
        wait: Some(WaitMode::Notify(Duration::from_millis(10))),
        ..Default::default()
    }
}
