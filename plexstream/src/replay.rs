//! Replaying and recording raw event streams

use anyhow::{bail, Context, Result};
use either::Either;
use plexevents::{de, ser, RawEvent};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{stdin, BufReader, Write};
use std::time::Duration;

use crate::device::{DeviceService, PollStatus, PollTime, WaitOutcome};

/// Serves a recorded event stream through the device contract.
///
/// `backlog` events are available before the first drain; after each
/// drain another `batch` events arrive, as if the device had kept
/// producing while the client was away.
pub struct ReplayDevice {
    events: VecDeque<RawEvent>,
    tick_us: u32,
    aux_rate: u32,
    batch: usize,
    arrived: usize,
    polls: u64,
}

impl ReplayDevice {
    pub fn new(events: Vec<RawEvent>, tick_us: u32, aux_rate: u32) -> Self {
        ReplayDevice {
            events: events.into(),
            tick_us,
            aux_rate,
            batch: 1000,
            arrived: 0,
            polls: 0,
        }
    }

    /// Load a recording from a file, or from standard input for `-`
    pub fn open(path: &str, tick_us: u32, aux_rate: u32) -> Result<Self> {
        let source = if path == "-" { Either::Left(()) } else { Either::Right(path) };
        let events = match source {
            Either::Left(()) => {
                let stdin = stdin();
                let stdin = stdin.lock();
                let mut rdr = de::tsv_reader(BufReader::new(stdin));
                de::raw_events(&mut rdr).context("cannot read raw events from stdin")?
            }
            Either::Right(path) => {
                let f = File::open(path).with_context(|| format!("cannot open {}", path))?;
                let mut rdr = de::tsv_reader(BufReader::new(f));
                de::raw_events(&mut rdr).with_context(|| format!("cannot read raw events from {}", path))?
            }
        };
        Ok(ReplayDevice::new(events, tick_us, aux_rate))
    }

    /// Events arriving after each drain. Must be positive, or a recording
    /// without backlog would never deliver anything.
    pub fn with_batch(mut self, batch: usize) -> Result<Self> {
        if batch == 0 {
            bail!("replay batch must be positive");
        }
        self.batch = batch;
        Ok(self)
    }

    pub fn with_backlog(mut self, backlog: usize) -> Self {
        self.arrived = backlog.min(self.events.len());
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl DeviceService for ReplayDevice {
    fn tick_us(&mut self) -> Result<u32> {
        Ok(self.tick_us)
    }

    fn aux_rate(&mut self) -> Result<u32> {
        Ok(self.aux_rate)
    }

    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus> {
        buf.clear();
        let n = self.arrived.min(capacity);
        buf.extend(self.events.drain(..n));
        self.arrived = (self.arrived - n + self.batch).min(self.events.len());
        self.polls += 1;
        Ok(PollStatus {
            poll_time: PollTime::from_u64(self.polls),
            ..Default::default()
        })
    }

    fn wait_for_more_data(&mut self, _timeout: Duration) -> Result<WaitOutcome> {
        if self.arrived > 0 {
            Ok(WaitOutcome::Signaled)
        } else {
            Ok(WaitOutcome::TimedOut)
        }
    }

    fn exhausted(&self) -> bool {
        self.events.is_empty()
    }
}

/// Forwards to another device, saving every drained event as
/// tab-separated values
pub struct Recorder<S, W: Write> {
    inner: S,
    wtr: csv::Writer<W>,
}

impl<S: DeviceService, W: Write> Recorder<S, W> {
    pub fn new(inner: S, wtr: W) -> Self {
        Recorder {
            inner,
            wtr: ser::tsv_writer(wtr),
        }
    }
}

impl<S: DeviceService, W: Write> DeviceService for Recorder<S, W> {
    fn tick_us(&mut self) -> Result<u32> {
        self.inner.tick_us()
    }

    fn aux_rate(&mut self) -> Result<u32> {
        self.inner.aux_rate()
    }

    fn drain(&mut self, buf: &mut Vec<RawEvent>, capacity: usize) -> Result<PollStatus> {
        let status = self.inner.drain(buf, capacity)?;
        ser::raw_events(&mut self.wtr, buf)?;
        self.wtr.flush()?;
        Ok(status)
    }

    fn wait_for_more_data(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        self.inner.wait_for_more_data(timeout)
    }

    fn exhausted(&self) -> bool {
        self.inner.exhausted()
    }
}
