//! The drain-then-wait loop
//!
//! On startup the loop drains the device's backlog without processing it,
//! so that steady state begins close to real time. It then alternates
//! between one drain, dispatching every drained event in arrival order, and
//! one wait. The event buffer is reused across drains and only lent to the
//! demultiplexer for the duration of one dispatch.

use plexevents::acc::PacketDecoder;
use plexevents::cfg::{Session, SessionLimit, WaitMode};
use plexevents::demux::{Counters, Demux, RecordSink};
use plexevents::rate::RateContext;
use plexevents::RawEvent;
use std::time::Instant;

use tracing::{debug, error, info, span, warn, Level};

use crate::device::{DeviceService, PollStatus, WaitOutcome};
use crate::{timer, Control, Error, Result};

pub struct PollLoop<S: DeviceService, D: PacketDecoder> {
    device: S,
    demux: Demux<D>,
    buf: Vec<RawEvent>,
    capacity: usize,
    wait: WaitMode,
    limit: Option<SessionLimit>,
    control: Option<flume::Receiver<Control>>,
    paused: bool,
}

impl<S: DeviceService, D: PacketDecoder> PollLoop<S, D> {
    /// Resolve the device's rates and set up the loop. Unsupported ticks and
    /// inexact rate ratios fail here, before anything is drained.
    pub fn new(mut device: S, session: &Session, decoder: D) -> Result<Self> {
        session.validate()?;
        let tick = device.tick_us().map_err(Error::Device)?;
        let aux = device.aux_rate().map_err(Error::Device)?;
        let rates = RateContext::new(tick, aux)?;
        let demux = Demux::new(rates, decoder, session.tracking_rate())
            .with_outputs(session.outputs())
            .with_continuous_channels(session.continuous_channels.clone());
        info!(
            tick_us = tick,
            map_rate = rates.map_rate(),
            aux_rate = aux,
            acceptable_delay = demux.accumulator().acceptable_delay(),
            "resolved device rates"
        );
        Ok(PollLoop {
            device,
            demux,
            buf: Vec::new(),
            capacity: session.capacity(),
            wait: session.wait(),
            limit: session.limit,
            control: None,
            paused: false,
        })
    }

    /// Accept pause/resume/stop commands from another thread
    pub fn with_control(mut self, control: flume::Receiver<Control>) -> Self {
        self.control = Some(control);
        self
    }

    /// While paused the loop keeps waiting but does not drain
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn rates(&self) -> &RateContext {
        self.demux.rates()
    }

    pub fn demux(&self) -> &Demux<D> {
        &self.demux
    }

    pub fn counters(&self) -> &Counters {
        self.demux.counters()
    }

    pub fn device(&self) -> &S {
        &self.device
    }

    pub fn into_device(self) -> S {
        self.device
    }

    fn drain(&mut self) -> Result<PollStatus> {
        let status = self.device.drain(&mut self.buf, self.capacity).map_err(Error::Device)?;
        let counters = self.demux.counters_mut();
        counters.polls += 1;
        // Dropped data is gone; it is counted and the stream goes on
        if status.server_dropped {
            counters.server_drops += 1;
            warn!(total = counters.server_drops, "device service dropped events");
        }
        if status.mmf_dropped {
            counters.mmf_drops += 1;
            warn!(total = counters.mmf_drops, "shared memory buffer dropped events");
        }
        Ok(status)
    }

    /// Drain until a drain comes back less than full, discarding the events.
    /// Returns the number of events skipped.
    pub fn drain_backlog(&mut self) -> Result<u64> {
        let span = span!(Level::INFO, "backlog_drain");
        let _enter = span.enter();
        let mut backlog = 0u64;
        loop {
            self.drain()?;
            let n = self.buf.len();
            backlog += n as u64;
            if n < self.capacity {
                break;
            }
        }
        self.buf.clear();
        self.demux.counters_mut().backlog += backlog;
        info!(backlog, "read backlog before main loop");
        Ok(backlog)
    }

    /// Drain once and dispatch every event, in order. Returns the number of
    /// events drained.
    pub fn poll_once(&mut self, sink: &mut impl RecordSink<D::Mode>) -> Result<usize> {
        let status = self.drain()?;
        let spikes = self.demux.counters().spikes;
        self.demux.dispatch(&self.buf, sink).map_err(Error::Sink)?;
        let n = self.buf.len();
        debug!(
            poll = self.demux.counters().polls,
            events = n,
            poll_time = status.poll_time.as_u64(),
            "drained"
        );
        if self.demux.counters().spikes == spikes {
            debug!("no spikes");
        }
        Ok(n)
    }

    /// Drain the backlog, then poll until a stop command, the session limit,
    /// or the end of a finite source. A notify-mode timeout ends the loop
    /// with [`Error::Stall`]. Either way the packet in progress is flushed
    /// if its mode is known.
    pub fn run(&mut self, sink: &mut impl RecordSink<D::Mode>) -> Result<Counters> {
        self.drain_backlog()?;

        let span = span!(Level::INFO, "poll_loop");
        let _enter = span.enter();
        let start = Instant::now();
        let mut steady_polls = 0u64;
        let result = loop {
            let last_tick = Instant::now();
            if !self.paused {
                if let Err(e) = self.poll_once(sink) {
                    break Err(e);
                }
                steady_polls += 1;
            }
            if self.stop_requested(start, steady_polls) {
                break Ok(());
            }
            match timer::wait(&mut self.device, self.wait, last_tick) {
                Ok(WaitOutcome::Signaled) => {}
                Ok(WaitOutcome::TimedOut) => {
                    let timeout = match self.wait {
                        WaitMode::Notify(t) | WaitMode::Sleep(t) => t,
                    };
                    error!(?timeout, "timed out waiting for device");
                    break Err(Error::Stall { timeout });
                }
                Err(e) => break Err(Error::Device(e)),
            }
        };

        if self.demux.flush(sink).map_err(Error::Sink)? {
            debug!("flushed final packet");
        }
        info!(polls = steady_polls, elapsed = ?start.elapsed(), "poll loop finished");
        result.map(|()| *self.demux.counters())
    }

    fn stop_requested(&mut self, start: Instant, steady_polls: u64) -> bool {
        if let Some(rx) = &self.control {
            while let Ok(c) = rx.try_recv() {
                match c {
                    Control::Pause => self.paused = true,
                    Control::Resume => self.paused = false,
                    Control::Stop => {
                        info!("stop requested");
                        return true;
                    }
                }
            }
        }
        match self.limit {
            Some(SessionLimit::Polls(n)) if steady_polls >= n => return true,
            Some(SessionLimit::Duration(d)) if start.elapsed() >= d => return true,
            _ => {}
        }
        if self.device.exhausted() {
            info!("device has no more data");
            return true;
        }
        false
    }
}
