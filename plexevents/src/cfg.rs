//! Configuration tools: formats for declaring and recording sessions

use chrono::{DateTime, offset::Local};
use serde::{Serialize, Deserialize};
use std::time::Duration;

use crate::demux::{Counters, Outputs};
use crate::rate::TRACKING_RATE;
use crate::{Error, Result};

/// Largest number of events requested from the device service in one drain
pub const CAPACITY_DEFAULT: usize = 500_000;

/// Acquisition session specification, for both declaring and recording
/// sessions in JSON files.
///
/// ## Declaring a session
///
/// All fields are optional: specify only what makes sense. The `name` field
/// is free. A minimal declaration sets a `limit` (a human-readable duration
/// like `10min 30s`, or a number of polls); without one the session runs
/// until the device stalls or runs out of data.
///
/// ## Recording a session
///
/// When the session ends, the declaration is written back out with the
/// start `timestamp`, the wall-clock `duration`, and the final `counters`
/// (poll count included) filled in.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Session {
    pub name:                   String,
    pub timestamp:              Option<DateTime<Local>>,
    pub limit:                  Option<SessionLimit>,
    pub capacity:               Option<usize>,
    pub wait:                   Option<WaitMode>,
    pub tracking_rate:          Option<f64>,
    pub packet_words:           Option<usize>,
    #[serde(default = "emptyvec", skip_serializing_if = "Vec::is_empty")]
    pub continuous_channels:    Vec<u16>,
    pub outputs:                Option<Outputs>,
    #[serde(default, with = "humantime_serde")]
    pub duration:               Option<Duration>,
    pub counters:               Option<Counters>,
}

/// Either a fixed time duration or a number of steady-state polls.
/// Duration is parsed as in [humantime](https://docs.rs/humantime/), e.g.
/// `2min 30s` or `1h`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
pub enum SessionLimit {
    #[serde(with = "humantime_serde")]
    Duration(Duration),
    Polls(u64),
}

/// How the poll loop waits between drains
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
pub enum WaitMode {
    /// Sleep for a fixed budget, then drain whatever has arrived
    #[serde(with = "humantime_serde")]
    Sleep(Duration),
    /// Block on the device's data-ready notification; a timeout is fatal
    #[serde(with = "humantime_serde")]
    Notify(Duration),
}

impl Default for WaitMode {
    fn default() -> Self {
        WaitMode::Sleep(Duration::from_millis(200))
    }
}

impl WaitMode {
    pub fn notify_default() -> Self {
        WaitMode::Notify(Duration::from_secs(10))
    }
}

fn emptyvec<T>() -> Vec<T> {
    Vec::new()
}

/// Creates an empty Session. Defaults are applied by the accessors below.
impl Default for Session {
    fn default() -> Self {
        Session {
            name:                   String::new(),
            timestamp:              None,
            limit:                  None,
            capacity:               None,
            wait:                   None,
            tracking_rate:          None,
            packet_words:           None,
            continuous_channels:    Vec::new(),
            outputs:                None,
            duration:               None,
            counters:               None,
        }
    }
}

impl Session {
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(CAPACITY_DEFAULT)
    }

    pub fn wait(&self) -> WaitMode {
        self.wait.unwrap_or_default()
    }

    pub fn tracking_rate(&self) -> f64 {
        self.tracking_rate.unwrap_or(TRACKING_RATE)
    }

    pub fn packet_words(&self) -> usize {
        self.packet_words.unwrap_or(1)
    }

    pub fn outputs(&self) -> Outputs {
        self.outputs.unwrap_or_default()
    }

    /// Check the declared values that would otherwise fail at run time
    pub fn validate(&self) -> Result<()> {
        if self.capacity == Some(0) {
            return Err(Error::Config(String::from("capacity must be positive")));
        }
        if let Some(r) = self.tracking_rate {
            if !(r.is_finite() && r > 0.0) {
                return Err(Error::Config(format!("bad tracking rate {}", r)));
            }
        }
        if self.packet_words == Some(0) {
            return Err(Error::Config(String::from("packet_words must be positive")));
        }
        match self.wait() {
            WaitMode::Sleep(d) | WaitMode::Notify(d) if d.is_zero() => {
                Err(Error::Config(String::from("wait duration must be positive")))
            }
            _ => Ok(()),
        }
    }
}
