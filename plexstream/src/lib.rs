pub mod device;
pub mod poll;
pub mod replay;
pub mod sim;
pub mod sink;
pub mod timer;

use argh::FromArgs;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, FromArgs, Clone)]
/// Drain events from a neural data acquisition device (or a recording of
/// one), demultiplex them, and print typed records as tab-separated values
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// session file (JSON); a session record is written next to it on exit
    #[argh(option, short = 'c')]
    pub config: Option<String>,
    /// replay raw events from a tab-separated recording ('-' for stdin)
    #[argh(option, short = 'r')]
    pub replay: Option<String>,
    /// timestamp tick in microseconds for replayed or synthetic data
    #[argh(option, default = "25")]
    pub tick: u32,
    /// continuous channel sample rate for replayed or synthetic data
    #[argh(option, default = "1000")]
    pub aux_rate: u32,
    /// seed for synthetic data (random if absent)
    #[argh(option)]
    pub seed: Option<u64>,
    /// events released per drain when replaying
    #[argh(option, default = "1000")]
    pub batch: usize,
    /// maximum events per drain (overrides the session)
    #[argh(option)]
    pub capacity: Option<usize>,
    /// stop after this many polls (overrides the session)
    #[argh(option, short = 'n')]
    pub polls: Option<u64>,
    /// write records here instead of standard output
    #[argh(option, short = 'o')]
    pub output: Option<String>,
    /// also save every drained raw event to this file, for later replay
    #[argh(option)]
    pub record: Option<String>,
}

/// Commands accepted by a running poll loop
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Control {
    Pause,
    Resume,
    Stop,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Unsupported tick, inexact rate ratio or a bad session; raised before
    /// the first drain
    #[error(transparent)]
    Config(#[from] plexevents::Error),

    #[error("no data signaled by the device for {timeout:?}")]
    Stall { timeout: Duration },

    #[error("device error: {0:#}")]
    Device(anyhow::Error),

    #[error("sink error: {0:#}")]
    Sink(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
