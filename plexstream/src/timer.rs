use anyhow::Result;
use plexevents::cfg::WaitMode;
use std::time::{Duration, Instant};

use crate::device::{DeviceService, WaitOutcome};

/// Time left of `budget` since `last_tick`
pub fn remaining(budget: Duration, last_tick: Instant) -> Duration {
    budget
        .checked_sub(last_tick.elapsed())
        .unwrap_or_else(|| Duration::from_secs(0))
}

/// The poll loop's only suspension point. In sleep mode, sleeps out the rest
/// of the budget counted from `last_tick`; in notify mode, blocks on the
/// device's data-ready signal.
pub fn wait<S: DeviceService + ?Sized>(
    device: &mut S,
    mode: WaitMode,
    last_tick: Instant,
) -> Result<WaitOutcome> {
    match mode {
        WaitMode::Sleep(budget) => {
            std::thread::sleep(remaining(budget, last_tick));
            Ok(WaitOutcome::Signaled)
        }
        WaitMode::Notify(timeout) => device.wait_for_more_data(timeout),
    }
}
