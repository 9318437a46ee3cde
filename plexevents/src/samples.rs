//! Per-sample timestamps for continuous blocks

use std::iter::FusedIterator;

use crate::rate::RateContext;

/// Iterator over `(value, ticks)` for each sample of a continuous block.
///
/// The first sample carries the block's own timestamp and every following
/// sample is one exact rate step later. Samples within a block are assumed
/// to be equally spaced at the continuous rate; that is up to the producer.
#[derive(Clone, Debug)]
pub struct SampleTimes<'a> {
    samples: std::slice::Iter<'a, i16>,
    next: u64,
    step: u64,
}

impl<'a> SampleTimes<'a> {
    pub fn new(samples: &'a [i16], timestamp: u64, step: u64) -> Self {
        SampleTimes {
            samples: samples.iter(),
            next: timestamp,
            step,
        }
    }

    /// Reconstruct the sample times of a block at the session's rates
    pub fn with_rates(samples: &'a [i16], timestamp: u64, rates: &RateContext) -> Self {
        SampleTimes::new(samples, timestamp, rates.sample_step())
    }
}

impl<'a> Iterator for SampleTimes<'a> {
    type Item = (i16, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let &value = self.samples.next()?;
        let time = self.next;
        // The step past the last sample is never yielded
        self.next = self.next.saturating_add(self.step);
        Some((value, time))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.samples.size_hint()
    }
}

impl<'a> ExactSizeIterator for SampleTimes<'a> {}

impl<'a> FusedIterator for SampleTimes<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_step_exactly() {
        for n in 0..64usize {
            for step in [1u64, 2, 8, 40] {
                let samples: Vec<i16> = (0..n as i16).collect();
                let t0 = 123_456;
                let times: Vec<u64> = SampleTimes::new(&samples, t0, step)
                    .map(|(_, t)| t)
                    .collect();
                let expected: Vec<u64> = (0..n as u64).map(|i| t0 + i * step).collect();
                assert_eq!(times, expected);
            }
        }
    }

    #[test]
    fn values_keep_order() {
        let samples = [-3, 7, 0, i16::MAX, i16::MIN];
        let values: Vec<i16> = SampleTimes::new(&samples, 0, 4).map(|(v, _)| v).collect();
        assert_eq!(values, samples);
    }

    #[test]
    fn block_at_forty_khz() {
        let rates = RateContext::new(25, 1000).unwrap();
        let samples = [10, 20, 30];
        let out: Vec<(i16, u64)> = SampleTimes::with_rates(&samples, 1000, &rates).collect();
        assert_eq!(out, vec![(10, 1000), (20, 1040), (30, 1080)]);
        let secs: Vec<f64> = out.iter().map(|&(_, t)| rates.seconds(t)).collect();
        assert_eq!(secs, vec![0.025, 0.026, 0.027]);
    }

    #[test]
    fn block_at_end_of_tick_range() {
        let out: Vec<(i16, u64)> = SampleTimes::new(&[1], u64::MAX - 10, 40).collect();
        assert_eq!(out, vec![(1, u64::MAX - 10)]);
        let out: Vec<(i16, u64)> = SampleTimes::new(&[1, 2], u64::MAX - 40, 40).collect();
        assert_eq!(out, vec![(1, u64::MAX - 40), (2, u64::MAX)]);
    }

    #[test]
    fn replay_restarts() {
        let samples = [1, 2];
        let it = SampleTimes::new(&samples, 5, 2);
        assert_eq!(it.len(), 2);
        let first: Vec<_> = it.clone().collect();
        let second: Vec<_> = it.collect();
        assert_eq!(first, second);
    }
}
