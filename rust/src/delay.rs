//! Pauses between portal calls so the request rate stays below the
//! portal's abuse detection.

use crate::config::DelayConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

pub trait Delay {
    fn pause(&mut self);
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn pause(&mut self) {
        (**self).pause()
    }
}

/// Sleeps for a uniformly random number of milliseconds from `range`.
pub struct JitterDelay<R> {
    rng: R,
    range: RangeInclusive<u64>,
}

impl<R: Rng> JitterDelay<R> {
    /// `config` must have `min_ms <= max_ms`; `Config` validates this on load.
    pub fn new(rng: R, config: &DelayConfig) -> Self {
        JitterDelay {
            rng,
            range: config.range(),
        }
    }

    pub fn next_interval(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.range.clone()))
    }
}

impl JitterDelay<StdRng> {
    pub fn from_entropy(config: &DelayConfig) -> Self {
        JitterDelay::new(StdRng::from_entropy(), config)
    }

    pub fn seeded(seed: u64, config: &DelayConfig) -> Self {
        JitterDelay::new(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> Delay for JitterDelay<R> {
    fn pause(&mut self) {
        let interval = self.next_interval();
        debug!(millis = interval.as_millis() as u64, "pausing before next request");
        std::thread::sleep(interval);
    }
}

pub struct NoDelay;

impl Delay for NoDelay {
    fn pause(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_stay_in_range() {
        let mut delay = JitterDelay::seeded(7, &DelayConfig::default());
        for _ in 0..1000 {
            let millis = delay.next_interval().as_millis();
            assert!((100..=1099).contains(&millis), "{} out of range", millis);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let config = DelayConfig::default();
        let mut a = JitterDelay::seeded(42, &config);
        let mut b = JitterDelay::seeded(42, &config);
        for _ in 0..20 {
            assert_eq!(a.next_interval(), b.next_interval());
        }
    }

    #[test]
    fn test_degenerate_range_is_fixed() {
        let config = DelayConfig {
            min_ms: 0,
            max_ms: 0,
        };
        let mut delay = JitterDelay::seeded(1, &config);
        assert_eq!(delay.next_interval(), Duration::ZERO);
        delay.pause();
    }
}
