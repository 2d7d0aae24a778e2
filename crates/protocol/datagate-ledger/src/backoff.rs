//! Exponential backoff schedule.
//!
//! Used between ledger call attempts and to space out grant obligation
//! resubmissions.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Doubling delay schedule, capped at `max`, with ±25% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    /// A schedule starting at `base` and never exceeding `max`.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// The schedule described by a retry configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.base_delay, config.max_delay)
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    ///
    /// Retry `0` is the first attempt and never waits.
    pub fn nominal(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (retry - 1).min(31);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// [`nominal`](Self::nominal) spread by up to a quarter either way.
    pub fn delay(&self, retry: u32) -> Duration {
        let nominal = self.nominal(retry);
        let ms = u64::try_from(nominal.as_millis()).unwrap_or(u64::MAX);
        let spread = ms / 4;
        if spread == 0 {
            return nominal;
        }
        let offset = rand::thread_rng().gen_range(0..=spread * 2);
        Duration::from_millis(ms - spread + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_nominal_doubles_until_cap() {
        let backoff = Backoff::new(ms(100), ms(1_000));
        assert_eq!(backoff.nominal(0), Duration::ZERO);
        assert_eq!(backoff.nominal(1), ms(100));
        assert_eq!(backoff.nominal(2), ms(200));
        assert_eq!(backoff.nominal(4), ms(800));
        assert_eq!(backoff.nominal(5), ms(1_000));
        assert_eq!(backoff.nominal(u32::MAX), ms(1_000));
    }

    #[test]
    fn test_delay_stays_within_jitter() {
        let backoff = Backoff::new(ms(400), ms(400));
        for _ in 0..100 {
            let delay = backoff.delay(3);
            assert!(delay >= ms(300) && delay <= ms(500), "{:?}", delay);
        }
    }

    #[test]
    fn test_max_below_base_is_raised() {
        let backoff = Backoff::new(ms(50), ms(10));
        assert_eq!(backoff.nominal(1), ms(50));
        assert_eq!(backoff.nominal(3), ms(50));
    }

    #[test]
    fn test_zero_base_never_waits() {
        let backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.delay(7), Duration::ZERO);
    }
}
