//! Throttled reference price.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use std::time::Duration;

/// Whether a value last refreshed at `last` is stale at `now`.
///
/// Never-refreshed values are always stale. A clock that went backwards
/// counts as fresh.
pub fn should_refresh(now: DateTime<Utc>, last: Option<DateTime<Utc>>, interval: Duration) -> bool {
    match last {
        None => true,
        Some(last) => match (now - last).to_std() {
            Ok(elapsed) => elapsed > interval,
            Err(_) => false,
        },
    }
}

/// Bounds of the randomized refresh interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    pub min: Duration,
    pub max: Duration,
}

impl Default for JitterRange {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2),
            max: Duration::from_secs(8),
        }
    }
}

impl JitterRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Draw an interval uniformly from `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Last reference price and when it was fetched.
#[derive(Debug, Clone)]
pub struct RefPriceCache {
    value: Option<Decimal>,
    last_refreshed: Option<DateTime<Utc>>,
    jitter: JitterRange,
}

impl RefPriceCache {
    pub fn new(jitter: JitterRange) -> Self {
        Self {
            value: None,
            last_refreshed: None,
            jitter,
        }
    }

    /// Whether the cached value must be fetched again, drawing a fresh
    /// interval from the jitter range on every check.
    pub fn needs_refresh<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> bool {
        self.value.is_none() || should_refresh(now, self.last_refreshed, self.jitter.sample(rng))
    }

    pub fn get(&self) -> Option<Decimal> {
        self.value
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn store(&mut self, value: Decimal, now: DateTime<Utc>) {
        self.value = Some(value);
        self.last_refreshed = Some(now);
    }
}

impl Default for RefPriceCache {
    fn default() -> Self {
        Self::new(JitterRange::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_should_refresh() {
        let interval = Duration::from_secs(5);
        assert!(should_refresh(at(0), None, interval));
        assert!(!should_refresh(at(5), Some(at(0)), interval));
        assert!(should_refresh(at(6), Some(at(0)), interval));
        assert!(!should_refresh(at(0), Some(at(10)), interval));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let range = JitterRange::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = range.sample(&mut rng);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(8));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let range = JitterRange::new(Duration::from_secs(3), Duration::from_secs(3));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(range.sample(&mut rng), Duration::from_secs(3));
    }

    #[test]
    fn test_cache_lifecycle() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut cache = RefPriceCache::default();
        assert!(cache.needs_refresh(at(0), &mut rng));

        cache.store(dec!(7000.5), at(100));
        assert_eq!(cache.get(), Some(dec!(7000.5)));
        assert_eq!(cache.last_refreshed(), Some(at(100)));

        // Inside the minimum interval: always fresh.
        assert!(!cache.needs_refresh(at(102), &mut rng));
        // Past the maximum interval: always stale.
        assert!(cache.needs_refresh(at(109), &mut rng));
    }
}
