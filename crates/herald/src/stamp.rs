//! Timestamps and identifiers for dispatch results.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of result identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns an identifier for a result stamped at `now`.
    fn next_id(&self, now: DateTime<Utc>) -> u64;
}

/// Unix seconds followed by the decimal digits of a random value in
/// `1000..100000`.
///
/// Collisions are possible within one second; ids are for correlation only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRandomIds;

impl TimeRandomIds {
    fn compose(seconds: u64, random: u32) -> u64 {
        let shift = if random >= 10_000 { 100_000 } else { 10_000 };
        seconds.saturating_mul(shift).saturating_add(u64::from(random))
    }
}

impl IdGenerator for TimeRandomIds {
    fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let seconds = u64::try_from(now.timestamp()).unwrap_or(0);
        let random = rand::rng().random_range(1000..100_000);
        Self::compose(seconds, random)
    }
}

/// Counts up from a starting value.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a counter whose first id is `start`.
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, _now: DateTime<Utc>) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// A clock and an id generator, used together to stamp results.
#[derive(Clone)]
pub struct Stamper {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Stamper {
    /// Creates a stamper from explicit parts.
    pub fn new(clock: impl Clock + 'static, ids: impl IdGenerator + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            ids: Arc::new(ids),
        }
    }

    /// System clock with time-plus-random ids.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock, TimeRandomIds)
    }

    /// Returns the current time and a fresh id.
    #[must_use]
    pub fn stamp(&self) -> (DateTime<Utc>, u64) {
        let now = self.clock.now();
        (now, self.ids.next_id(now))
    }
}

impl Default for Stamper {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Stamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stamper").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_random_concatenates_digits() {
        assert_eq!(TimeRandomIds::compose(1_700_000_000, 1000), 17000000001000);
        assert_eq!(TimeRandomIds::compose(1_700_000_000, 99_999), 170000000099999);
    }

    #[test]
    fn test_time_random_prefix_is_unix_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = TimeRandomIds.next_id(now).to_string();
        let seconds = now.timestamp().to_string();

        assert!(id.starts_with(&seconds));
        let suffix: u32 = id[seconds.len()..].parse().unwrap();
        assert!((1000..100_000).contains(&suffix));
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::starting_at(7);
        let now = Utc::now();
        assert_eq!(ids.next_id(now), 7);
        assert_eq!(ids.next_id(now), 8);
    }

    #[test]
    fn test_fixed_stamper() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let stamper = Stamper::new(FixedClock(at), SequentialIds::starting_at(42));
        assert_eq!(stamper.stamp(), (at, 42));
        assert_eq!(stamper.stamp(), (at, 43));
    }
}
