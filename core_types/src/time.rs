//! Time abstractions
//!
//! Managers never read the wall clock directly. Delayed messages, slice
//! deadlines and exchange timeouts are all expressed in these types and
//! read through a clock, so tests can run on virtual time.

use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// A point in time
///
/// Nanoseconds since an arbitrary, clock-specific epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instant {
    nanos: u64,
}

impl Instant {
    /// The clock epoch
    pub const EPOCH: Instant = Instant { nanos: 0 };

    /// Creates an instant from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Returns nanoseconds since epoch
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Returns the duration since another instant (zero if `earlier` is later)
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Self::Output {
        Instant::from_nanos(self.nanos.saturating_add(duration.as_nanos()))
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, duration: Duration) -> Self::Output {
        Instant::from_nanos(self.nanos.saturating_sub(duration.as_nanos()))
    }
}

/// A span of time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration {
    nanos: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration { nanos: 0 };

    /// Creates a duration from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a duration from microseconds, saturating at the maximum
    pub const fn from_micros(micros: u64) -> Self {
        Self {
            nanos: micros.saturating_mul(1_000),
        }
    }

    /// Creates a duration from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis.saturating_mul(1_000_000),
        }
    }

    /// Creates a duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            nanos: secs.saturating_mul(1_000_000_000),
        }
    }

    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    pub const fn as_micros(&self) -> u64 {
        self.nanos / 1_000
    }

    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    pub const fn as_secs(&self) -> u64 {
        self.nanos / 1_000_000_000
    }

    pub const fn is_zero(&self) -> bool {
        self.nanos == 0
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Self::Output {
        Duration::from_nanos(self.nanos.saturating_add(other.nanos))
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Self::Output {
        Duration::from_nanos(self.nanos.saturating_sub(other.nanos))
    }
}

impl From<std::time::Duration> for Duration {
    fn from(duration: std::time::Duration) -> Self {
        Duration::from_nanos(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl From<Duration> for std::time::Duration {
    fn from(duration: Duration) -> Self {
        std::time::Duration::from_nanos(duration.as_nanos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_creation() {
        assert_eq!(Duration::from_secs(1), Duration::from_millis(1000));
        assert_eq!(Duration::from_millis(1), Duration::from_micros(1000));
        assert_eq!(Duration::from_micros(1), Duration::from_nanos(1000));
        assert!(Duration::ZERO.is_zero());
    }

    #[test]
    fn test_duration_creation_saturates() {
        assert_eq!(Duration::from_millis(u64::MAX).as_nanos(), u64::MAX);
        assert_eq!(Duration::from_micros(u64::MAX).as_nanos(), u64::MAX);
        assert_eq!(Duration::from_secs(u64::MAX).as_nanos(), u64::MAX);
        assert_eq!(Instant::from_nanos(5) + Duration::from_secs(u64::MAX), Instant::from_nanos(u64::MAX));
    }

    #[test]
    fn test_instant_default_is_epoch() {
        assert_eq!(Instant::default(), Instant::EPOCH);
    }

    #[test]
    fn test_duration_conversion() {
        let d = Duration::from_secs(1);
        assert_eq!(d.as_secs(), 1);
        assert_eq!(d.as_millis(), 1000);
        assert_eq!(d.as_micros(), 1_000_000);
        assert_eq!(d.as_nanos(), 1_000_000_000);
    }

    #[test]
    fn test_duration_arithmetic_saturates() {
        let d1 = Duration::from_millis(500);
        let d2 = Duration::from_millis(300);

        assert_eq!(d1 + d2, Duration::from_millis(800));
        assert_eq!(d1 - d2, Duration::from_millis(200));
        assert_eq!(d2 - d1, Duration::ZERO);
    }

    #[test]
    fn test_instant_arithmetic() {
        let i = Instant::from_nanos(1000);
        let d = Duration::from_nanos(500);

        assert_eq!(i + d, Instant::from_nanos(1500));
        assert_eq!(i - d, Instant::from_nanos(500));
        assert_eq!(Instant::from_nanos(u64::MAX) + d, Instant::from_nanos(u64::MAX));
    }

    #[test]
    fn test_instant_duration_since() {
        let i1 = Instant::from_nanos(1000);
        let i2 = Instant::from_nanos(2000);
        assert_eq!(i2.duration_since(i1), Duration::from_nanos(1000));
        assert_eq!(i1.duration_since(i2), Duration::ZERO);
    }

    #[test]
    fn test_std_duration_conversion() {
        let std_d = std::time::Duration::from_millis(15);
        let d: Duration = std_d.into();
        assert_eq!(d.as_millis(), 15);
        let back: std::time::Duration = d.into();
        assert_eq!(back, std_d);
    }
}
