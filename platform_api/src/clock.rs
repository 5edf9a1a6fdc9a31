//! Clocks

use core_types::{Duration, Instant};
use std::cell::Cell;
use std::rc::Rc;

/// Source of the current time for a manager
pub trait Clock {
    /// Returns the current instant
    fn now(&self) -> Instant;

    /// Waits for up to `duration` while nothing is ready
    ///
    /// Real clocks sleep; simulated clocks advance.
    fn idle(&self, duration: Duration);
}

/// Monotonic wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: std::time::Instant,
}

impl SystemClock {
    /// Longest single sleep in `idle`, so platform events are polled regularly
    const MAX_IDLE: Duration = Duration::from_millis(1);

    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        let elapsed: Duration = self.epoch.elapsed().into();
        Instant::EPOCH + elapsed
    }

    fn idle(&self, duration: Duration) {
        let nap = duration.min(Self::MAX_IDLE);
        if !nap.is_zero() {
            std::thread::sleep(nap.into());
        }
    }
}

/// Manually driven clock for deterministic tests
///
/// Clones share the same time, so a test can hold one handle while the
/// managers under test hold others.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances simulated time
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Jumps to `instant` if it lies in the future
    pub fn advance_to(&self, instant: Instant) {
        if instant > self.now.get() {
            self.now.set(instant);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn idle(&self, duration: Duration) {
        self.advance(duration);
    }
}
