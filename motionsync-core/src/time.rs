//! Time management for edge devices
//!
//! Provides the millisecond timestamp type and the clocks shipped with the
//! crate:
//! - Monotonic clock over `std::time::Instant` (hosted builds)
//! - Mock clock for tests and simulations

use core::cell::Cell;

pub use crate::traits::TimeSource;

/// Monotonic milliseconds since device boot
pub type Timestamp = u64;

/// Monotonic clock backed by `std::time::Instant`
///
/// Starts at 0 when created, always increases.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

/// Controllable time source for testing
///
/// Interior mutability lets a test advance time through a shared reference
/// while the pipeline holds another one.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    now_ms: Cell<Timestamp>,
}

impl MockTimeSource {
    /// Create a mock clock starting at `start`
    pub const fn new(start: Timestamp) -> Self {
        Self { now_ms: Cell::new(start) }
    }

    /// Jump to an absolute time
    ///
    /// Monotonicity is the caller's responsibility.
    pub fn set(&self, timestamp: Timestamp) {
        self.now_ms.set(timestamp);
    }

    /// Move time forward
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_advances() {
        let time = MockTimeSource::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
        assert_eq!(time.elapsed_since(1200), 300);
    }

    #[test]
    fn elapsed_saturates() {
        let time = MockTimeSource::new(100);
        assert_eq!(time.elapsed_since(500), 0);
    }

    #[test]
    fn shared_reference_is_a_time_source() {
        let time = MockTimeSource::new(7);
        let by_ref: &MockTimeSource = &time;
        time.advance(3);
        assert_eq!(TimeSource::now(&by_ref), 10);
    }

    #[cfg(feature = "std")]
    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
