//! Time Source Abstraction for Embedded Systems
//!
//! The pipeline only ever measures intervals (sync windows, poll pacing, send
//! deadlines) and stamps transitions, so a monotonic millisecond counter is
//! all it needs.
//!
//! ## Common Implementations
//!
//! - `MonotonicClock`: `std::time::Instant` based, for hosted builds
//! - `MockTimeSource`: controllable time for deterministic tests
//! - Hardware timers: implement the trait over an RTC or SysTick counter

use crate::time::Timestamp;

/// Source of time for the system
///
/// ## Implementation Requirements
///
/// - Must never go backwards
/// - Must be callable from the main context without blocking
/// - Wraparound of narrow hardware counters must be extended to 64 bits by
///   the implementation
///
/// ## Example Implementation
///
/// ```rust
/// use motionsync_core::traits::TimeSource;
/// use motionsync_core::time::Timestamp;
///
/// struct SysTickClock {
///     // ... tick counter extended to 64 bits
/// }
///
/// impl TimeSource for SysTickClock {
///     fn now(&self) -> Timestamp {
///         // Read the extended tick counter
///         0 // placeholder
///     }
/// }
/// ```
pub trait TimeSource {
    /// Milliseconds since an arbitrary fixed origin (usually boot)
    fn now(&self) -> Timestamp;

    /// Milliseconds elapsed since `earlier`, saturating at zero
    fn elapsed_since(&self, earlier: Timestamp) -> u64 {
        self.now().saturating_sub(earlier)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
