//! Interrupt-to-Main-Loop Handoff
//!
//! ## Overview
//!
//! The classifier raises its interrupt line whenever it finishes an
//! inference. The interrupt handler must finish in bounded time and must not
//! touch anything the main loop owns, so the only thing it does is post a
//! single "classification pending" flag:
//!
//! ```text
//! Interrupt context                   Main loop
//!      ↓                                  ↓
//!  EdgeDetector::on_rising_edge()     MotionNotifier::take()
//!      ↓                                  ↓
//!  pending.store(true) ──► AtomicBool ──► pending.swap(false)
//!      ↓                                  ↓
//!  never blocks                       reads classifier, filters, records
//! ```
//!
//! ## Coalescing
//!
//! The flag is one bit, not a queue. If the classifier fires three times
//! before the main loop drains the flag, the main loop sees one notification
//! and reads the register once, so intermediate classifications are never
//! observed. This is an accepted limitation; the counters below make it
//! visible:
//!
//! ```text
//! coalesced = raised - consumed - (1 if still pending)
//! ```
//!
//! ## Memory Ordering
//!
//! - **Release** on set: everything the interrupt did before is visible to the
//!   consumer that observes the flag
//! - **Acquire** on take: pairs with the release above
//! - **Relaxed** for statistics that don't affect correctness
//!
//! ## Example Usage
//!
//! ```rust
//! use motionsync_core::notify::MotionNotifier;
//!
//! static NOTIFIER: MotionNotifier = MotionNotifier::new();
//!
//! // Interrupt handler for the classifier INT1 line
//! fn int1_isr() {
//!     NOTIFIER.edge_detector().on_rising_edge();
//! }
//!
//! // Main loop
//! fn poll() {
//!     if NOTIFIER.take() {
//!         // read the classifier output register
//!     }
//! }
//! # int1_isr();
//! # poll();
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Single-slot notification shared by the interrupt and the main loop
///
/// Usable from a `static`; holds no data other than the flag and counters.
#[derive(Debug)]
pub struct MotionNotifier {
    /// Set by the interrupt, cleared by the consumer
    pending: AtomicBool,
    /// Rising edges seen by the interrupt handler
    raised: AtomicU32,
    /// Notifications observed by the main loop
    consumed: AtomicU32,
}

/// Snapshot of notifier counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifierStats {
    /// Rising edges seen by the interrupt handler
    pub raised: u32,
    /// Notifications observed by the main loop
    pub consumed: u32,
    /// Edges that were folded into an already-pending notification
    pub coalesced: u32,
}

impl MotionNotifier {
    /// Create a notifier with nothing pending
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            raised: AtomicU32::new(0),
            consumed: AtomicU32::new(0),
        }
    }

    /// Post a notification
    ///
    /// Constant time, no allocation, no I/O. Safe to call from an interrupt.
    pub fn signal(&self) {
        self.raised.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending notification, if any
    ///
    /// Returns `true` at most once per posted notification, no matter how many
    /// edges were folded into it.
    pub fn take(&self) -> bool {
        let was_pending = self.pending.swap(false, Ordering::Acquire);
        if was_pending {
            self.consumed.fetch_add(1, Ordering::Relaxed);
        }
        was_pending
    }

    /// Peek without consuming
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Handle restricted to posting, for the interrupt side
    pub fn edge_detector(&self) -> EdgeDetector<'_> {
        EdgeDetector { notifier: self }
    }

    /// Current counters
    pub fn stats(&self) -> NotifierStats {
        let raised = self.raised.load(Ordering::Relaxed);
        let consumed = self.consumed.load(Ordering::Relaxed);
        let outstanding = u32::from(self.is_pending());

        NotifierStats {
            raised,
            consumed,
            coalesced: raised.saturating_sub(consumed).saturating_sub(outstanding),
        }
    }
}

impl Default for MotionNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-side view of a [`MotionNotifier`]
///
/// Can only post. Handing this (instead of the notifier) to interrupt setup
/// code keeps the consumer API out of interrupt context.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector<'a> {
    notifier: &'a MotionNotifier,
}

impl<'a> EdgeDetector<'a> {
    /// Wrap a notifier
    pub fn new(notifier: &'a MotionNotifier) -> Self {
        Self { notifier }
    }

    /// Rising edge on the "classification ready" line
    pub fn on_rising_edge(&self) {
        self.notifier.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_flag() {
        let notifier = MotionNotifier::new();
        assert!(!notifier.take());

        notifier.signal();
        assert!(notifier.is_pending());
        assert!(notifier.take());
        assert!(!notifier.take());
    }

    #[test]
    fn rapid_edges_coalesce() {
        let notifier = MotionNotifier::new();
        let detector = notifier.edge_detector();

        detector.on_rising_edge();
        detector.on_rising_edge();
        detector.on_rising_edge();

        assert!(notifier.take());
        assert!(!notifier.take());

        let stats = notifier.stats();
        assert_eq!(stats.raised, 3);
        assert_eq!(stats.consumed, 1);
        assert_eq!(stats.coalesced, 2);
    }

    #[test]
    fn pending_edge_not_counted_as_coalesced() {
        let notifier = MotionNotifier::new();
        notifier.signal();

        let stats = notifier.stats();
        assert_eq!(stats.coalesced, 0);
        assert!(notifier.is_pending());
    }

    #[test]
    fn usable_from_static() {
        static NOTIFIER: MotionNotifier = MotionNotifier::new();
        NOTIFIER.edge_detector().on_rising_edge();
        assert!(NOTIFIER.take());
    }

    #[test]
    fn edge_from_another_thread_is_observed() {
        use std::sync::Arc;

        let notifier = Arc::new(MotionNotifier::new());
        let producer = Arc::clone(&notifier);

        std::thread::spawn(move || {
            for _ in 0..1000 {
                producer.signal();
            }
        })
        .join()
        .unwrap();

        assert!(notifier.take());
        let stats = notifier.stats();
        assert_eq!(stats.raised, 1000);
        assert_eq!(stats.consumed + stats.coalesced, 1000);
    }
}
