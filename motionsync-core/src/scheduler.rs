//! Sync Scheduler
//!
//! ## Overview
//!
//! Decides when the event log is uploaded and owns the at-least-once
//! delivery contract with the cloud sink. It is polled once per main-loop
//! iteration; nothing here is event-driven.
//!
//! ## Triggers
//!
//! ```text
//!                    ┌──────────────────────────────┐
//! now - last_attempt │ >= interval        → Interval │
//!                    │ log full, healthy  → Full     │──► flush
//! flush_now()        │                    → Manual   │
//!                    └──────────────────────────────┘
//! ```
//!
//! - **Interval**: the sync interval (5 minutes by default) has passed since
//!   the last upload attempt. Reaching the interval exactly counts, so a
//!   window of 300 000 ms fires at the 300 000th millisecond.
//! - **BufferFull**: optional. Fires as soon as the log is full, but only
//!   while the link is healthy (no failure since the last success). During an
//!   outage the full-log trigger would otherwise retry on every loop
//!   iteration.
//! - **Manual**: explicit `flush_now()`, e.g. before a planned power-down.
//!
//! ## Delivery Contract
//!
//! | Result               | Log           | `last_transmission` | Next attempt        |
//! |----------------------|---------------|---------------------|---------------------|
//! | success within time  | cleared       | flush time          | one interval later  |
//! | failure or timeout   | untouched     | unchanged           | one interval later  |
//! | empty log            | untouched     | unchanged           | one interval later  |
//!
//! A failed batch is resent on the next window together with anything
//! recorded since, so delivery is at-least-once. When an acknowledgment is
//! lost after the remote write succeeded, the same events arrive twice.
//!
//! ## Deadline
//!
//! The sink call is the only place the main loop blocks. The scheduler passes
//! the deadline to the sink and measures the call; a call that returns after
//! the deadline is a failure even if the sink claims success.

use crate::buffer::EventBuffer;
use crate::errors::TransmissionError;
use crate::payload::BatchPayload;
use crate::time::Timestamp;
use crate::traits::{CloudSink, TimeSource};

/// Why a flush was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Sync interval elapsed
    Interval,
    /// Log reached capacity
    BufferFull,
    /// Explicit request
    Manual,
}

/// Result of one scheduler poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No trigger fired
    Idle,
    /// Trigger fired with nothing to send; the sink was not called
    Empty(FlushTrigger),
    /// Batch acknowledged and log cleared
    Delivered {
        /// What started the flush
        trigger: FlushTrigger,
        /// Events in the acknowledged batch
        events: usize,
    },
    /// Batch not acknowledged; log retained for the next window
    Failed {
        /// What started the flush
        trigger: FlushTrigger,
        /// Why delivery failed
        error: TransmissionError,
    },
}

/// Scheduler counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    /// Sink calls made
    pub attempts: u32,
    /// Acknowledged batches
    pub successes: u32,
    /// Failed batches (including timeouts)
    pub failures: u32,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Events acknowledged by the sink
    pub events_delivered: u32,
    /// Triggers that found an empty log
    pub empty_triggers: u32,
}

/// Timer/capacity-triggered uploader
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval_ms: u64,
    timeout_ms: u32,
    flush_on_full: bool,
    last_transmission: Timestamp,
    last_attempt: Timestamp,
    stats: SyncStats,
}

impl SyncScheduler {
    /// Create a scheduler whose first window starts at `start`
    pub fn new(start: Timestamp, interval_ms: u64, timeout_ms: u32, flush_on_full: bool) -> Self {
        Self {
            interval_ms,
            timeout_ms,
            flush_on_full,
            last_transmission: start,
            last_attempt: start,
            stats: SyncStats::default(),
        }
    }

    /// Which trigger, if any, fires at `now`
    pub fn due(&self, now: Timestamp, buffer_full: bool) -> Option<FlushTrigger> {
        if now.saturating_sub(self.last_attempt) >= self.interval_ms {
            Some(FlushTrigger::Interval)
        } else if self.flush_on_full && buffer_full && self.stats.consecutive_failures == 0 {
            Some(FlushTrigger::BufferFull)
        } else {
            None
        }
    }

    /// Check triggers and flush if one fires
    pub fn poll<const N: usize, K, T>(&mut self, clock: &T, buffer: &mut EventBuffer<N>, sink: &mut K) -> SyncOutcome
    where
        K: CloudSink,
        T: TimeSource + ?Sized,
    {
        match self.due(clock.now(), buffer.is_full()) {
            Some(trigger) => self.flush(trigger, clock, buffer, sink),
            None => SyncOutcome::Idle,
        }
    }

    /// Flush immediately regardless of triggers
    pub fn flush_now<const N: usize, K, T>(&mut self, clock: &T, buffer: &mut EventBuffer<N>, sink: &mut K) -> SyncOutcome
    where
        K: CloudSink,
        T: TimeSource + ?Sized,
    {
        self.flush(FlushTrigger::Manual, clock, buffer, sink)
    }

    fn flush<const N: usize, K, T>(
        &mut self,
        trigger: FlushTrigger,
        clock: &T,
        buffer: &mut EventBuffer<N>,
        sink: &mut K,
    ) -> SyncOutcome
    where
        K: CloudSink,
        T: TimeSource + ?Sized,
    {
        let flush_time = clock.now();
        self.last_attempt = flush_time;

        if buffer.is_empty() {
            self.stats.empty_triggers = self.stats.empty_triggers.wrapping_add(1);
            diag_debug!("sync window at {} with empty log, skipping upload", flush_time);
            return SyncOutcome::Empty(trigger);
        }

        let event_count = buffer.len();
        self.stats.attempts = self.stats.attempts.wrapping_add(1);

        let result = BatchPayload::new(buffer, self.last_transmission, flush_time)
            .to_json()
            .and_then(|payload| self.send(clock, sink, &payload, event_count));

        match result {
            Ok(()) => {
                buffer.clear();
                self.last_transmission = flush_time;
                self.stats.successes = self.stats.successes.wrapping_add(1);
                self.stats.events_delivered = self.stats.events_delivered.wrapping_add(event_count as u32);
                self.stats.consecutive_failures = 0;
                diag_info!("uploaded {} transitions", event_count);
                SyncOutcome::Delivered {
                    trigger,
                    events: event_count,
                }
            }
            Err(error) => {
                self.stats.failures = self.stats.failures.wrapping_add(1);
                self.stats.consecutive_failures = self.stats.consecutive_failures.wrapping_add(1);
                diag_warn!(
                    "upload of {} transitions failed ({} in a row), retrying next window",
                    event_count, self.stats.consecutive_failures
                );
                SyncOutcome::Failed { trigger, error }
            }
        }
    }

    fn send<K, T>(&self, clock: &T, sink: &mut K, payload: &[u8], event_count: usize) -> Result<(), TransmissionError>
    where
        K: CloudSink,
        T: TimeSource + ?Sized,
    {
        let started = clock.now();
        let result = sink.send_batch(payload, self.timeout_ms);
        let elapsed_ms = clock.elapsed_since(started);

        if result.is_err() {
            return Err(TransmissionError::Rejected {
                event_count,
                reason: "sink reported failure",
            });
        }

        if elapsed_ms > u64::from(self.timeout_ms) {
            return Err(TransmissionError::DeadlineExceeded {
                elapsed_ms,
                timeout_ms: self.timeout_ms,
            });
        }

        Ok(())
    }

    /// End of the last acknowledged upload
    pub fn last_transmission(&self) -> Timestamp {
        self.last_transmission
    }

    /// Start of the last flush attempt (or the window start)
    pub fn last_attempt(&self) -> Timestamp {
        self.last_attempt
    }

    /// Configured interval
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Counters
    pub fn stats(&self) -> SyncStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StateTransitionEvent;
    use crate::time::MockTimeSource;

    #[derive(Default)]
    struct CountingSink {
        calls: usize,
        fail: bool,
    }

    impl CloudSink for CountingSink {
        type Error = ();

        fn send_batch(&mut self, _payload: &[u8], _timeout_ms: u32) -> Result<(), ()> {
            self.calls += 1;
            if self.fail { Err(()) } else { Ok(()) }
        }
    }

    fn log_with(n: u64) -> EventBuffer<100> {
        let mut log = EventBuffer::new();
        for i in 0..n {
            log.push(StateTransitionEvent::new(0, 1, i)).unwrap();
        }
        log
    }

    #[test]
    fn interval_trigger() {
        let scheduler = SyncScheduler::new(0, 1000, 100, false);
        assert_eq!(scheduler.due(999, false), None);
        assert_eq!(scheduler.due(1000, false), Some(FlushTrigger::Interval));
    }

    #[test]
    fn full_trigger_only_when_enabled() {
        let enabled = SyncScheduler::new(0, 1000, 100, true);
        assert_eq!(enabled.due(10, true), Some(FlushTrigger::BufferFull));
        assert_eq!(enabled.due(10, false), None);

        let disabled = SyncScheduler::new(0, 1000, 100, false);
        assert_eq!(disabled.due(10, true), None);
    }

    #[test]
    fn success_clears_and_stamps() {
        let clock = MockTimeSource::new(5000);
        let mut scheduler = SyncScheduler::new(0, 1000, 100, false);
        let mut log = log_with(3);
        let mut sink = CountingSink::default();

        let outcome = scheduler.poll(&clock, &mut log, &mut sink);
        assert_eq!(outcome, SyncOutcome::Delivered { trigger: FlushTrigger::Interval, events: 3 });
        assert!(log.is_empty());
        assert_eq!(scheduler.last_transmission(), 5000);
        assert_eq!(scheduler.stats().events_delivered, 3);
    }

    #[test]
    fn failure_retains_and_waits_an_interval() {
        let clock = MockTimeSource::new(1000);
        let mut scheduler = SyncScheduler::new(0, 1000, 100, false);
        let mut log = log_with(2);
        let mut sink = CountingSink { fail: true, ..Default::default() };

        assert!(matches!(
            scheduler.poll(&clock, &mut log, &mut sink),
            SyncOutcome::Failed { error: TransmissionError::Rejected { event_count: 2, .. }, .. }
        ));
        assert_eq!(log.len(), 2);
        assert_eq!(scheduler.last_transmission(), 0);

        clock.advance(500);
        assert_eq!(scheduler.poll(&clock, &mut log, &mut sink), SyncOutcome::Idle);
        assert_eq!(sink.calls, 1);

        clock.advance(500);
        scheduler.poll(&clock, &mut log, &mut sink);
        assert_eq!(sink.calls, 2);
        assert_eq!(scheduler.stats().consecutive_failures, 2);
    }

    #[test]
    fn empty_log_skips_sink() {
        let clock = MockTimeSource::new(2000);
        let mut scheduler = SyncScheduler::new(0, 1000, 100, true);
        let mut log = EventBuffer::<100>::new();
        let mut sink = CountingSink::default();

        assert_eq!(
            scheduler.poll(&clock, &mut log, &mut sink),
            SyncOutcome::Empty(FlushTrigger::Interval)
        );
        assert_eq!(sink.calls, 0);
        assert_eq!(scheduler.last_transmission(), 0);
    }

    #[test]
    fn full_trigger_suspended_after_failure() {
        let clock = MockTimeSource::new(10);
        let mut scheduler = SyncScheduler::new(0, 1000, 100, true);
        let mut log = log_with(100);
        let mut sink = CountingSink { fail: true, ..Default::default() };

        assert!(matches!(
            scheduler.poll(&clock, &mut log, &mut sink),
            SyncOutcome::Failed { trigger: FlushTrigger::BufferFull, .. }
        ));

        clock.advance(1);
        assert_eq!(scheduler.poll(&clock, &mut log, &mut sink), SyncOutcome::Idle);
        assert_eq!(sink.calls, 1);
    }
}
