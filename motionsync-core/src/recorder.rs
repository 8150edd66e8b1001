//! Event Recorder
//!
//! Turns changes of the stable state into timestamped transition records and
//! appends them to the bounded log.
//!
//! ## Rules
//!
//! - The first stable state ever seen is a baseline, not a transition: there
//!   is nothing to transition *from*.
//! - A record is created only when the new stable state differs from the last
//!   one the recorder saw. Neither side can be the sentinel, because the
//!   filter never reports it as a stable state.
//! - The recorder's notion of "previous state" follows the device even when a
//!   record is lost to overflow. After `5 → 7` is dropped, a later return to
//!   `5` is still recorded as `7 → 5`; the log shows the gap rather than an
//!   invented `5 → 5`.
//!
//! ## Overflow Diagnostics
//!
//! Every lost record emits a warning and bumps a counter. Nothing is
//! propagated further; the sync path never sees overflow.

use crate::buffer::{EventBuffer, OverflowPolicy};
use crate::errors::{BufferOverflowError, ConfigError};
use crate::events::{StateCode, StateTransitionEvent};
use crate::time::Timestamp;

/// Outcome of offering a stable state to the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No stable state yet
    NoState,
    /// First stable state; recorded as the baseline, no event
    Baseline(StateCode),
    /// Same state as last time
    NoChange,
    /// Transition appended to the log
    Recorded(StateTransitionEvent),
    /// Transition seen but a record was lost to overflow
    Overflow(BufferOverflowError),
}

/// Recorder counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecorderStats {
    /// Transitions detected (stored or not)
    pub transitions: u32,
    /// New transitions discarded because the log was full
    pub dropped: u32,
    /// Old transitions evicted to make room
    pub evicted: u32,
}

impl RecorderStats {
    /// Transitions lost by either overflow policy
    pub fn lost(&self) -> u32 {
        self.dropped.saturating_add(self.evicted)
    }
}

/// Detects stable-state changes and logs them
#[derive(Debug, Clone)]
pub struct EventRecorder<const N: usize> {
    buffer: EventBuffer<N>,
    last_state: Option<StateCode>,
    stats: RecorderStats,
}

impl<const N: usize> EventRecorder<N> {
    /// Recorder over a full-size, reject-new log
    pub const fn new() -> Self {
        Self {
            buffer: EventBuffer::new(),
            last_state: None,
            stats: RecorderStats {
                transitions: 0,
                dropped: 0,
                evicted: 0,
            },
        }
    }

    /// Recorder with a runtime capacity and overflow policy
    pub fn with_capacity(capacity: usize, policy: OverflowPolicy) -> Result<Self, ConfigError> {
        Ok(Self {
            buffer: EventBuffer::with_limit(capacity, policy)?,
            last_state: None,
            stats: RecorderStats::default(),
        })
    }

    /// Offer the filter's current stable state
    pub fn observe(&mut self, stable: Option<StateCode>, now: Timestamp) -> RecordOutcome {
        let Some(state) = stable else {
            return RecordOutcome::NoState;
        };

        let previous = match self.last_state {
            None => {
                self.last_state = Some(state);
                diag_info!("baseline motion state {}", state);
                return RecordOutcome::Baseline(state);
            }
            Some(previous) if previous == state => return RecordOutcome::NoChange,
            Some(previous) => previous,
        };

        self.last_state = Some(state);
        self.stats.transitions = self.stats.transitions.wrapping_add(1);

        let event = StateTransitionEvent::new(previous, state, now);
        match self.buffer.push(event) {
            Ok(()) => {
                diag_debug!("recorded transition {} -> {} at {}", previous, state, now);
                RecordOutcome::Recorded(event)
            }
            Err(err) => {
                match err {
                    BufferOverflowError::Dropped { capacity, .. } => {
                        self.stats.dropped = self.stats.dropped.wrapping_add(1);
                        diag_warn!(
                            "event log full ({}), dropped transition {} -> {} (dropped total {})",
                            capacity, previous, state, self.stats.dropped
                        );
                    }
                    BufferOverflowError::Evicted { evicted, capacity } => {
                        self.stats.evicted = self.stats.evicted.wrapping_add(1);
                        diag_warn!(
                            "event log full ({}), evicted transition {} -> {} (evicted total {})",
                            capacity, evicted.from, evicted.to, self.stats.evicted
                        );
                    }
                }
                RecordOutcome::Overflow(err)
            }
        }
    }

    /// Last stable state seen
    pub fn last_state(&self) -> Option<StateCode> {
        self.last_state
    }

    /// Pending transitions
    pub fn buffer(&self) -> &EventBuffer<N> {
        &self.buffer
    }

    /// Pending transitions, mutable (for the sync scheduler)
    pub fn buffer_mut(&mut self) -> &mut EventBuffer<N> {
        &mut self.buffer
    }

    /// Counters
    pub fn stats(&self) -> RecorderStats {
        self.stats
    }
}

impl<const N: usize> Default for EventRecorder<N> {
    fn default() -> Self {
        Self::new()
    }
}
