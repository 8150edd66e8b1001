//! Bounded Transition Log
//!
//! ## Overview
//!
//! The event log holds every accepted state transition until a batch
//! containing it is acknowledged by the cloud. It is a FIFO with a hard upper
//! bound fixed at compile time through a const generic, so the memory cost is
//! known before the firmware is flashed.
//!
//! ## Design Rationale
//!
//! ### Overflow Is a Declared Policy
//!
//! When the network stays down long enough the log fills up and something has
//! to give. Which transition gets lost is a product decision, so it is
//! configuration rather than an accident of the data structure:
//!
//! | Policy        | On append while full          | Keeps                     |
//! |---------------|-------------------------------|---------------------------|
//! | `RejectNew`   | new transition discarded      | the oldest, unbroken run  |
//! | `EvictOldest` | oldest transition discarded   | the most recent history   |
//!
//! `RejectNew` is the default: the log stays a contiguous audit trail from the
//! last successful upload, and the gap is at its end where the diagnostic
//! that reported it also sits.
//!
//! Either way the caller gets a [`BufferOverflowError`] describing exactly
//! which transition was lost.
//!
//! ### Runtime Limit Below the Compiled Capacity
//!
//! `N` sizes the storage. A runtime `limit <= N` lets configuration lower the
//! effective capacity without recompiling, for example to force earlier
//! flushes in a test deployment.
//!
//! ## Memory Layout
//!
//! ```text
//! EventBuffer<100>:
//! ├── events: heapless::Deque<StateTransitionEvent, 100> = 1600 + 16 bytes
//! ├── limit: 8 bytes
//! └── policy: 1 byte (+ padding)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use motionsync_core::buffer::{EventBuffer, OverflowPolicy};
//! use motionsync_core::events::StateTransitionEvent;
//!
//! let mut log: EventBuffer<4> = EventBuffer::new();
//! log.push(StateTransitionEvent::new(0, 1, 1000)).unwrap();
//! log.push(StateTransitionEvent::new(1, 2, 2000)).unwrap();
//!
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.iter().next().map(|e| e.to), Some(1));
//! ```

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::errors::{BufferOverflowError, ConfigError};
use crate::events::StateTransitionEvent;

/// What to do when appending to a full log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the incoming transition
    #[default]
    RejectNew,
    /// Discard the oldest stored transition to make room
    EvictOldest,
}

/// Bounded, insertion-ordered log of transitions awaiting upload
///
/// ## Internal Invariants
///
/// - `1 <= limit <= N`
/// - `events.len() <= limit` after every operation
/// - Iteration order is insertion order
///
/// ## Thread Safety
///
/// Not thread-safe and not meant to be: the log is owned by the main loop.
/// The interrupt context never touches it.
#[derive(Debug, Clone)]
pub struct EventBuffer<const N: usize> {
    events: Deque<StateTransitionEvent, N>,
    limit: usize,
    policy: OverflowPolicy,
}

impl<const N: usize> EventBuffer<N> {
    /// Create an empty log using the full storage and rejecting on overflow
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
            limit: N,
            policy: OverflowPolicy::RejectNew,
        }
    }

    /// Create an empty log with a runtime limit and overflow policy
    pub fn with_limit(limit: usize, policy: OverflowPolicy) -> Result<Self, ConfigError> {
        if limit == 0 || limit > N {
            return Err(ConfigError::BufferCapacity { value: limit, max: N });
        }

        Ok(Self {
            events: Deque::new(),
            limit,
            policy,
        })
    }

    /// Append a transition
    ///
    /// Returns an error whenever a transition is lost. Under `EvictOldest`
    /// the new event *is* stored and the error carries the evicted one.
    pub fn push(&mut self, event: StateTransitionEvent) -> Result<(), BufferOverflowError> {
        if self.events.len() < self.limit {
            return self.events.push_back(event).map_err(|event| BufferOverflowError::Dropped {
                event,
                capacity: self.limit,
            });
        }

        match self.policy {
            OverflowPolicy::RejectNew => Err(BufferOverflowError::Dropped {
                event,
                capacity: self.limit,
            }),
            OverflowPolicy::EvictOldest => {
                let evicted = match self.events.pop_front() {
                    Some(evicted) => evicted,
                    // limit >= 1, so a full log is never empty
                    None => return Err(BufferOverflowError::Dropped { event, capacity: self.limit }),
                };
                self.events.push_back(event).map_err(|event| BufferOverflowError::Dropped {
                    event,
                    capacity: self.limit,
                })?;
                Err(BufferOverflowError::Evicted {
                    evicted,
                    capacity: self.limit,
                })
            }
        }
    }

    /// Number of stored transitions
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check if the next append would overflow
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.limit
    }

    /// Effective capacity
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Configured overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Oldest stored transition
    pub fn first(&self) -> Option<&StateTransitionEvent> {
        self.events.front()
    }

    /// Most recent stored transition
    pub fn last(&self) -> Option<&StateTransitionEvent> {
        self.events.back()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &StateTransitionEvent> + '_ {
        self.events.iter()
    }

    /// Drop every stored transition
    ///
    /// Only the sync scheduler calls this, and only after an acknowledged
    /// upload.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<const N: usize> Default for EventBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(i: u64) -> StateTransitionEvent {
        StateTransitionEvent::new((i % 2) as u8, ((i + 1) % 2) as u8, i * 100)
    }

    #[test]
    fn empty_buffer() {
        let buffer: EventBuffer<5> = EventBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 5);
        assert!(buffer.first().is_none());
    }

    #[test]
    fn keeps_insertion_order() {
        let mut buffer = EventBuffer::<4>::new();
        for i in 0..4 {
            buffer.push(ev(i)).unwrap();
        }

        let times: Vec<u64> = buffer.iter().map(|e| e.timestamp).collect();
        assert_eq!(times, vec![0, 100, 200, 300]);
        assert_eq!(buffer.last().map(|e| e.timestamp), Some(300));
    }

    #[test]
    fn reject_new_when_full() {
        let mut buffer = EventBuffer::<3>::new();
        for i in 0..3 {
            buffer.push(ev(i)).unwrap();
        }
        assert!(buffer.is_full());

        let err = buffer.push(ev(9)).unwrap_err();
        assert_eq!(err, BufferOverflowError::Dropped { event: ev(9), capacity: 3 });
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.last().map(|e| e.timestamp), Some(200));
    }

    #[test]
    fn evict_oldest_when_full() {
        let mut buffer = EventBuffer::<3>::with_limit(3, OverflowPolicy::EvictOldest).unwrap();
        for i in 0..3 {
            buffer.push(ev(i)).unwrap();
        }

        let err = buffer.push(ev(3)).unwrap_err();
        assert_eq!(err, BufferOverflowError::Evicted { evicted: ev(0), capacity: 3 });

        let times: Vec<u64> = buffer.iter().map(|e| e.timestamp).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn runtime_limit_below_storage() {
        let mut buffer = EventBuffer::<10>::with_limit(2, OverflowPolicy::RejectNew).unwrap();
        buffer.push(ev(0)).unwrap();
        buffer.push(ev(1)).unwrap();
        assert!(buffer.is_full());
        assert!(buffer.push(ev(2)).is_err());
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn invalid_limits_rejected() {
        assert_eq!(
            EventBuffer::<10>::with_limit(0, OverflowPolicy::RejectNew).unwrap_err(),
            ConfigError::BufferCapacity { value: 0, max: 10 }
        );
        assert!(EventBuffer::<10>::with_limit(11, OverflowPolicy::RejectNew).is_err());
    }

    #[test]
    fn clear_empties() {
        let mut buffer = EventBuffer::<4>::new();
        buffer.push(ev(0)).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.push(ev(1)).unwrap();
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn policy_wire_names() {
        let policy: OverflowPolicy = serde_json::from_str("\"evict_oldest\"").unwrap();
        assert_eq!(policy, OverflowPolicy::EvictOldest);
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::RejectNew);
    }
}
