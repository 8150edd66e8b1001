//! Buffer Sizes and Memory Constraints
//!
//! Capacities for the transition log and the debounce history, sized for
//! microcontrollers with a few tens of KB of RAM.

// ===== EVENT LOG =====

/// Default transition log capacity (events).
///
/// Each transition record is 16 bytes:
/// - 100 events × 16 bytes = ~1.6KB
/// - At typical activity rates this covers hours of transitions,
///   well beyond several missed sync intervals
///
/// Source: nRF52840 RAM budget
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

// ===== DEBOUNCE WINDOW =====

/// Agreement count for the majority-of-3 consensus policy.
pub const MAJORITY_AGREEMENT: usize = 3;

/// Agreement count for immediate transitions (no debouncing).
pub const IMMEDIATE_AGREEMENT: usize = 1;

/// Largest agreement count the filter history can hold.
///
/// At 26 Hz, 8 readings is ~300ms of agreement; anything longer starts to
/// swallow short but genuine activity changes.
pub const MAX_AGREEMENT: usize = 8;
