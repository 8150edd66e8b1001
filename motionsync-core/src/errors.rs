//! Error Types for the Motion Pipeline
//!
//! ## Design Philosophy
//!
//! Errors follow the same embedded constraints as the rest of the core:
//!
//! 1. **Small Size**: every variant carries a handful of integers at most.
//! 2. **No Heap Allocation**: messages are `&'static str`, never `String`.
//! 3. **Copy Semantics**: errors are returned from the main loop on every tick
//!    and stored in statistics, so they are `Copy`.
//! 4. **Local Handling**: each error is resolved by the component that raised
//!    it. Only [`ClassifierLoadError`] is fatal, and it surfaces before the
//!    pipeline exists.
//!
//! ## Error Categories
//!
//! | Error                  | Origin          | Resolution                          |
//! |------------------------|-----------------|-------------------------------------|
//! | `SensorReadError`      | classifier read | substituted by the sentinel code    |
//! | `BufferOverflowError`  | event recorder  | event dropped or oldest evicted     |
//! | `TransmissionError`    | sync scheduler  | batch retained, retried next window |
//! | `ClassifierLoadError`  | bring-up        | fatal, device halts                 |
//! | `ConfigError`          | configuration   | rejected before the pipeline starts |
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use motionsync_core::errors::TransmissionError;
//!
//! fn report(err: TransmissionError) {
//!     match err {
//!         TransmissionError::Rejected { .. } => {
//!             // Sink said no; the batch is still buffered
//!         }
//!         TransmissionError::DeadlineExceeded { .. } => {
//!             // Call ran long; treated exactly like a rejection
//!         }
//!         TransmissionError::Serialization => {
//!             // Payload could not be built; nothing was sent
//!         }
//!     }
//! }
//! ```

use thiserror_no_std::Error;

use crate::events::StateTransitionEvent;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Raw classifier read failed
///
/// Never escalated: the filter sees the sentinel instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorReadError {
    /// Bus transaction failed (NACK, arbitration loss, timeout)
    #[error("Classifier register read failed")]
    Bus,

    /// Register returned the all-ones code
    #[error("Classifier reported no valid output")]
    NoClassification,
}

/// Event log at capacity when a transition was recorded
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOverflowError {
    /// New event was discarded (reject-new policy)
    #[error("Event log full ({capacity}), dropped transition {} -> {}", .event.from, .event.to)]
    Dropped {
        /// The transition that could not be stored
        event: StateTransitionEvent,
        /// Configured capacity of the log
        capacity: usize,
    },

    /// Oldest event was evicted to make room (evict-oldest policy)
    #[error("Event log full ({capacity}), evicted transition {} -> {}", .evicted.from, .evicted.to)]
    Evicted {
        /// The transition that was pushed out of the log
        evicted: StateTransitionEvent,
        /// Configured capacity of the log
        capacity: usize,
    },
}

/// Batch delivery failed
///
/// The scheduler keeps the buffer intact on every variant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionError {
    /// Sink reported failure
    #[error("Sink rejected batch of {event_count} events: {reason}")]
    Rejected {
        /// Events in the rejected batch
        event_count: usize,
        /// Short description from the sink adapter
        reason: &'static str,
    },

    /// Sink call returned after its deadline
    #[error("Sink call took {elapsed_ms}ms, deadline {timeout_ms}ms")]
    DeadlineExceeded {
        /// Measured duration of the call
        elapsed_ms: u64,
        /// Configured deadline
        timeout_ms: u32,
    },

    /// Batch payload could not be serialized
    #[error("Failed to serialize batch payload")]
    Serialization,
}

/// Classifier program failed to load at startup
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Classifier program load failed at line {line} (register 0x{address:02x})")]
pub struct ClassifierLoadError {
    /// Zero-based index of the failing program line
    pub line: usize,
    /// Register address the failing line targeted
    pub address: u8,
}

/// Invalid pipeline configuration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Agreement count outside the supported window
    #[error("Agreement count {value} outside [1, {max}]")]
    AgreementCount {
        /// Requested agreement count
        value: usize,
        /// Largest supported count
        max: usize,
    },

    /// Buffer capacity outside the compiled-in storage
    #[error("Buffer capacity {value} outside [1, {max}]")]
    BufferCapacity {
        /// Requested capacity
        value: usize,
        /// Compiled-in storage size
        max: usize,
    },

    /// A duration that must be positive was zero
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending field
        field: &'static str,
    },

    /// Configuration document could not be parsed
    #[error("Malformed configuration document")]
    Malformed,
}

/// Umbrella error for callers that drive the whole pipeline
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// Startup failed while loading the classifier
    #[error(transparent)]
    ClassifierLoad(#[from] ClassifierLoadError),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Batch delivery failed
    #[error(transparent)]
    Transmission(#[from] TransmissionError),
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorReadError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Bus => defmt::write!(fmt, "Classifier bus error"),
            Self::NoClassification => defmt::write!(fmt, "No classification"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BufferOverflowError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Dropped { event, capacity } =>
                defmt::write!(fmt, "Log full ({}), dropped {} -> {}", capacity, event.from, event.to),
            Self::Evicted { evicted, capacity } =>
                defmt::write!(fmt, "Log full ({}), evicted {} -> {}", capacity, evicted.from, evicted.to),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransmissionError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Rejected { event_count, reason } =>
                defmt::write!(fmt, "Sink rejected {} events: {}", event_count, reason),
            Self::DeadlineExceeded { elapsed_ms, timeout_ms } =>
                defmt::write!(fmt, "Sink call {}ms > {}ms", elapsed_ms, timeout_ms),
            Self::Serialization =>
                defmt::write!(fmt, "Payload serialization failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClassifierLoadError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "MLC load failed at line {} (reg {=u8:#x})", self.line, self.address)
    }
}
