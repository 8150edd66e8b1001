//! Motion State Codes and Transition Events
//!
//! ## Overview
//!
//! Two kinds of values flow through the pipeline:
//!
//! ```text
//! Classifier ──► RawStateCode ──► Filter ──► stable code ──► Recorder ──► StateTransitionEvent
//!   (0..=254 | sentinel)          (u8)                           {from, to, time}
//! ```
//!
//! A [`RawStateCode`] is produced on every poll and thrown away after the
//! filter has seen it. A [`StateTransitionEvent`] is created once per accepted
//! change of the stable state and lives in the event log until a batch
//! containing it is acknowledged.
//!
//! ### Memory Model
//!
//! ```text
//! StateTransitionEvent (16 bytes):
//! ├── timestamp: 8 bytes
//! ├── from: 1 byte
//! ├── to: 1 byte
//! └── padding: 6 bytes
//! ```
//!
//! 100 events fit in ~1.6KB, which is what sizes the default log.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::NO_CLASSIFICATION_CODE;
use crate::time::Timestamp;

/// Motion-state code as emitted by the classifier decision tree
pub type StateCode = u8;

/// One reading of the classifier output register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawStateCode {
    /// A classification the tree actually produced
    Valid(StateCode),
    /// No inference yet, or the read failed
    NoClassification,
}

impl RawStateCode {
    /// Interpret a raw register byte
    ///
    /// The all-ones byte is the sentinel; everything else is a class.
    pub const fn from_register(byte: u8) -> Self {
        if byte == NO_CLASSIFICATION_CODE {
            RawStateCode::NoClassification
        } else {
            RawStateCode::Valid(byte)
        }
    }

    /// The class code, if this reading carries one
    pub const fn code(self) -> Option<StateCode> {
        match self {
            RawStateCode::Valid(code) => Some(code),
            RawStateCode::NoClassification => None,
        }
    }

    /// Whether this reading is the sentinel
    pub const fn is_sentinel(self) -> bool {
        matches!(self, RawStateCode::NoClassification)
    }
}

impl From<u8> for RawStateCode {
    fn from(byte: u8) -> Self {
        Self::from_register(byte)
    }
}

impl fmt::Display for RawStateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawStateCode::Valid(code) => write!(f, "{}", code),
            RawStateCode::NoClassification => f.write_str("none"),
        }
    }
}

/// Accepted change of the stable motion state
///
/// Field names on the wire follow the batch document: `from`, `to`, `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateTransitionEvent {
    /// Stable state before the change
    pub from: StateCode,
    /// Stable state after the change
    pub to: StateCode,
    /// When the change was accepted, monotonic milliseconds
    #[serde(rename = "time")]
    pub timestamp: Timestamp,
}

impl StateTransitionEvent {
    /// Create a transition record
    pub const fn new(from: StateCode, to: StateCode, timestamp: Timestamp) -> Self {
        Self { from, to, timestamp }
    }
}

impl fmt::Display for StateTransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} @ {}ms", self.from, self.to, self.timestamp)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StateTransitionEvent {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{} -> {} @ {}ms", self.from, self.to, self.timestamp)
    }
}
