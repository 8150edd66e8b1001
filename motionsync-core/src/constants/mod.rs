//! Constants for MotionSync Core
//!
//! Centralized, documented constants used throughout the pipeline. Every
//! numeric default lives here with a short note on where it comes from.
//!
//! ## Organization
//!
//! - **Time**: unit conversions, sync interval, send deadline, poll pacing
//! - **Buffers**: event log capacity and filter window limits
//! - **Classifier**: register-level codes at the sensor boundary

/// Time-related constants for intervals, timeouts, and sampling rates.
pub mod time;

/// Buffer sizes and memory constraints for embedded systems.
pub mod buffers;

/// Classifier output codes and interrupt line conventions.
pub mod classifier;

pub use time::{
    MS_PER_SECOND, MS_PER_MINUTE,
    DEFAULT_SYNC_INTERVAL_MS, NETWORK_TIMEOUT_MS, CLASSIFIER_POLL_INTERVAL_MS,
};

pub use buffers::{
    DEFAULT_EVENT_CAPACITY, MAJORITY_AGREEMENT, IMMEDIATE_AGREEMENT, MAX_AGREEMENT,
};

pub use classifier::NO_CLASSIFICATION_CODE;
