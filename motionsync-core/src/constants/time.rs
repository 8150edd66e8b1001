//! Time-Related Constants
//!
//! Time intervals, durations, and conversion factors used for scheduling
//! the sync loop and pacing classifier polls.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: u64 = MS_PER_SECOND * SECONDS_PER_MINUTE as u64;

// ===== SYNC SCHEDULING =====

/// Default interval between batch uploads (milliseconds).
///
/// Five minutes between flushes keeps cellular/Wi-Fi radio time low while
/// bounding how stale the cloud view of the device can get. The same interval
/// paces retries after a failed upload.
///
/// Source: Firmware field deployment
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 5 * MS_PER_MINUTE;

/// Network operation timeout (milliseconds).
///
/// Deadline for a single batch upload. A call that runs past it counts as a
/// failed delivery and the batch stays buffered.
///
/// Source: IoT protocol recommendations
pub const NETWORK_TIMEOUT_MS: u32 = 30000;

// ===== CLASSIFIER SAMPLING =====

/// Accelerometer output data rate the classifier runs at (Hz).
///
/// Source: LSM6DSOX MLC program configuration
pub const CLASSIFIER_ODR_HZ: u32 = 26;

/// Minimum spacing between debounce polls (milliseconds).
///
/// One sample period at the classifier ODR. Reading the output register
/// faster than the classifier refreshes it would only re-read the same code.
pub const CLASSIFIER_POLL_INTERVAL_MS: u64 = MS_PER_SECOND / CLASSIFIER_ODR_HZ as u64;
