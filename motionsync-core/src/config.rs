//! Pipeline Configuration
//!
//! Every tunable in one place. Defaults match the deployed firmware, so an
//! empty JSON object is a valid configuration:
//!
//! ```rust
//! use motionsync_core::config::PipelineConfig;
//! use motionsync_core::buffer::OverflowPolicy;
//!
//! let config = PipelineConfig::from_json(br#"{ "overflow_policy": "evict_oldest" }"#).unwrap();
//! assert_eq!(config.agreement_count, 3);
//! assert_eq!(config.overflow_policy, OverflowPolicy::EvictOldest);
//! ```
//!
//! | Field              | Default  | Meaning                                   |
//! |--------------------|----------|-------------------------------------------|
//! | `agreement_count`  | 3        | identical readings before a state change  |
//! | `buffer_capacity`  | 100      | transitions held between uploads          |
//! | `overflow_policy`  | reject   | what to lose when the log is full         |
//! | `sync_interval_ms` | 300000   | upload period and retry pacing            |
//! | `flush_on_full`    | true     | upload early when the log fills           |
//! | `send_timeout_ms`  | 30000    | deadline for one upload                   |
//! | `poll_interval_ms` | 38       | spacing of debounce re-reads              |

use serde::Deserialize;

use crate::buffer::OverflowPolicy;
use crate::constants::{
    CLASSIFIER_POLL_INTERVAL_MS, DEFAULT_EVENT_CAPACITY, DEFAULT_SYNC_INTERVAL_MS, MAJORITY_AGREEMENT,
    MAX_AGREEMENT, NETWORK_TIMEOUT_MS,
};
use crate::errors::ConfigError;

/// Tunables for [`MotionPipeline`](crate::pipeline::MotionPipeline)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Consecutive identical readings required to accept a state
    pub agreement_count: usize,
    /// Transition log capacity
    pub buffer_capacity: usize,
    /// Behavior when the log is full
    pub overflow_policy: OverflowPolicy,
    /// Upload period (ms)
    pub sync_interval_ms: u64,
    /// Upload as soon as the log is full
    pub flush_on_full: bool,
    /// Deadline for one upload (ms)
    pub send_timeout_ms: u32,
    /// Minimum spacing between debounce polls (ms)
    pub poll_interval_ms: u64,
}

impl PipelineConfig {
    /// Firmware defaults
    pub const fn new() -> Self {
        Self {
            agreement_count: MAJORITY_AGREEMENT,
            buffer_capacity: DEFAULT_EVENT_CAPACITY,
            overflow_policy: OverflowPolicy::RejectNew,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            flush_on_full: true,
            send_timeout_ms: NETWORK_TIMEOUT_MS,
            poll_interval_ms: CLASSIFIER_POLL_INTERVAL_MS,
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|_| ConfigError::Malformed)
    }

    /// Set agreement count
    pub fn with_agreement_count(mut self, count: usize) -> Self {
        self.agreement_count = count;
        self
    }

    /// Set log capacity
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set overflow policy
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Set upload period
    pub fn with_sync_interval(mut self, interval_ms: u64) -> Self {
        self.sync_interval_ms = interval_ms;
        self
    }

    /// Enable or disable the full-log trigger
    pub fn with_flush_on_full(mut self, enabled: bool) -> Self {
        self.flush_on_full = enabled;
        self
    }

    /// Set upload deadline
    pub fn with_send_timeout(mut self, timeout_ms: u32) -> Self {
        self.send_timeout_ms = timeout_ms;
        self
    }

    /// Set debounce poll spacing
    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Check ranges against a log with `max_capacity` slots of storage
    pub fn validate(&self, max_capacity: usize) -> Result<(), ConfigError> {
        if self.agreement_count == 0 || self.agreement_count > MAX_AGREEMENT {
            return Err(ConfigError::AgreementCount {
                value: self.agreement_count,
                max: MAX_AGREEMENT,
            });
        }

        if self.buffer_capacity == 0 || self.buffer_capacity > max_capacity {
            return Err(ConfigError::BufferCapacity {
                value: self.buffer_capacity,
                max: max_capacity,
            });
        }

        if self.sync_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "sync_interval_ms" });
        }

        if self.send_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "send_timeout_ms" });
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
