//! Cloud Sinks for Motion Batches
//!
//! ## Overview
//!
//! Every connector here implements [`CloudSink`]: it takes one serialized
//! batch document, delivers it in a single blocking call, and answers with
//! success or failure. Retries, pacing and buffering all live in the
//! scheduler in `motionsync-core`; connectors never retry on their own.
//!
//! ## Connector Selection Guide
//!
//! ### HTTP/HTTPS
//!
//! **When to use:**
//! - Gateway or Linux-class device with an IP stack
//! - Ingest endpoint is an existing REST service
//! - Firewall-friendly environments
//!
//! **Characteristics:**
//! - Header overhead: 200+ bytes typical
//! - One POST per batch, 2xx means accepted
//! - TLS security standard
//!
//! ### Notecard
//!
//! **When to use:**
//! - Cellular or LoRa modules that take JSON requests over a serial line
//! - Device has no IP stack of its own
//!
//! **Characteristics:**
//! - One `note.add` request per batch; the module queues and syncs it
//! - Newline-delimited JSON on a UART or I2C bridge
//! - An empty response object means accepted
//! - Reads are bounded by the sync deadline
//!
//! ## Resource Usage
//!
//! | Connector | RAM (active)                 |
//! |-----------|------------------------------|
//! | HTTP      | 16-32KB (TLS dominated)      |
//! | Notecard  | payload + ~1KB response line |
//!
//! ## Example Usage
//!
//! ```no_run
//! use motionsync_connectors::http::{HttpConfig, HttpSink};
//! use motionsync_core::traits::CloudSink;
//!
//! let config = HttpConfig::new("https://ingest.example.com")
//!     .path("/v1/motion/batches")
//!     .bearer_token("device-token")
//!     .timeout_secs(30);
//!
//! let mut sink = HttpSink::new(config)?;
//! sink.send_batch(br#"{"event_count":0,"collection_start":0,"collection_end":1,"events":[]}"#, 30_000)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "notecard")]
pub mod notecard;

// Re-export common types
#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpConfig, HttpError, HttpSink};
#[cfg(feature = "notecard")]
pub use notecard::{NotecardConfig, NotecardError, NotecardSink, SerialLink};

pub use motionsync_core::traits::CloudSink;

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Delivery statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Batches accepted by the remote side
    pub batches_sent: u64,
    /// Batches that failed
    pub batches_failed: u64,
    /// Payload bytes in accepted batches
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    /// Count an accepted batch
    pub fn record_success(&mut self, bytes: usize) {
        self.batches_sent += 1;
        self.bytes_sent += bytes as u64;
        self.last_error = None;
    }

    /// Count a failed batch
    pub fn record_failure(&mut self, error: &impl std::fmt::Display) {
        self.batches_failed += 1;
        self.last_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_outcomes() {
        let mut stats = ConnectionStats::default();
        stats.record_failure(&ConnectorError::Timeout(30_000));
        assert_eq!(stats.batches_failed, 1);
        assert_eq!(stats.last_error.as_deref(), Some("Timeout after 30000ms"));

        stats.record_success(128);
        assert_eq!(stats.batches_sent, 1);
        assert_eq!(stats.bytes_sent, 128);
        assert!(stats.last_error.is_none());
    }
}
