//! Notecard Sink - JSON Requests over a Serial Line
//!
//! ## Overview
//!
//! Cellular/LoRa modules of the Notecard family accept newline-terminated
//! JSON requests on a UART (or an I2C bridge) and answer with one JSON line.
//! A batch becomes one `note.add` request; the module stores the note and
//! syncs it to its cloud service on its own schedule.
//!
//! ```text
//! host ──► {"req":"note.add","file":"motion.qo","sync":true,"body":{...batch...}}\n
//! card ◄── {"total":1}\n            accepted
//! card ◄── {"err":"no space"}\n     rejected
//! ```
//!
//! The transport is any [`SerialLink`]: a `Read + Write` stream that accepts
//! a read timeout. Before every read the sink sets that timeout to whatever
//! is left of the scheduler's deadline, and it gives up with
//! [`ConnectorError::Timeout`] once the deadline has passed, so a silent or
//! trickling card cannot hold the main loop.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::net::TcpStream;
//! use motionsync_connectors::notecard::{NotecardConfig, NotecardSink};
//!
//! let port = TcpStream::connect("127.0.0.1:3333")?;
//! let config = NotecardConfig::new("motion.qo").product("com.example.wearable");
//! let mut sink = NotecardSink::new(port, config);
//! sink.configure_hub()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use motionsync_core::constants::NETWORK_TIMEOUT_MS;
use motionsync_core::traits::CloudSink;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{ConnectionStats, ConnectorError};

/// Longest response line accepted from the card
const MAX_RESPONSE_LEN: usize = 1024;

/// Byte stream to the card with a settable read timeout
pub trait SerialLink: Read + Write {
    /// Bound the next blocking read; `None` blocks indefinitely
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
}

impl SerialLink for std::net::TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::net::TcpStream::set_read_timeout(self, timeout)
    }
}

/// Notecard-specific errors
#[derive(Debug, Error)]
pub enum NotecardError {
    /// Transport read/write failed
    #[error("Serial I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Card answered with an `err` field
    #[error("Card rejected request: {0}")]
    Card(String),

    /// Card answer was not a JSON object or ran too long
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Batch payload was not a JSON object
    #[error("Payload is not a JSON document: {0}")]
    Payload(#[from] serde_json::Error),

    /// Shared connector failure
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

/// Notecard configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotecardConfig {
    /// Outbound notefile receiving the batches
    pub file: String,
    /// Ask the card to sync immediately after queuing
    pub sync: bool,
    /// Product UID for `hub.set`
    pub product: Option<String>,
    /// Connection mode for `hub.set`
    pub mode: String,
}

impl NotecardConfig {
    /// Create new configuration for a notefile
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sync: true,
            product: None,
            mode: "continuous".into(),
        }
    }

    /// Set immediate sync
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set product UID
    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Set connection mode (`continuous`, `periodic`, `minimum`)
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

impl Default for NotecardConfig {
    fn default() -> Self {
        Self::new("motion.qo")
    }
}

/// Cloud sink speaking the Notecard JSON protocol
pub struct NotecardSink<P: SerialLink> {
    port: P,
    config: NotecardConfig,
    stats: ConnectionStats,
}

impl<P: SerialLink> NotecardSink<P> {
    /// Wrap a transport
    pub fn new(port: P, config: NotecardConfig) -> Self {
        Self {
            port,
            config,
            stats: ConnectionStats::default(),
        }
    }

    /// Send `hub.set` with the configured product and mode
    pub fn configure_hub(&mut self) -> Result<(), NotecardError> {
        let product = self.config.product.clone().ok_or_else(|| {
            ConnectorError::ConfigError("hub.set requires a product UID".into())
        })?;

        let request = json!({
            "req": "hub.set",
            "product": product,
            "mode": self.config.mode,
        });
        self.transact(&request, Instant::now(), NETWORK_TIMEOUT_MS)?;
        info!("notecard attached to {} ({})", product, self.config.mode);
        Ok(())
    }

    /// Request line for one batch
    pub fn note_request(&self, payload: &[u8]) -> Result<Value, NotecardError> {
        let body: Value = serde_json::from_slice(payload)?;
        if !body.is_object() {
            return Err(NotecardError::Malformed("batch body must be an object".into()));
        }

        Ok(json!({
            "req": "note.add",
            "file": self.config.file,
            "sync": self.config.sync,
            "body": body,
        }))
    }

    /// Delivery statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Give back the transport
    pub fn into_inner(self) -> P {
        self.port
    }

    fn transact(
        &mut self,
        request: &Value,
        started: Instant,
        timeout_ms: u32,
    ) -> Result<Value, NotecardError> {
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        self.port.write_all(&line)?;
        self.port.flush()?;

        let response = self.read_line(started, timeout_ms)?;
        let value: Value = serde_json::from_slice(&response)
            .map_err(|e| NotecardError::Malformed(e.to_string()))?;

        match value.get("err").and_then(Value::as_str) {
            Some(err) => Err(NotecardError::Card(err.to_string())),
            None if value.is_object() => Ok(value),
            None => Err(NotecardError::Malformed("response is not an object".into())),
        }
    }

    fn read_line(&mut self, started: Instant, timeout_ms: u32) -> Result<Vec<u8>, NotecardError> {
        let deadline = Duration::from_millis(u64::from(timeout_ms));
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            let remaining = deadline
                .checked_sub(started.elapsed())
                .filter(|left| !left.is_zero())
                .ok_or_else(|| timed_out(started))?;
            self.port.set_read_timeout(Some(remaining))?;

            let read = match self.port.read(&mut byte) {
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(timed_out(started));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if read == 0 {
                return Err(ConnectorError::NotConnected.into());
            }
            match byte[0] {
                b'\n' => return Ok(line),
                b'\r' => {}
                b => {
                    if line.len() == MAX_RESPONSE_LEN {
                        return Err(NotecardError::Malformed("response line too long".into()));
                    }
                    line.push(b);
                }
            }
        }
    }
}

fn timed_out(started: Instant) -> NotecardError {
    ConnectorError::Timeout(started.elapsed().as_millis() as u64).into()
}

impl<P: SerialLink> CloudSink for NotecardSink<P> {
    type Error = NotecardError;

    fn send_batch(&mut self, payload: &[u8], timeout_ms: u32) -> Result<(), Self::Error> {
        let started = Instant::now();
        let result = self
            .note_request(payload)
            .and_then(|request| {
                debug!("note.add to {} ({} bytes)", self.config.file, payload.len());
                self.transact(&request, started, timeout_ms)
            })
            .map(|_| ());

        match &result {
            Ok(()) => self.stats.record_success(payload.len()),
            Err(e) => {
                warn!("note.add to {} failed: {}", self.config.file, e);
                self.stats.record_failure(e);
            }
        }
        result
    }
}
