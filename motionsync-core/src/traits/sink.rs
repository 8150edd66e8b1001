//! Cloud Sink Boundary
//!
//! The sink receives one serialized batch per call and answers with plain
//! success or failure. There is no partial acknowledgment: either the whole
//! batch is accepted and the buffer is cleared, or none of it is and the
//! batch is kept for the next window.

use core::fmt::Debug;

/// Synchronous, all-or-nothing batch delivery
///
/// ## Implementation Requirements
///
/// - Must return within roughly `timeout_ms`. The scheduler measures the call
///   and treats an overrun as a failure even if the sink reports success,
///   which can produce a duplicate upload on the next window. Downstream
///   consumers must tolerate duplicates.
/// - Must not retry internally past the deadline; retries belong to the
///   scheduler.
pub trait CloudSink {
    /// Transport or protocol error
    type Error: Debug;

    /// Deliver one JSON batch document
    fn send_batch(&mut self, payload: &[u8], timeout_ms: u32) -> Result<(), Self::Error>;
}

impl<S: CloudSink + ?Sized> CloudSink for &mut S {
    type Error = S::Error;

    fn send_batch(&mut self, payload: &[u8], timeout_ms: u32) -> Result<(), Self::Error> {
        (**self).send_batch(payload, timeout_ms)
    }
}
