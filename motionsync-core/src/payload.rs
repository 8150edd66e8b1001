//! Batch Payload Encoding
//!
//! One upload carries the whole event log as a single JSON document:
//!
//! ```text
//! { "event_count": 2,
//!   "collection_start": 0,
//!   "collection_end": 300000,
//!   "events": [ { "from": 5, "to": 7, "time": 1200 },
//!               { "from": 7, "to": 5, "time": 98000 } ] }
//! ```
//!
//! `collection_start` is the end of the last acknowledged upload (or boot),
//! `collection_end` the moment this batch was built. Together they state the
//! window the device vouches for: no transition outside `events` happened in
//! it, unless the recorder reported an overflow.
//!
//! The document is serialized straight from the log without copying events.

use alloc::vec::Vec;

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::buffer::EventBuffer;
use crate::errors::TransmissionError;
use crate::events::StateTransitionEvent;
use crate::time::Timestamp;

/// Borrowed view of the log shaped as the upload document
#[derive(Debug, Clone, Copy)]
pub struct BatchPayload<'a, const N: usize> {
    collection_start: Timestamp,
    collection_end: Timestamp,
    events: &'a EventBuffer<N>,
}

impl<'a, const N: usize> BatchPayload<'a, N> {
    /// Describe the log contents for the given collection window
    pub fn new(events: &'a EventBuffer<N>, collection_start: Timestamp, collection_end: Timestamp) -> Self {
        Self {
            collection_start,
            collection_end,
            events,
        }
    }

    /// Number of events in the batch
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Encode as a JSON document
    pub fn to_json(&self) -> Result<Vec<u8>, TransmissionError> {
        serde_json::to_vec(self).map_err(|_| TransmissionError::Serialization)
    }
}

impl<'a, const N: usize> Serialize for BatchPayload<'a, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("BatchPayload", 4)?;
        doc.serialize_field("event_count", &self.events.len())?;
        doc.serialize_field("collection_start", &self.collection_start)?;
        doc.serialize_field("collection_end", &self.collection_end)?;
        doc.serialize_field("events", &EventList(self.events))?;
        doc.end()
    }
}

struct EventList<'a, const N: usize>(&'a EventBuffer<N>);

impl<'a, const N: usize> Serialize for EventList<'a, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Owned form of the upload document, for receivers and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDocument {
    /// Number of entries in `events`
    pub event_count: usize,
    /// Start of the collection window
    pub collection_start: Timestamp,
    /// End of the collection window
    pub collection_end: Timestamp,
    /// Transitions in insertion order
    pub events: Vec<StateTransitionEvent>,
}

impl BatchDocument {
    /// Parse an upload document
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_shape() {
        let mut log = EventBuffer::<4>::new();
        log.push(StateTransitionEvent::new(5, 7, 1200)).unwrap();
        log.push(StateTransitionEvent::new(7, 5, 98000)).unwrap();

        let json = BatchPayload::new(&log, 0, 300_000).to_json().unwrap();
        assert_eq!(
            core::str::from_utf8(&json).unwrap(),
            r#"{"event_count":2,"collection_start":0,"collection_end":300000,"events":[{"from":5,"to":7,"time":1200},{"from":7,"to":5,"time":98000}]}"#
        );
    }

    #[test]
    fn empty_log_encodes_empty_list() {
        let log = EventBuffer::<4>::new();
        let payload = BatchPayload::new(&log, 10, 20);
        assert_eq!(payload.event_count(), 0);

        let doc = BatchDocument::from_json(&payload.to_json().unwrap()).unwrap();
        assert_eq!(doc.event_count, 0);
        assert!(doc.events.is_empty());
    }

    #[test]
    fn parses_back_into_document() {
        let mut log = EventBuffer::<4>::new();
        log.push(StateTransitionEvent::new(1, 2, 3)).unwrap();

        let doc = BatchDocument::from_json(&BatchPayload::new(&log, 0, 9).to_json().unwrap()).unwrap();
        assert_eq!(doc.collection_end, 9);
        assert_eq!(doc.events, vec![StateTransitionEvent::new(1, 2, 3)]);
    }
}
