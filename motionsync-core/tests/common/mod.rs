//! Common test utilities for integration tests
//!
//! This module provides:
//! - A scripted classifier that replays register readings
//! - A recording cloud sink with programmable failures and latency
//! - Helpers that drive a pipeline through a reading sequence

#![allow(dead_code)]

use std::collections::VecDeque;

use motionsync_core::{
    classifier::UcfLine,
    notify::MotionNotifier,
    payload::BatchDocument,
    pipeline::{MotionPipeline, TickReport},
    time::MockTimeSource,
    traits::{ClassifierSource, CloudSink, RegisterWriter},
    config::PipelineConfig,
    constants::CLASSIFIER_POLL_INTERVAL_MS,
    events::StateTransitionEvent,
};

/// One scripted answer from the classifier output register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Register holds this byte
    Code(u8),
    /// No inference completed yet
    NotReady,
    /// Bus transaction failed
    BusError,
}

/// Classifier fake that answers from a queue
///
/// An empty queue answers `WouldBlock`.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: VecDeque<Reading>,
    pub reads: usize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reading: Reading) {
        self.script.push_back(reading);
    }

    pub fn push_code(&mut self, code: u8) {
        self.push(Reading::Code(code));
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ClassifierSource for ScriptedClassifier {
    type Error = ();

    fn read_code(&mut self) -> nb::Result<u8, ()> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Reading::Code(code)) => Ok(code),
            Some(Reading::BusError) => Err(nb::Error::Other(())),
            Some(Reading::NotReady) | None => Err(nb::Error::WouldBlock),
        }
    }
}

/// Why the recording sink refused a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkDown;

/// Cloud sink fake that keeps every accepted batch
#[derive(Debug, Default)]
pub struct RecordingSink<'c> {
    /// Parsed documents the sink accepted
    pub delivered: Vec<BatchDocument>,
    /// Every call, accepted or not
    pub calls: usize,
    /// Deadlines passed in by the scheduler
    pub deadlines: Vec<u32>,
    fail_next: usize,
    always_fail: bool,
    latency: Option<(&'c MockTimeSource, u64)>,
}

impl<'c> RecordingSink<'c> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` batches, then accept
    pub fn failing(count: usize) -> Self {
        Self { fail_next: count, ..Self::default() }
    }

    /// Refuse every batch
    pub fn down() -> Self {
        Self { always_fail: true, ..Self::default() }
    }

    /// Accept every batch, but advance `clock` by `latency_ms` per call
    pub fn slow(clock: &'c MockTimeSource, latency_ms: u64) -> Self {
        Self { latency: Some((clock, latency_ms)), ..Self::default() }
    }

    pub fn set_down(&mut self, down: bool) {
        self.always_fail = down;
    }

    /// Total events across accepted batches
    pub fn delivered_events(&self) -> usize {
        self.delivered.iter().map(|doc| doc.events.len()).sum()
    }
}

impl<'c> CloudSink for RecordingSink<'c> {
    type Error = SinkDown;

    fn send_batch(&mut self, payload: &[u8], timeout_ms: u32) -> Result<(), SinkDown> {
        self.calls += 1;
        self.deadlines.push(timeout_ms);

        if let Some((clock, latency_ms)) = self.latency {
            clock.advance(latency_ms);
        }

        if self.always_fail {
            return Err(SinkDown);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(SinkDown);
        }

        let doc = BatchDocument::from_json(payload).map_err(|_| SinkDown)?;
        self.delivered.push(doc);
        Ok(())
    }
}

/// Register map fake for classifier bring-up
#[derive(Debug, Default)]
pub struct FakeRegisters {
    pub written: Vec<(u8, u8)>,
    pub fail_at_line: Option<usize>,
}

impl RegisterWriter for FakeRegisters {
    type Error = ();

    fn write_register(&mut self, address: u8, data: u8) -> Result<(), ()> {
        if self.fail_at_line == Some(self.written.len()) {
            return Err(());
        }
        self.written.push((address, data));
        Ok(())
    }
}

/// A short classifier program in UCF form
pub fn sample_program() -> [UcfLine; 4] {
    [
        UcfLine::new(0x10, 0x00),
        UcfLine::new(0x11, 0x00),
        UcfLine::new(0x01, 0x80),
        UcfLine::new(0x05, 0x00),
    ]
}

pub type TestPipeline<'a> = MotionPipeline<'a, ScriptedClassifier, RecordingSink<'a>, &'a MockTimeSource>;

/// Pipeline over the scripted classifier and a fresh recording sink
pub fn pipeline<'a>(
    notifier: &'a MotionNotifier,
    clock: &'a MockTimeSource,
    sink: RecordingSink<'a>,
    config: PipelineConfig,
) -> TestPipeline<'a> {
    MotionPipeline::new(notifier, ScriptedClassifier::new(), sink, clock, config)
        .expect("test configuration is valid")
}

/// Deliver one reading the way the hardware does: interrupt, then main loop
pub fn deliver(pipeline: &mut TestPipeline<'_>, notifier: &MotionNotifier, clock: &MockTimeSource, reading: Reading) -> TickReport {
    pipeline.source_mut().push(reading);
    notifier.signal();
    let report = pipeline.tick();
    clock.advance(CLASSIFIER_POLL_INTERVAL_MS);
    report
}

/// Deliver a sequence of register codes, one interrupt each
pub fn deliver_codes(pipeline: &mut TestPipeline<'_>, notifier: &MotionNotifier, clock: &MockTimeSource, codes: &[u8]) -> Vec<TickReport> {
    codes
        .iter()
        .map(|&code| deliver(pipeline, notifier, clock, Reading::Code(code)))
        .collect()
}

/// `(from, to)` pairs currently in the log
pub fn logged_pairs(pipeline: &TestPipeline<'_>) -> Vec<(u8, u8)> {
    pipeline.buffer().iter().map(|e| (e.from, e.to)).collect()
}

/// Full copy of the log, timestamps included
pub fn logged_events(pipeline: &TestPipeline<'_>) -> Vec<StateTransitionEvent> {
    pipeline.buffer().iter().copied().collect()
}
