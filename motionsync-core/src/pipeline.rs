//! Main-Loop Controller
//!
//! ## Overview
//!
//! [`MotionPipeline`] owns everything the main loop owns: the classifier
//! handle, the filter, the recorder with its log, the scheduler and the sink.
//! The interrupt side only ever sees the shared [`MotionNotifier`].
//!
//! ```text
//!  INT1 ──► MotionNotifier ─┐
//!                           ▼
//!  loop { pipeline.tick() }:  take? ──► read ──► filter ──► recorder ──► log
//!                                                                         │
//!                             scheduler (interval / full) ──► sink ◄──────┘
//! ```
//!
//! ## State Machine
//!
//! ```text
//!          notification
//!  Idle ─────────────────► AwaitingClassification ──read──► Debouncing ◄─┐
//!   ▲                                                     │   │  poll    │
//!   │                         converged, same state       │   └──────────┘
//!   ├──────────────── NoChange ◄──────────────────────────┤
//!   │                                                     │ converged, new state
//!   ├──── BufferingEvent ◄──── TransitionDetected ◄───────┘
//!   │
//!   └──── Flushing ◄── scheduler trigger (from Idle or Debouncing)
//! ```
//!
//! Only `Idle` and `Debouncing` persist between ticks; the other states are
//! passed through within one tick and show up in [`TickReport::phases`].
//!
//! ## Debounce Episodes
//!
//! A notification reads the classifier immediately and starts an episode.
//! While the episode lasts, the classifier is re-read at most once per poll
//! interval (one sample period at 26 Hz). The episode ends as soon as the
//! filter window agrees, or after `agreement_count` readings without
//! agreement; the next notification starts a fresh one.
//!
//! ## Example Usage
//!
//! ```rust
//! use motionsync_core::config::PipelineConfig;
//! use motionsync_core::notify::MotionNotifier;
//! use motionsync_core::pipeline::MotionPipeline;
//! use motionsync_core::time::MockTimeSource;
//! use motionsync_core::traits::{ClassifierSource, CloudSink};
//!
//! struct Mlc;
//! impl ClassifierSource for Mlc {
//!     type Error = ();
//!     fn read_code(&mut self) -> nb::Result<u8, ()> { Ok(4) }
//! }
//!
//! struct Uplink;
//! impl CloudSink for Uplink {
//!     type Error = ();
//!     fn send_batch(&mut self, _payload: &[u8], _timeout_ms: u32) -> Result<(), ()> { Ok(()) }
//! }
//!
//! static NOTIFIER: MotionNotifier = MotionNotifier::new();
//! let clock = MockTimeSource::new(0);
//!
//! let mut pipeline: MotionPipeline<'_, _, _, _> =
//!     MotionPipeline::new(&NOTIFIER, Mlc, Uplink, &clock, PipelineConfig::default()).unwrap();
//!
//! NOTIFIER.signal();
//! pipeline.tick();
//! ```

use heapless::Vec;

use crate::buffer::EventBuffer;
use crate::classifier::{self, UcfLine};
use crate::config::PipelineConfig;
use crate::constants::DEFAULT_EVENT_CAPACITY;
use crate::errors::{ConfigError, PipelineResult};
use crate::events::{RawStateCode, StateCode};
use crate::filter::{ConsensusFilter, FilterStats, FilterUpdate};
use crate::notify::{MotionNotifier, NotifierStats};
use crate::recorder::{EventRecorder, RecordOutcome, RecorderStats};
use crate::scheduler::{SyncOutcome, SyncScheduler, SyncStats};
use crate::time::Timestamp;
use crate::traits::{ClassifierSource, CloudSink, RegisterWriter, TimeSource};

/// Most phases one tick can pass through
const MAX_PHASES_PER_TICK: usize = 8;

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for a notification or a sync trigger
    Idle,
    /// Notification consumed, classifier read pending
    AwaitingClassification,
    /// Window not yet in agreement; re-reading on the poll interval
    Debouncing,
    /// Filter accepted a new stable state
    TransitionDetected,
    /// Episode ended without a logged transition; the first stable state
    /// ever seen (the recorder's baseline) also ends here
    NoChange,
    /// Transition handed to the log
    BufferingEvent,
    /// Upload in progress
    Flushing,
}

/// What happened during one [`MotionPipeline::tick`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Timestamp the tick ran at
    pub now: Timestamp,
    /// Classifier reading taken this tick
    pub reading: Option<RawStateCode>,
    /// Filter result for that reading
    pub filter: Option<FilterUpdate>,
    /// Recorder result for that reading
    pub record: Option<RecordOutcome>,
    /// Scheduler result
    pub sync: SyncOutcome,
    /// Phases entered, in order
    pub phases: Vec<PipelineState, MAX_PHASES_PER_TICK>,
}

impl TickReport {
    fn new(now: Timestamp) -> Self {
        Self {
            now,
            reading: None,
            filter: None,
            record: None,
            sync: SyncOutcome::Idle,
            phases: Vec::new(),
        }
    }

    /// Whether a transition was appended to the log
    pub fn recorded(&self) -> bool {
        matches!(self.record, Some(RecordOutcome::Recorded(_)))
    }
}

/// Counters from every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Interrupt handoff
    pub notifier: NotifierStats,
    /// Debounce filter
    pub filter: FilterStats,
    /// Transition recorder
    pub recorder: RecorderStats,
    /// Sync scheduler
    pub sync: SyncStats,
}

/// Motion-state pipeline driven from the main loop
///
/// - `S`: classifier output register
/// - `K`: cloud sink
/// - `T`: millisecond clock
/// - `N`: compiled-in log storage
pub struct MotionPipeline<'a, S, K, T, const N: usize = DEFAULT_EVENT_CAPACITY>
where
    S: ClassifierSource,
    K: CloudSink,
    T: TimeSource,
{
    notifier: &'a MotionNotifier,
    source: S,
    sink: K,
    clock: T,
    config: PipelineConfig,
    filter: ConsensusFilter,
    recorder: EventRecorder<N>,
    scheduler: SyncScheduler,
    state: PipelineState,
    episode_reads: usize,
    last_poll: Timestamp,
}

impl<'a, S, K, T, const N: usize> MotionPipeline<'a, S, K, T, N>
where
    S: ClassifierSource,
    K: CloudSink,
    T: TimeSource,
{
    /// Assemble a pipeline around an already configured classifier
    ///
    /// The first sync window starts now.
    pub fn new(
        notifier: &'a MotionNotifier,
        source: S,
        sink: K,
        clock: T,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate(N)?;

        let filter = ConsensusFilter::new(config.agreement_count)?;
        let recorder = EventRecorder::with_capacity(config.buffer_capacity, config.overflow_policy)?;
        let start = clock.now();
        let scheduler = SyncScheduler::new(
            start,
            config.sync_interval_ms,
            config.send_timeout_ms,
            config.flush_on_full,
        );

        Ok(Self {
            notifier,
            source,
            sink,
            clock,
            config,
            filter,
            recorder,
            scheduler,
            state: PipelineState::Idle,
            episode_reads: 0,
            last_poll: start,
        })
    }

    /// Load the classifier program, then assemble the pipeline
    ///
    /// Nothing is constructed if the configuration is invalid or any program
    /// line fails to write; the caller is expected to halt.
    pub fn bring_up<W>(
        writer: &mut W,
        program: &[UcfLine],
        notifier: &'a MotionNotifier,
        source: S,
        sink: K,
        clock: T,
        config: PipelineConfig,
    ) -> PipelineResult<Self>
    where
        W: RegisterWriter + ?Sized,
    {
        config.validate(N)?;
        classifier::load_program(writer, program)?;
        Ok(Self::new(notifier, source, sink, clock, config)?)
    }

    /// Run one main-loop iteration
    ///
    /// Consumes at most one notification and takes at most one classifier
    /// reading. Blocks only inside the sink call, if a sync trigger fires.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::new(now);

        let read_due = if self.notifier.take() {
            diag_debug!("classification pending");
            self.enter(PipelineState::AwaitingClassification, &mut report);
            self.episode_reads = 0;
            true
        } else {
            self.state == PipelineState::Debouncing
                && now.saturating_sub(self.last_poll) >= self.config.poll_interval_ms
        };

        if read_due {
            self.sample(now, &mut report);
        }

        if self.scheduler.due(now, self.recorder.buffer().is_full()).is_some() {
            report.sync = self.run_flush(false, &mut report);
        }

        report
    }

    /// Upload the log now, regardless of triggers
    pub fn flush_now(&mut self) -> SyncOutcome {
        let mut report = TickReport::new(self.clock.now());
        self.run_flush(true, &mut report)
    }

    fn sample(&mut self, now: Timestamp, report: &mut TickReport) {
        let reading = classifier::read_raw(&mut self.source);
        self.last_poll = now;
        self.episode_reads += 1;

        let update = self.filter.update(reading);
        let outcome = self.recorder.observe(update.stable, now);

        report.reading = Some(reading);
        report.filter = Some(update);
        report.record = Some(outcome);

        match outcome {
            RecordOutcome::Recorded(_) | RecordOutcome::Overflow(_) => {
                self.enter(PipelineState::TransitionDetected, report);
                self.enter(PipelineState::BufferingEvent, report);
                self.enter(PipelineState::Idle, report);
            }
            _ if self.filter.is_settled() || self.episode_reads >= self.filter.agreement() => {
                self.enter(PipelineState::NoChange, report);
                self.enter(PipelineState::Idle, report);
            }
            _ => self.enter(PipelineState::Debouncing, report),
        }
    }

    fn run_flush(&mut self, manual: bool, report: &mut TickReport) -> SyncOutcome {
        let resume = self.state;
        self.enter(PipelineState::Flushing, report);

        let outcome = if manual {
            self.scheduler
                .flush_now(&self.clock, self.recorder.buffer_mut(), &mut self.sink)
        } else {
            self.scheduler
                .poll(&self.clock, self.recorder.buffer_mut(), &mut self.sink)
        };

        self.enter(resume, report);
        outcome
    }

    fn enter(&mut self, next: PipelineState, report: &mut TickReport) {
        self.state = next;
        let _ = report.phases.push(next);
    }

    /// Phase between ticks (`Idle` or `Debouncing`)
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Current debounced motion state
    pub fn stable_state(&self) -> Option<StateCode> {
        self.filter.stable()
    }

    /// Transitions awaiting upload
    pub fn buffer(&self) -> &EventBuffer<N> {
        self.recorder.buffer()
    }

    /// End of the last acknowledged upload
    pub fn last_transmission(&self) -> Timestamp {
        self.scheduler.last_transmission()
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Counters from every stage
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            notifier: self.notifier.stats(),
            filter: self.filter.stats(),
            recorder: self.recorder.stats(),
            sync: self.scheduler.stats(),
        }
    }

    /// Sink, e.g. to inspect connection statistics
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Sink, mutable
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Classifier handle, mutable
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockTimeSource;

    struct Fixed(u8);

    impl ClassifierSource for Fixed {
        type Error = ();

        fn read_code(&mut self) -> nb::Result<u8, ()> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct Accepting {
        calls: usize,
    }

    impl CloudSink for Accepting {
        type Error = ();

        fn send_batch(&mut self, _payload: &[u8], _timeout_ms: u32) -> Result<(), ()> {
            self.calls += 1;
            Ok(())
        }
    }

    fn pipeline<'a>(
        notifier: &'a MotionNotifier,
        clock: &'a MockTimeSource,
        code: u8,
    ) -> MotionPipeline<'a, Fixed, Accepting, &'a MockTimeSource> {
        MotionPipeline::new(notifier, Fixed(code), Accepting::default(), clock, PipelineConfig::default()).unwrap()
    }

    #[test]
    fn idle_without_notification() {
        let notifier = MotionNotifier::new();
        let clock = MockTimeSource::new(0);
        let mut p = pipeline(&notifier, &clock, 3);

        let report = p.tick();
        assert_eq!(report.reading, None);
        assert!(report.phases.is_empty());
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn notification_starts_debounce() {
        let notifier = MotionNotifier::new();
        let clock = MockTimeSource::new(0);
        let mut p = pipeline(&notifier, &clock, 3);

        notifier.signal();
        let report = p.tick();
        assert_eq!(report.reading, Some(RawStateCode::Valid(3)));
        assert_eq!(
            report.phases.as_slice(),
            &[PipelineState::AwaitingClassification, PipelineState::Debouncing]
        );
    }

    #[test]
    fn debounce_polls_are_paced() {
        let notifier = MotionNotifier::new();
        let clock = MockTimeSource::new(0);
        let mut p = pipeline(&notifier, &clock, 3);

        notifier.signal();
        p.tick();

        clock.advance(10);
        assert_eq!(p.tick().reading, None);

        clock.advance(28);
        assert!(p.tick().reading.is_some());

        clock.advance(38);
        let report = p.tick();
        assert_eq!(report.record, Some(RecordOutcome::Baseline(3)));
        assert_eq!(report.phases.as_slice(), &[PipelineState::NoChange, PipelineState::Idle]);
        assert_eq!(p.state(), PipelineState::Idle);
        assert_eq!(p.stable_state(), Some(3));
    }

    #[test]
    fn invalid_config_rejected() {
        let notifier = MotionNotifier::new();
        let clock = MockTimeSource::new(0);
        let result = MotionPipeline::<_, _, _, 10>::new(
            &notifier,
            Fixed(1),
            Accepting::default(),
            &clock,
            PipelineConfig::default(),
        );
        assert!(matches!(result, Err(ConfigError::BufferCapacity { value: 100, max: 10 })));
    }

    #[test]
    fn manual_flush_on_empty_log_skips_sink() {
        let notifier = MotionNotifier::new();
        let clock = MockTimeSource::new(0);
        let mut p = pipeline(&notifier, &clock, 3);

        assert!(matches!(p.flush_now(), SyncOutcome::Empty(_)));
        assert_eq!(p.sink().calls, 0);
    }
}
