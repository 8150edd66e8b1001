//! Motion-state pipeline for sensor-side classifiers
//!
//! Turns the noisy output of an always-on motion classifier into a clean log
//! of state transitions and delivers it to the cloud in batches.
//! Designed for microcontrollers that sleep most of the time.
//!
//! Key constraints:
//! - Interrupt side is one atomic store
//! - Fixed-size storage, sized at compile time
//! - Network outages lose nothing until the log is full
//!
//! ```no_run
//! use motionsync_core::{MotionNotifier, MotionPipeline, PipelineConfig, MonotonicClock};
//! # use motionsync_core::traits::{ClassifierSource, CloudSink};
//! # struct Mlc;
//! # impl ClassifierSource for Mlc {
//! #     type Error = ();
//! #     fn read_code(&mut self) -> nb::Result<u8, ()> { Ok(0) }
//! # }
//! # struct Uplink;
//! # impl CloudSink for Uplink {
//! #     type Error = ();
//! #     fn send_batch(&mut self, _: &[u8], _: u32) -> Result<(), ()> { Ok(()) }
//! # }
//!
//! static NOTIFIER: MotionNotifier = MotionNotifier::new();
//!
//! let mut pipeline: MotionPipeline<'_, _, _, _> =
//!     MotionPipeline::new(&NOTIFIER, Mlc, Uplink, MonotonicClock::new(), PipelineConfig::default())
//!         .expect("default configuration is valid");
//!
//! loop {
//!     pipeline.tick();
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod diag;

pub mod buffer;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod filter;
pub mod notify;
pub mod payload;
pub mod pipeline;
pub mod recorder;
pub mod scheduler;
pub mod time;
pub mod traits;

// Public API
pub use buffer::{EventBuffer, OverflowPolicy};
pub use config::PipelineConfig;
pub use errors::{PipelineError, PipelineResult, TransmissionError};
pub use events::{RawStateCode, StateCode, StateTransitionEvent};
pub use notify::{EdgeDetector, MotionNotifier};
pub use pipeline::{MotionPipeline, PipelineState, TickReport};
pub use scheduler::SyncOutcome;
#[cfg(feature = "std")]
pub use time::MonotonicClock;
pub use time::{MockTimeSource, Timestamp};
pub use traits::{ClassifierSource, CloudSink, RegisterWriter, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
