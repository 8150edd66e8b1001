//! Boundary Traits for MotionSync
//!
//! Everything the pipeline touches outside its own memory goes through one of
//! these traits, so the core runs unchanged against real hardware, a Linux
//! test rig, or scripted fakes in tests.
//!
//! ## Module Organization
//!
//! - [`time`] - Monotonic millisecond clock
//! - [`source`] - Classifier output register and program loading
//! - [`sink`] - Batch delivery to the cloud
//!
//! ## Design Philosophy
//!
//! - **Static Dispatch**: the pipeline is generic over its collaborators; no
//!   trait objects on the hot path
//! - **Explicit Status**: every call returns a `Result`; nothing panics across
//!   a boundary
//! - **Blocking Allowed Only in the Sink**: sources must answer immediately,
//!   using `nb::Error::WouldBlock` when the classifier has nothing new

pub mod time;
pub mod source;
pub mod sink;

pub use time::TimeSource;
pub use source::{ClassifierSource, RegisterWriter};
pub use sink::CloudSink;
