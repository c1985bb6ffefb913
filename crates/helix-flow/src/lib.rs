//! # helix-flow
//!
//! The Helix job-orchestration pipeline: event-triggered, stateless handlers
//! coordinated only through the shared object store and the executor's
//! state-change events.
//!
//! ## Components
//!
//! - [`dispatch::Dispatcher`]: reacts to an input-namespace write notification
//!   by submitting exactly one job named after the staged object
//! - [`worker::ExecutionWorker`]: runs inside an executor job; fetches the
//!   input, invokes the model, writes the output
//! - [`status::StatusRecorder`]: projects every job state-change event into an
//!   overwritten status record
//! - [`watchdog::Watchdog`]: surfaces jobs that stalled or lost their output
//!
//! ## Delivery model
//!
//! Event delivery is at-least-once and unordered. Every handler here is
//! re-entrant and every write safely repeatable: duplicate notifications
//! collapse into one job via executor-side name deduplication, and duplicate
//! state-change events rewrite a byte-identical status record. Handlers never
//! retry internally; a failed invocation propagates so the platform's
//! redelivery policy owns the retry.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod dispatch;
pub mod error;
pub mod events;
pub mod executor;
pub mod status;
pub mod watchdog;
pub mod worker;

pub use dispatch::{DispatchConfig, DispatchOutcome, Dispatcher};
pub use error::{Error, Result};
pub use events::{JobStateChange, JobStatus, ObjectCreated};
pub use executor::{
    HttpExecutorConfig, HttpJobExecutor, JobExecutor, JobSubmission, MemoryExecutor, SubmitOutcome,
};
pub use status::{JobStatusRecord, StatusRecorder};
pub use watchdog::{JobHealth, Watchdog};
pub use worker::{ExecutionWorker, ModelParams, SequenceModel};
