//! Event payloads delivered to the pipeline's handlers.
//!
//! Two event families drive the pipeline:
//!
//! - [`ObjectCreated`]: the object store's write notification, consumed by the
//!   dispatcher
//! - [`JobStateChange`]: the executor's state broadcast, consumed by the
//!   status recorder
//!
//! Both may arrive more than once and out of order; neither carries sequence
//! numbers. The handlers are written so that neither property matters.

use serde::{Deserialize, Serialize};

use helix_core::JobName;

/// A write notification for a completed object-store put.
///
/// The store guarantees this is never observed before the put it describes
/// has durably completed; that causal edge is the only ordering the pipeline
/// relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCreated {
    /// Bucket that received the write.
    pub bucket: String,
    /// Full key of the written object.
    pub object_key: String,
}

/// The lifecycle states a job moves through in the executor.
///
/// `SUBMITTED` through `RUNNING` are transient; `SUCCEEDED` and `FAILED` are
/// terminal. The executor owns the transitions; the pipeline only observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted by the executor, not yet evaluated for scheduling.
    Submitted,
    /// Waiting on a scheduling decision.
    Pending,
    /// Runnable and queued for resources.
    Runnable,
    /// Resources assigned, container starting.
    Starting,
    /// Executing.
    Running,
    /// Finished successfully. Terminal.
    Succeeded,
    /// Finished unsuccessfully. Terminal.
    Failed,
}

impl JobStatus {
    /// Returns true when no further transition can occur.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A job state-change event from the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStateChange {
    /// Name of the job, equal to the input object's ID.
    pub job_name: JobName,
    /// The state the job entered.
    pub status: JobStatus,
    /// Executor-supplied reason, usually present only for failures.
    #[serde(default)]
    pub status_reason: Option<String>,
}
