//! Job executor abstraction.
//!
//! This module provides:
//!
//! - [`JobExecutor`]: trait for submitting jobs to an execution backend
//! - [`JobSubmission`]: the submission payload (name + argument vector)
//! - [`MemoryExecutor`]: in-memory executor for testing
//!
//! ## Design Principles
//!
//! - **Backend agnostic**: the same interface covers a managed batch service
//!   and the in-memory test double
//! - **Idempotent submission**: job names deduplicate; resubmitting an
//!   existing name is a reported outcome, not an error
//! - **Fire and forget**: once submitted, the job is owned by the executor;
//!   the pipeline only observes its state-change events

pub mod http;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use helix_core::JobName;

use crate::error::{Error, Result};

pub use http::{HttpExecutorConfig, HttpJobExecutor};

/// A job submission payload.
///
/// The command vector carries everything the worker needs to locate its input
/// and output; the job name is the pipeline's correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSubmission {
    /// Job name, equal to the input object's ID.
    pub job_name: JobName,
    /// Argument vector passed to the worker container.
    pub command: Vec<String>,
}

impl JobSubmission {
    /// Creates a new submission.
    #[must_use]
    pub fn new(job_name: JobName, command: Vec<String>) -> Self {
        Self { job_name, command }
    }
}

/// Outcome of submitting a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The job was accepted and assigned an executor-side ID.
    Submitted {
        /// Executor-assigned job ID.
        job_id: String,
    },
    /// A job with this name already exists.
    ///
    /// Because write notifications are delivered at least once, this is a
    /// benign outcome: the first submission won and this one is a no-op.
    AlreadyExists,
}

impl SubmitOutcome {
    /// Returns true if this submission created the job.
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

/// Job executor trait.
///
/// Implementations must treat the job name as a deduplication key: submitting
/// the same name twice returns [`SubmitOutcome::AlreadyExists`] rather than
/// creating a second job or failing.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Submits a job for execution.
    async fn submit(&self, submission: JobSubmission) -> Result<SubmitOutcome>;
}

/// In-memory executor for testing.
///
/// Records every accepted submission and deduplicates by job name, matching
/// the contract production backends provide.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    jobs: Mutex<HashMap<String, JobSubmission>>,
    fail_submissions: Mutex<bool>,
}

impl MemoryExecutor {
    /// Creates a new empty executor.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the submission recorded for a job name, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn submission(&self, job_name: &JobName) -> Option<JobSubmission> {
        self.jobs
            .lock()
            .expect("executor lock poisoned")
            .get(job_name.as_str())
            .cloned()
    }

    /// Returns the number of jobs accepted so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.lock().expect("executor lock poisoned").len()
    }

    /// Makes subsequent submissions fail, simulating executor outage.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_fail_submissions(&self, fail: bool) {
        *self
            .fail_submissions
            .lock()
            .expect("executor lock poisoned") = fail;
    }
}

#[async_trait]
impl JobExecutor for MemoryExecutor {
    async fn submit(&self, submission: JobSubmission) -> Result<SubmitOutcome> {
        if *self
            .fail_submissions
            .lock()
            .map_err(|_| Error::submit("executor lock poisoned"))?
        {
            return Err(Error::submit("simulated executor outage"));
        }

        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| Error::submit("executor lock poisoned"))?;

        if jobs.contains_key(submission.job_name.as_str()) {
            return Ok(SubmitOutcome::AlreadyExists);
        }

        let job_id = format!("mem-{}", jobs.len() + 1);
        jobs.insert(submission.job_name.to_string(), submission);
        Ok(SubmitOutcome::Submitted { job_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str) -> JobSubmission {
        JobSubmission::new(
            JobName::new(name),
            vec!["bucket".into(), name.into(), "input/".into(), "output/".into()],
        )
    }

    #[tokio::test]
    async fn first_submission_wins() {
        let executor = MemoryExecutor::new();

        let first = executor.submit(submission("job-a")).await.expect("submit");
        assert!(first.is_submitted());

        let second = executor.submit(submission("job-a")).await.expect("submit");
        assert_eq!(second, SubmitOutcome::AlreadyExists);
        assert_eq!(executor.job_count(), 1);
    }

    #[tokio::test]
    async fn distinct_names_create_distinct_jobs() {
        let executor = MemoryExecutor::new();
        executor.submit(submission("job-a")).await.expect("submit");
        executor.submit(submission("job-b")).await.expect("submit");
        assert_eq!(executor.job_count(), 2);
    }

    #[tokio::test]
    async fn outage_surfaces_as_error() {
        let executor = MemoryExecutor::new();
        executor.set_fail_submissions(true);
        let err = executor.submit(submission("job-a")).await.unwrap_err();
        assert!(matches!(err, Error::Submit { .. }));
        assert_eq!(executor.job_count(), 0);
    }
}
