//! Stall detection for jobs that never reached a user-visible terminal state.
//!
//! The pipeline must never leave a job stuck in a transient state without
//! feedback: a lost terminal event, a wedged executor, or a worker that
//! succeeded without its output surviving are all reportable anomalies, not
//! silent gaps. The watchdog is a pure check over durable state; it caches
//! nothing and schedules nothing; ops tooling decides when to invoke it.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use helix_core::{JobName, PipelinePaths, StorageBackend};

use crate::error::Result;
use crate::events::JobStatus;
use crate::status::StatusRecorder;

/// Health assessment for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobHealth {
    /// The job is still inside its allowed window.
    InProgress {
        /// Last delivered status, if any event has arrived yet.
        last_status: Option<JobStatus>,
    },
    /// The job exceeded the maximum wait without a terminal status.
    Stalled {
        /// Last delivered status, if any event has arrived yet.
        last_status: Option<JobStatus>,
        /// How long the job has been waiting.
        waited: Duration,
    },
    /// The job succeeded and its output object exists.
    Succeeded,
    /// The job reported success but no output object exists.
    ///
    /// This is a correctness violation: the terminal record and the output
    /// write disagree.
    MissingOutput,
    /// The job failed; the reason comes from the status record.
    Failed {
        /// Executor-supplied failure reason, if any.
        reason: Option<String>,
    },
}

/// Watchdog over job status records and outputs.
pub struct Watchdog {
    storage: Arc<dyn StorageBackend>,
    paths: PipelinePaths,
    max_wait: Duration,
}

impl Watchdog {
    /// Creates a watchdog with the given maximum wait for a terminal status.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, paths: PipelinePaths, max_wait: Duration) -> Self {
        Self {
            storage,
            paths,
            max_wait,
        }
    }

    /// Assesses a job staged at `staged_at`, evaluated now.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if the status record cannot
    /// be read.
    pub async fn check(&self, job_name: &JobName, staged_at: DateTime<Utc>) -> Result<JobHealth> {
        self.check_at(job_name, staged_at, Utc::now()).await
    }

    /// Assesses a job as of an explicit evaluation time.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if the status record cannot
    /// be read.
    pub async fn check_at(
        &self,
        job_name: &JobName,
        staged_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<JobHealth> {
        let recorder = StatusRecorder::new(Arc::clone(&self.storage), self.paths.clone());
        let record = recorder.read(job_name).await?;

        match record {
            Some(record) if record.status == JobStatus::Succeeded => {
                if let Ok(object_id) = job_name.object_id() {
                    let output_key = self.paths.output_key(object_id);
                    if self.storage.head(&output_key).await?.is_none() {
                        tracing::warn!(job = %job_name, "terminal SUCCEEDED but output is missing");
                        return Ok(JobHealth::MissingOutput);
                    }
                }
                Ok(JobHealth::Succeeded)
            }
            Some(record) if record.status == JobStatus::Failed => Ok(JobHealth::Failed {
                reason: record.status_reason,
            }),
            other => {
                let last_status = other.map(|record| record.status);
                let waited = now - staged_at;
                if waited > self.max_wait {
                    tracing::warn!(
                        job = %job_name,
                        waited_secs = waited.num_seconds(),
                        last_status = ?last_status,
                        "job has no terminal status past the maximum wait"
                    );
                    Ok(JobHealth::Stalled {
                        last_status,
                        waited,
                    })
                } else {
                    Ok(JobHealth::InProgress { last_status })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::JobStateChange;
    use bytes::Bytes;
    use helix_core::{MemoryBackend, ObjectId, WritePrecondition};

    fn watchdog(storage: Arc<MemoryBackend>) -> Watchdog {
        Watchdog::new(storage, PipelinePaths::default(), Duration::minutes(30))
    }

    async fn record(storage: &Arc<MemoryBackend>, name: &JobName, status: JobStatus) {
        StatusRecorder::new(storage.clone(), PipelinePaths::default())
            .record(&JobStateChange {
                job_name: name.clone(),
                status,
                status_reason: if status == JobStatus::Failed {
                    Some("OOM".into())
                } else {
                    None
                },
            })
            .await
            .expect("record");
    }

    #[tokio::test]
    async fn no_record_within_window_is_in_progress() {
        let storage = Arc::new(MemoryBackend::new());
        let staged = Utc::now();

        let health = watchdog(storage)
            .check_at(&JobName::new("j1"), staged, staged + Duration::minutes(5))
            .await
            .expect("check");
        assert_eq!(health, JobHealth::InProgress { last_status: None });
    }

    #[tokio::test]
    async fn no_terminal_past_window_is_stalled() {
        let storage = Arc::new(MemoryBackend::new());
        let name = JobName::new("j2");
        record(&storage, &name, JobStatus::Running).await;
        let staged = Utc::now();

        let health = watchdog(storage)
            .check_at(&name, staged, staged + Duration::hours(2))
            .await
            .expect("check");
        assert!(matches!(
            health,
            JobHealth::Stalled {
                last_status: Some(JobStatus::Running),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_reports_reason() {
        let storage = Arc::new(MemoryBackend::new());
        let name = JobName::new("j3");
        record(&storage, &name, JobStatus::Failed).await;

        let health = watchdog(storage)
            .check_at(&name, Utc::now(), Utc::now())
            .await
            .expect("check");
        assert_eq!(
            health,
            JobHealth::Failed {
                reason: Some("OOM".into())
            }
        );
    }

    #[tokio::test]
    async fn succeeded_without_output_is_a_violation() {
        let storage = Arc::new(MemoryBackend::new());
        let id = ObjectId::generate();
        let name = id.job_name();
        record(&storage, &name, JobStatus::Succeeded).await;

        let health = watchdog(storage)
            .check_at(&name, Utc::now(), Utc::now())
            .await
            .expect("check");
        assert_eq!(health, JobHealth::MissingOutput);
    }

    #[tokio::test]
    async fn succeeded_with_output_is_healthy() {
        let storage = Arc::new(MemoryBackend::new());
        let id = ObjectId::generate();
        let name = id.job_name();
        record(&storage, &name, JobStatus::Succeeded).await;
        storage
            .put(
                &format!("output/{id}"),
                Bytes::from_static(b"preds"),
                WritePrecondition::None,
            )
            .await
            .expect("put output");

        let health = watchdog(storage)
            .check_at(&name, Utc::now(), Utc::now())
            .await
            .expect("check");
        assert_eq!(health, JobHealth::Succeeded);
    }
}
