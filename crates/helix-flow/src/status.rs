//! Status recorder: projects executor state-change events into durable status
//! records.
//!
//! The recorder has no notion of a previous state. It is a pure projection:
//! each event is reduced to three fields and written over whatever record
//! exists. Because state-change delivery is at-least-once and may reorder
//! across partitions, the record reflects the most recently *delivered*
//! event, not necessarily the most recently *emitted* one; readers must
//! treat it as eventually consistent. That limitation is accepted, not
//! hidden.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use helix_core::{JobName, PipelinePaths, StorageBackend, WritePrecondition};

use crate::error::{Error, Result};
use crate::events::{JobStateChange, JobStatus};

/// The durable status record at `status/{jobName}.json`.
///
/// Field order is part of the wire contract: records serialize as
/// `{"jobName":…,"status":…,"statusReason":…}` with an explicit `null` for a
/// missing reason, so duplicate events produce byte-identical records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusRecord {
    /// Name of the job.
    pub job_name: JobName,
    /// Last delivered status.
    pub status: JobStatus,
    /// Executor-supplied reason, or null.
    pub status_reason: Option<String>,
}

impl From<&JobStateChange> for JobStatusRecord {
    fn from(event: &JobStateChange) -> Self {
        Self {
            job_name: event.job_name.clone(),
            status: event.status,
            status_reason: event.status_reason.clone(),
        }
    }
}

/// Status recorder handler.
pub struct StatusRecorder {
    storage: Arc<dyn StorageBackend>,
    paths: PipelinePaths,
}

impl StatusRecorder {
    /// Creates a new status recorder.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, paths: PipelinePaths) -> Self {
        Self { storage, paths }
    }

    /// Handles one state-change event.
    ///
    /// Unconditionally overwrites the record. Write failures propagate so the
    /// platform redelivers the event; there is no retry here.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the record cannot be encoded, or a
    /// storage error if the put fails.
    pub async fn record(&self, event: &JobStateChange) -> Result<JobStatusRecord> {
        let record = JobStatusRecord::from(event);
        let body = serde_json::to_vec(&record).map_err(|e| Error::serialization(e.to_string()))?;
        let key = self.paths.status_key(&record.job_name);

        self.storage
            .put(&key, Bytes::from(body), WritePrecondition::None)
            .await?;

        tracing::info!(job = %record.job_name, status = ?record.status, "status recorded");
        Ok(record)
    }

    /// Reads the current status record for a job, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error on read failure or a serialization error if an
    /// existing record cannot be decoded.
    pub async fn read(&self, job_name: &JobName) -> Result<Option<JobStatusRecord>> {
        let key = self.paths.status_key(job_name);
        match self.storage.get(&key).await {
            Ok(bytes) => {
                let record = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::serialization(e.to_string()))?;
                Ok(Some(record))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
