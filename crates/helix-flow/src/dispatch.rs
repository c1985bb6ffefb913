//! Dispatcher: turns one input-namespace write notification into exactly one
//! job submission.
//!
//! The dispatcher is stateless; everything it needs is in the notification
//! plus configuration. Job identity is derived from the object key, which is
//! what lets the status recorder later correlate executor events with the
//! staged input without a shared database.
//!
//! ## Idempotency
//!
//! The event bus may redeliver the same notification. The executor
//! deduplicates on job name, so a redelivered notification resolves to
//! [`DispatchOutcome::AlreadySubmitted`] and is acknowledged without side
//! effects. The dispatcher itself performs no retries: transient submission
//! failures propagate as invocation failures and the platform redelivers.

use std::sync::Arc;

use helix_core::{JobName, PipelinePaths};

use crate::error::{Error, Result};
use crate::events::ObjectCreated;
use crate::executor::{JobExecutor, JobSubmission, SubmitOutcome};

/// Execution parameters carried in every job's argument vector.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Model reference passed to the worker (`--model_path`).
    pub model_path: String,
    /// Beam-search width passed to the worker (`--beam_width`).
    pub beam_width: u32,
    /// Whether the worker should request GPU execution (`--gpu`).
    pub use_gpu: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            model_path: "/models/human.pt".to_string(),
            beam_width: 100,
            use_gpu: false,
        }
    }
}

/// Result of handling one write notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A job was submitted for this object.
    Submitted {
        /// The job name, equal to the object ID.
        job_name: JobName,
        /// Executor-assigned job ID.
        job_id: String,
    },
    /// A job with this name already existed; the notification was a duplicate.
    AlreadySubmitted {
        /// The job name, equal to the object ID.
        job_name: JobName,
    },
}

/// Dispatcher handler.
pub struct Dispatcher {
    executor: Arc<dyn JobExecutor>,
    paths: PipelinePaths,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a new dispatcher.
    #[must_use]
    pub fn new(executor: Arc<dyn JobExecutor>, paths: PipelinePaths, config: DispatchConfig) -> Self {
        Self {
            executor,
            paths,
            config,
        }
    }

    /// Handles one write notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedEventKey`] when the key is outside the input
    /// namespace (the event must not be acknowledged; no job was submitted),
    /// or a submission error when the executor call fails.
    pub async fn handle(&self, event: &ObjectCreated) -> Result<DispatchOutcome> {
        let object_id = self
            .paths
            .parse_input_key(&event.object_key)
            .map_err(|e| Error::MalformedEventKey {
                message: e.to_string(),
            })?;
        let job_name = object_id.job_name();

        let submission = JobSubmission::new(
            job_name.clone(),
            self.command_vector(&event.bucket, &job_name),
        );

        match self.executor.submit(submission).await? {
            SubmitOutcome::Submitted { job_id } => {
                tracing::info!(job = %job_name, job_id = %job_id, "job submitted");
                Ok(DispatchOutcome::Submitted { job_name, job_id })
            }
            SubmitOutcome::AlreadyExists => {
                tracing::info!(job = %job_name, "duplicate notification; job already exists");
                Ok(DispatchOutcome::AlreadySubmitted { job_name })
            }
        }
    }

    /// Builds the argument vector for a job.
    ///
    /// Layout: `[bucket, object_id, input_prefix, output_prefix,
    /// --model_path <ref>, --beam_width <n>, --gpu?]`. The worker binary
    /// parses exactly this shape.
    fn command_vector(&self, bucket: &str, job_name: &JobName) -> Vec<String> {
        let mut command = vec![
            bucket.to_string(),
            job_name.to_string(),
            self.paths.input_prefix().to_string(),
            self.paths.output_prefix().to_string(),
            "--model_path".to_string(),
            self.config.model_path.clone(),
            "--beam_width".to_string(),
            self.config.beam_width.to_string(),
        ];
        if self.config.use_gpu {
            command.push("--gpu".to_string());
        }
        command
    }
}
