//! Execution worker: the inside of a batch job.
//!
//! Fetches the staged input, invokes the sequence model, writes the output.
//! The worker owns no state shared across jobs; arbitrarily many instances
//! may run concurrently because each touches only its own object's keys.
//!
//! On any failure the worker writes nothing; a partial or truncated output
//! object must never exist. The worker also never writes status: the
//! executor observes its process exit and broadcasts the terminal
//! state-change event, which the status recorder captures.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use helix_core::{ObjectId, PipelinePaths, StorageBackend, WritePrecondition};

use crate::error::{Error, Result};

/// Parameters for one model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelParams {
    /// Path to the model weights inside the worker container.
    pub model_path: String,
    /// Beam-search width.
    pub beam_width: u32,
    /// Whether to run on GPU.
    pub use_gpu: bool,
}

/// The external sequence-prediction computation.
///
/// Implementations wrap whatever actually runs the model; the pipeline treats
/// it as a function from input bytes and parameters to output bytes.
#[async_trait]
pub trait SequenceModel: Send + Sync {
    /// Runs the model over the input, returning the serialized predictions.
    async fn predict(&self, input: &[u8], params: &ModelParams) -> Result<Bytes>;
}

/// Execution worker handler.
pub struct ExecutionWorker {
    storage: Arc<dyn StorageBackend>,
    paths: PipelinePaths,
    model: Arc<dyn SequenceModel>,
}

impl ExecutionWorker {
    /// Creates a new worker.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        paths: PipelinePaths,
        model: Arc<dyn SequenceModel>,
    ) -> Self {
        Self {
            storage,
            paths,
            model,
        }
    }

    /// Runs one job: fetch input, predict, write output.
    ///
    /// Returns the output key on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] if the staged input is absent,
    /// [`Error::Computation`] if the model fails, or a storage error if the
    /// output write fails. In every error case no output object is written.
    pub async fn run(&self, object_id: ObjectId, params: &ModelParams) -> Result<String> {
        let input_key = self.paths.input_key(object_id);
        let input = match self.storage.get(&input_key).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                return Err(Error::MissingInput {
                    job_name: object_id.job_name(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let output = self.model.predict(&input, params).await?;

        // Overwrite is safe: a re-run of the same job recomputes the same
        // object, and nothing else ever writes this key.
        let output_key = self.paths.output_key(object_id);
        self.storage
            .put(&output_key, output, WritePrecondition::None)
            .await?;

        tracing::info!(job = %object_id, key = %output_key, "output written");
        Ok(output_key)
    }
}
