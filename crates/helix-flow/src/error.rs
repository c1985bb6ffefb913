//! Error types for the pipeline domain.

use helix_core::JobName;

/// The result type used throughout helix-flow.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A write notification carried a key outside the input namespace.
    ///
    /// The invocation must fail without acknowledging the event so the bus
    /// redelivers it; no job was submitted.
    #[error("malformed event key: {message}")]
    MalformedEventKey {
        /// Description of the malformed key.
        message: String,
    },

    /// A job submission to the executor failed.
    #[error("job submission failed: {message}")]
    Submit {
        /// Description of the submission failure.
        message: String,
    },

    /// The staged input for a job was missing.
    #[error("input object missing for job {job_name}")]
    MissingInput {
        /// The job whose input was not found.
        job_name: JobName,
    },

    /// The external computation failed.
    #[error("computation failed: {message}")]
    Computation {
        /// Description of the computation failure.
        message: String,
    },

    /// A serialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An error from helix-core (storage, identifiers).
    #[error(transparent)]
    Core(#[from] helix_core::Error),
}

impl Error {
    /// Creates a new submission error.
    #[must_use]
    pub fn submit(message: impl Into<String>) -> Self {
        Self::Submit {
            message: message.into(),
        }
    }

    /// Creates a new computation error.
    #[must_use]
    pub fn computation(message: impl Into<String>) -> Self {
        Self::Computation {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}
