//! Typed key helpers for the pipeline's object-store namespaces.
//!
//! Every durable artifact lives under one of three prefixes, each written by
//! exactly one component:
//!
//! - `input/{object_id}`: staged submission payloads (ingress gate)
//! - `output/{object_id}`: computation results (execution worker)
//! - `status/{job_name}.json`: job status records (status recorder)
//!
//! Key construction and parsing both live here so the convention cannot drift
//! between the component that writes a key and the one that reacts to its
//! write notification.

use crate::error::{Error, Result};
use crate::id::{JobName, ObjectId};

/// Default prefix for staged input objects.
pub const DEFAULT_INPUT_PREFIX: &str = "input/";

/// Default prefix for computation outputs.
pub const DEFAULT_OUTPUT_PREFIX: &str = "output/";

/// Default prefix for job status records.
pub const DEFAULT_STATUS_PREFIX: &str = "status/";

/// Typed paths for pipeline artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    input_prefix: String,
    output_prefix: String,
    status_prefix: String,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self::new(
            DEFAULT_INPUT_PREFIX,
            DEFAULT_OUTPUT_PREFIX,
            DEFAULT_STATUS_PREFIX,
        )
        .expect("default prefixes are valid")
    }
}

impl PipelinePaths {
    /// Creates typed paths with explicit namespace prefixes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any prefix is empty, does not end
    /// with `/`, or collides with another prefix.
    pub fn new(
        input_prefix: impl Into<String>,
        output_prefix: impl Into<String>,
        status_prefix: impl Into<String>,
    ) -> Result<Self> {
        let input_prefix = validate_prefix(input_prefix.into(), "input")?;
        let output_prefix = validate_prefix(output_prefix.into(), "output")?;
        let status_prefix = validate_prefix(status_prefix.into(), "status")?;

        if input_prefix == output_prefix
            || input_prefix == status_prefix
            || output_prefix == status_prefix
        {
            return Err(Error::InvalidInput(
                "namespace prefixes must be distinct".to_string(),
            ));
        }

        Ok(Self {
            input_prefix,
            output_prefix,
            status_prefix,
        })
    }

    /// Returns the input namespace prefix.
    #[must_use]
    pub fn input_prefix(&self) -> &str {
        &self.input_prefix
    }

    /// Returns the output namespace prefix.
    #[must_use]
    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    /// Returns the status namespace prefix.
    #[must_use]
    pub fn status_prefix(&self) -> &str {
        &self.status_prefix
    }

    /// Returns the key for a staged input object.
    #[must_use]
    pub fn input_key(&self, id: ObjectId) -> String {
        format!("{}{id}", self.input_prefix)
    }

    /// Returns the key for a computation output object.
    #[must_use]
    pub fn output_key(&self, id: ObjectId) -> String {
        format!("{}{id}", self.output_prefix)
    }

    /// Returns the key for a job status record.
    #[must_use]
    pub fn status_key(&self, job_name: &JobName) -> String {
        format!("{}{job_name}.json", self.status_prefix)
    }

    /// Extracts the object ID from an input-namespace key.
    ///
    /// This is the inverse of [`Self::input_key`], used by the dispatcher to
    /// derive job identity from a write notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key is not under the input
    /// prefix, and [`Error::InvalidId`] if the remainder is not an object ID.
    pub fn parse_input_key(&self, key: &str) -> Result<ObjectId> {
        let remainder = key.strip_prefix(self.input_prefix.as_str()).ok_or_else(|| {
            Error::InvalidInput(format!(
                "key '{key}' is not under the input namespace '{}'",
                self.input_prefix
            ))
        })?;
        remainder.parse()
    }
}

fn validate_prefix(prefix: String, which: &str) -> Result<String> {
    if prefix.is_empty() || !prefix.ends_with('/') {
        return Err(Error::InvalidInput(format!(
            "{which} prefix must be non-empty and end with '/' (got '{prefix}')"
        )));
    }
    Ok(prefix)
}
