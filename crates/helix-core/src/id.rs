//! Strongly-typed identifiers for Helix entities.
//!
//! The pipeline has a single correlation key: the object identifier minted by
//! the ingress gate when a submission is staged. Every downstream component
//! derives identity from it: the batch job is named after it, the output
//! object is keyed by it, and the status record is keyed by the job name.
//!
//! Identifiers are:
//! - **Unguessable**: v4 UUIDs carry 122 random bits and encode nothing about
//!   creation time, so a staged input key cannot be predicted or enumerated
//! - **Globally unique**: no coordination required for generation
//! - **Strongly typed**: an [`ObjectId`] and a [`JobName`] cannot be mixed up
//!   at compile time even though they share a textual representation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A unique identifier for a staged input object.
///
/// Minted exactly once per accepted submission and never reused. This is the
/// idempotency key the whole pipeline coordinates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generates a new unique object ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an object ID from a raw UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the job name derived from this object ID.
    ///
    /// `job_name == object_id` is the invariant that lets the dispatcher and
    /// the status recorder correlate independent events without a shared
    /// database. This method is the only sanctioned way to derive one from
    /// the other.
    #[must_use]
    pub fn job_name(&self) -> JobName {
        JobName(self.0.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s).map(Self).map_err(|e| Error::InvalidId {
            message: format!("invalid object ID '{s}': {e}"),
        })
    }
}

/// The name of a batch job, identical to the object ID of its input.
///
/// Carried as a plain string because job state-change events arrive from the
/// executor with the name already rendered; parsing back to an [`ObjectId`]
/// is only needed when joining status to input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// Creates a job name from a raw string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the job name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the object ID this job name corresponds to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if the name is not a valid object ID,
    /// which means the job was not submitted by this pipeline.
    pub fn object_id(&self) -> Result<ObjectId> {
        self.0.parse()
    }
}

impl From<ObjectId> for JobName {
    fn from(id: ObjectId) -> Self {
        id.job_name()
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_are_unique() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn object_id_round_trips_through_string() {
        let id = ObjectId::generate();
        let parsed: ObjectId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn object_id_rejects_garbage() {
        let result: Result<ObjectId> = "not-a-uuid".parse();
        assert!(matches!(result, Err(Error::InvalidId { .. })));
    }

    #[test]
    fn job_name_matches_object_id() {
        let id = ObjectId::generate();
        let name = id.job_name();
        assert_eq!(name.as_str(), id.to_string());
        assert_eq!(name.object_id().expect("valid"), id);
    }

    #[test]
    fn foreign_job_name_fails_to_parse() {
        let name = JobName::new("some-external-job");
        assert!(name.object_id().is_err());
    }

    #[test]
    fn object_id_serializes_transparently() {
        let id = ObjectId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{id}\""));
    }
}
