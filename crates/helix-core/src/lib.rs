//! # helix-core
//!
//! Core abstractions for the Helix sequence-prediction pipeline.
//!
//! This crate provides the foundational types shared by every Helix component:
//!
//! - **Identifiers**: the pipeline's correlation key ([`ObjectId`]) and its
//!   job-name alias ([`JobName`])
//! - **Storage**: the object-store abstraction all handlers coordinate through
//! - **Paths**: typed construction and parsing of the `input/`, `output/`, and
//!   `status/` namespaces
//! - **Errors**: shared error definitions and result types
//! - **Observability**: structured-logging initialization and span helpers
//!
//! ## Crate Boundary
//!
//! `helix-core` is the only crate allowed to define shared primitives. The
//! pipeline has no shared database; components agree on identity purely through
//! the types in this crate, so the key-layout convention must not be
//! re-derived anywhere else.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod object_store_backend;
pub mod observability;
pub mod paths;
pub mod storage;

pub use error::{Error, Result};
pub use id::{JobName, ObjectId};
pub use object_store_backend::ObjectStoreBackend;
pub use observability::{init_logging, LogFormat, Redacted};
pub use paths::PipelinePaths;
pub use storage::{MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult};
