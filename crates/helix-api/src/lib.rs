//! # helix-api
//!
//! HTTP composition layer for the Helix pipeline, handling:
//!
//! - **Ingress**: the verification-gated submission endpoint
//! - **Event push**: endpoints the bus delivers storage and executor events to
//! - **Configuration**: environment-driven `Config` with validated invariants
//! - **Observability**: request tracing, CORS, health and readiness checks
//!
//! ## Design Principles
//!
//! This crate is a thin composition layer with no pipeline policy. The
//! dispatch, status, and execution semantics live in `helix-flow`; handlers
//! here decode HTTP, delegate, and map errors to responses exactly once.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health                        - Health check
//! GET  /ready                         - Readiness check (storage reachability)
//! POST /api/v1/submissions            - Verify and stage a payload
//! POST /api/v1/events/object-created  - Drive the dispatcher
//! POST /api/v1/events/job-state       - Drive the status recorder
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod verify;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{AppState, Server};
