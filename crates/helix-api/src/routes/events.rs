//! Event push endpoints.
//!
//! The bus delivers storage write-notifications and executor state changes
//! here. Delivery is at-least-once and unordered; both handlers are
//! re-entrant, acknowledge duplicates with a 200, and answer any failure with
//! a 5xx so the bus redelivers.
//!
//! ## Routes
//!
//! - `POST /events/object-created` - Drive the dispatcher
//! - `POST /events/job-state` - Drive the status recorder

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use helix_flow::{DispatchOutcome, JobStateChange, JobStatusRecord, ObjectCreated};

use crate::error::ApiResult;
use crate::server::AppState;

/// Acknowledgement for a processed write-notification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct DispatchAck {
    /// Name of the job the notification maps to.
    pub job_name: String,
    /// True when the notification was a redelivery for an existing job.
    pub duplicate: bool,
}

/// Event routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/object-created", post(object_created))
        .route("/events/job-state", post(job_state))
}

/// `POST /events/object-created`
///
/// Submits the job for a freshly staged input object.
async fn object_created(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ObjectCreated>,
) -> ApiResult<Json<DispatchAck>> {
    let outcome = state.dispatcher.handle(&event).await?;
    let ack = match outcome {
        DispatchOutcome::Submitted { job_name, job_id } => {
            tracing::info!(job_name = %job_name, job_id = %job_id, "job submitted");
            DispatchAck {
                job_name: job_name.to_string(),
                duplicate: false,
            }
        }
        DispatchOutcome::AlreadySubmitted { job_name } => {
            tracing::info!(job_name = %job_name, "duplicate notification acknowledged");
            DispatchAck {
                job_name: job_name.to_string(),
                duplicate: true,
            }
        }
    };
    Ok(Json(ack))
}

/// `POST /events/job-state`
///
/// Overwrites the status record for the named job.
async fn job_state(
    State(state): State<Arc<AppState>>,
    Json(event): Json<JobStateChange>,
) -> ApiResult<Json<JobStatusRecord>> {
    let record = state.recorder.record(&event).await?;
    tracing::info!(job_name = %event.job_name, status = ?event.status, "status recorded");
    Ok(Json(record))
}
