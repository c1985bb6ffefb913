//! Submission ingress route.
//!
//! The single write path into the pipeline. A submission carries a
//! verification token and a base64 payload; the gate assesses the token,
//! decodes the payload, and stages it under a freshly minted identifier.
//! Nothing downstream runs until the staged write is durable, so the response
//! id is only ever handed out for bytes that actually landed.
//!
//! ## Routes
//!
//! - `POST /submissions` - Verify and stage a payload

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use helix_core::{ObjectId, WritePrecondition};

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Submission request body.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Verification challenge token.
    #[serde(default)]
    pub token: Option<String>,
    /// Base64-encoded payload bytes.
    #[serde(default)]
    pub payload: Option<String>,
    /// Optional species the payload belongs to.
    #[serde(default)]
    pub species: Option<String>,
}

/// Submission response body.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct SubmitResponse {
    /// Whether the verification gate accepted the submission.
    pub is_valid: bool,
    /// Identifier of the staged payload; present only when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Submission routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/submissions", post(submit))
}

/// `POST /submissions`
///
/// Verifies the caller, then stages the decoded payload exactly once.
async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    let token = request
        .token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("token is required"))?;
    let payload_b64 = request
        .payload
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("payload is required"))?;

    if let Some(species) = request.species.as_deref() {
        if !state.config.species_allowlist.contains(species) {
            return Err(ApiError::bad_request(format!("unknown species: {species}")));
        }
    }

    let payload = base64::engine::general_purpose::STANDARD
        .decode(payload_b64)
        .map_err(|_| ApiError::bad_request("payload is not valid base64"))?;

    let assessment = state
        .verifier
        .assess(token, remote_ip(&headers).as_deref())
        .await?;
    if !assessment.accepted(state.config.verify.threshold) {
        tracing::info!(
            success = assessment.success,
            score = assessment.score,
            "submission denied by verification gate"
        );
        return Ok(Json(SubmitResponse {
            is_valid: false,
            id: None,
        }));
    }

    let id = ObjectId::generate();
    let key = state.paths.input_key(id);
    let payload_len = payload.len();
    let result = state
        .storage
        .put(&key, Bytes::from(payload), WritePrecondition::DoesNotExist)
        .await?;
    if !result.is_success() {
        // A v4 collision means id minting is broken, not that the caller retried.
        return Err(ApiError::internal(format!(
            "freshly minted id already staged: {id}"
        )));
    }

    tracing::info!(object_id = %id, bytes = payload_len, "submission staged");
    Ok(Json(SubmitResponse {
        is_valid: true,
        id: Some(id.to_string()),
    }))
}

fn remote_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}
