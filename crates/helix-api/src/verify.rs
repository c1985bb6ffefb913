//! Human-verification oracle.
//!
//! Every submission carries a challenge token; the oracle assesses it and
//! returns a success flag plus a score. The gate accepts only when the
//! assessment succeeded and the score clears the configured threshold.
//! Transport failures and unreadable assessments are internal errors, never a
//! quiet denial: the gate fails closed without pretending the caller was
//! assessed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use helix_core::{Error, Result};

use crate::config::VerifyConfig;

/// Outcome of a token assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// Whether the oracle recognized the token at all.
    pub success: bool,
    /// Confidence that the submitter is human, in `[0.0, 1.0]`.
    pub score: f64,
}

impl Assessment {
    /// Returns true when the assessment clears the acceptance threshold.
    #[must_use]
    pub fn accepted(&self, threshold: f64) -> bool {
        self.success && self.score >= threshold
    }
}

/// Assesses a submission token.
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    /// Assesses `token`, optionally attributing the caller's address.
    async fn assess(&self, token: &str, remote_ip: Option<&str>) -> Result<Assessment>;
}

/// Wire shape of the oracle's assessment response.
#[derive(Debug, Deserialize)]
struct AssessmentResponse {
    success: bool,
    #[serde(default)]
    score: f64,
}

/// Oracle client posting tokens to an external verification endpoint.
pub struct HttpVerifier {
    client: reqwest::Client,
    config: VerifyConfig,
}

impl HttpVerifier {
    /// Creates a verifier for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: VerifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::internal(format!("failed to build verify client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VerificationOracle for HttpVerifier {
    async fn assess(&self, token: &str, remote_ip: Option<&str>) -> Result<Assessment> {
        let mut form = vec![
            ("secret", self.config.secret.expose().to_string()),
            ("response", token.to_string()),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip.to_string()));
        }

        let response = self
            .client
            .post(&self.config.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::internal(format!("verification request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::internal(format!(
                "verification endpoint returned {status}"
            )));
        }

        let body: AssessmentResponse = response.json().await.map_err(|e| {
            Error::internal(format!("verification response unreadable: {e}"))
        })?;

        tracing::debug!(success = body.success, score = body.score, "token assessed");
        Ok(Assessment {
            success: body.success,
            score: body.score,
        })
    }
}

/// Test oracle that returns a fixed assessment, or fails outright.
#[derive(Debug, Clone, Copy)]
pub struct StaticVerifier {
    outcome: Option<Assessment>,
}

impl StaticVerifier {
    /// An oracle that always returns the given assessment.
    #[must_use]
    pub fn returning(success: bool, score: f64) -> Self {
        Self {
            outcome: Some(Assessment { success, score }),
        }
    }

    /// An oracle whose endpoint is unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { outcome: None }
    }
}

#[async_trait]
impl VerificationOracle for StaticVerifier {
    async fn assess(&self, _token: &str, _remote_ip: Option<&str>) -> Result<Assessment> {
        self.outcome
            .ok_or_else(|| Error::internal("verification endpoint unreachable"))
    }
}
