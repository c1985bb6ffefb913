//! HTTP job-executor client.
//!
//! Submits jobs to a managed batch service over its REST surface. The request
//! shape mirrors the batch `SubmitJob` call: a job definition and queue fixed
//! by configuration, plus the per-job name and command vector.
//!
//! ## Idempotency
//!
//! The service deduplicates on job name; a `409 Conflict` response maps to
//! [`SubmitOutcome::AlreadyExists`] and is never surfaced as an error. Any
//! other non-success status is a submission failure the caller propagates so
//! the platform's redelivery policy retries the triggering event.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use helix_core::Redacted;

use super::{JobExecutor, JobSubmission, SubmitOutcome};
use crate::error::{Error, Result};

/// Configuration for the HTTP executor client.
#[derive(Debug, Clone)]
pub struct HttpExecutorConfig {
    /// Base URL of the batch service (e.g. `https://batch.internal`).
    pub service_url: String,
    /// Job definition reference submitted with every job.
    pub job_definition: String,
    /// Queue jobs are submitted to.
    pub job_queue: String,
    /// Optional bearer token for the service.
    pub bearer_token: Option<Redacted>,
    /// Request timeout (default: 30 seconds).
    pub timeout: Duration,
}

impl HttpExecutorConfig {
    /// Creates a config with required fields and default timeout.
    #[must_use]
    pub fn new(
        service_url: impl Into<String>,
        job_definition: impl Into<String>,
        job_queue: impl Into<String>,
    ) -> Self {
        Self {
            service_url: service_url.into(),
            job_definition: job_definition.into(),
            job_queue: job_queue.into(),
            bearer_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets a bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(Redacted::new(token));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any required field is empty.
    pub fn validate(&self) -> Result<()> {
        if self.service_url.trim().is_empty() {
            return Err(Error::submit("executor service_url cannot be empty"));
        }
        if self.job_definition.trim().is_empty() {
            return Err(Error::submit("executor job_definition cannot be empty"));
        }
        if self.job_queue.trim().is_empty() {
            return Err(Error::submit("executor job_queue cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJobRequest<'a> {
    job_definition: &'a str,
    job_queue: &'a str,
    job_name: &'a str,
    container_overrides: ContainerOverrides<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerOverrides<'a> {
    command: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// HTTP client implementing [`JobExecutor`].
#[derive(Debug)]
pub struct HttpJobExecutor {
    config: HttpExecutorConfig,
    client: reqwest::Client,
}

impl HttpJobExecutor {
    /// Creates a new executor client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: HttpExecutorConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::submit(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn submit_url(&self) -> String {
        format!("{}/v1/submitjob", self.config.service_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl JobExecutor for HttpJobExecutor {
    async fn submit(&self, submission: JobSubmission) -> Result<SubmitOutcome> {
        let request = SubmitJobRequest {
            job_definition: &self.config.job_definition,
            job_queue: &self.config.job_queue,
            job_name: submission.job_name.as_str(),
            container_overrides: ContainerOverrides {
                command: &submission.command,
            },
        };

        let mut builder = self.client.post(self.submit_url()).json(&request);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token.expose());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::submit(format!("executor request failed: {e}")))?;

        let status = response.status();

        if status.is_success() {
            let body: SubmitJobResponse = response
                .json()
                .await
                .map_err(|e| Error::submit(format!("failed to parse submit response: {e}")))?;
            return Ok(SubmitOutcome::Submitted { job_id: body.job_id });
        }

        if status == reqwest::StatusCode::CONFLICT {
            return Ok(SubmitOutcome::AlreadyExists);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());

        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&error_body) {
            return Err(Error::submit(format!(
                "executor rejected submission: {} ({status})",
                parsed.message
            )));
        }

        Err(Error::submit(format!(
            "executor rejected submission: {status} - {error_body}"
        )))
    }
}
