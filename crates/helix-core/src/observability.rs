//! Observability infrastructure for Helix.
//!
//! Structured logging with consistent spans across all handlers. Every
//! invocation is independent and short-lived, so the span carries the
//! correlation key (job name / object ID) that lets log lines from different
//! handlers be joined after the fact.

use std::fmt;
use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{fmt as sub_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at process startup. Safe to call multiple times; subsequent
/// calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `helix_flow=debug`)
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(sub_fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(sub_fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for a pipeline handler invocation.
///
/// # Example
///
/// ```rust
/// use helix_core::observability::pipeline_span;
///
/// let span = pipeline_span("dispatch", "8a2f…");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn pipeline_span(operation: &str, job_name: &str) -> Span {
    tracing::info_span!("pipeline", op = operation, job = job_name)
}

/// Wrapper that hides its contents from `Debug` and `Display` output.
///
/// Used for secrets carried in configuration so they cannot leak through
/// log lines or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct Redacted(String);

impl Redacted {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Exposes the inner secret. Call sites should be few and deliberate.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty);
    }

    #[test]
    fn pipeline_span_carries_fields() {
        let span = pipeline_span("record_status", "job-1");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }

    #[test]
    fn redacted_hides_secret_in_debug() {
        let secret = Redacted::new("recaptcha-secret");
        let rendered = format!("{secret:?}");
        assert_eq!(rendered, "[REDACTED]");
        assert_eq!(secret.expose(), "recaptcha-secret");
    }
}
