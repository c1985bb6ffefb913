//! API server implementation.
//!
//! Hosts the ingress gate and the event push endpoints for the Helix
//! pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use helix_core::{MemoryBackend, PipelinePaths, Result, StorageBackend};
use helix_flow::{
    Dispatcher, HttpExecutorConfig, HttpJobExecutor, JobExecutor, MemoryExecutor, StatusRecorder,
};

use crate::config::{Config, CorsConfig};
use crate::verify::{HttpVerifier, StaticVerifier, VerificationOracle};

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// Service readiness status.
    pub ready: bool,
    /// Optional message about readiness state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared application state for all request handlers.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Namespace layout shared by every component.
    pub paths: PipelinePaths,
    /// Storage backend payloads are staged to.
    pub storage: Arc<dyn StorageBackend>,
    /// Verification oracle for the ingress gate.
    pub verifier: Arc<dyn VerificationOracle>,
    /// Dispatcher driven by object-created events.
    pub dispatcher: Dispatcher,
    /// Recorder driven by job-state events.
    pub recorder: StatusRecorder,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("paths", &self.paths)
            .field("storage", &"<StorageBackend>")
            .field("verifier", &"<VerificationOracle>")
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires up application state from configuration plus explicit
    /// collaborators.
    #[must_use]
    pub fn new(
        config: Config,
        storage: Arc<dyn StorageBackend>,
        verifier: Arc<dyn VerificationOracle>,
        executor: Arc<dyn JobExecutor>,
    ) -> Self {
        let paths = PipelinePaths::default();
        let dispatcher = Dispatcher::new(executor, paths.clone(), config.dispatch.clone());
        let recorder = StatusRecorder::new(Arc::clone(&storage), paths.clone());
        Self {
            config,
            paths,
            storage,
            verifier,
            dispatcher,
            recorder,
        }
    }

    /// Test state: in-memory storage and executor, fixed-outcome verifier.
    #[must_use]
    pub fn for_tests(config: Config, verifier: StaticVerifier) -> Self {
        Self::new(
            config,
            Arc::new(MemoryBackend::new()),
            Arc::new(verifier),
            MemoryExecutor::new(),
        )
    }
}

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check
/// that doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check endpoint handler.
///
/// A `HEAD` on a missing key is sufficient to validate credentials and the
/// network path without listing the bucket.
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.storage.head("__helix/ready-check").await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        ),
        Err(e) => {
            // The cause may name buckets or credentials; log it, never echo it.
            tracing::error!(error = %e, "readiness storage check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    message: Some("storage unreachable".to_string()),
                }),
            )
        }
    }
}

/// The Helix API server.
pub struct Server {
    state: Arc<AppState>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("state", &self.state)
            .finish()
    }
}

impl Server {
    /// Creates a server around prepared application state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Wires production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any HTTP client cannot be constructed.
    pub fn from_config(config: Config, storage: Arc<dyn StorageBackend>) -> Result<Self> {
        let verifier = Arc::new(HttpVerifier::new(config.verify.clone())?);

        let executor: Arc<dyn JobExecutor> = if config.executor.service_url.is_empty() {
            tracing::warn!("HELIX_EXECUTOR_URL not set; using in-memory executor (debug only)");
            MemoryExecutor::new()
        } else {
            let mut executor_config = HttpExecutorConfig::new(
                config.executor.service_url.clone(),
                config.executor.job_definition.clone(),
                config.executor.job_queue.clone(),
            );
            if let Some(token) = &config.executor.bearer_token {
                executor_config = executor_config.with_bearer_token(token.expose());
            }
            Arc::new(
                HttpJobExecutor::new(executor_config)
                    .map_err(|e| helix_core::Error::internal(e.to_string()))?,
            )
        };

        Ok(Self::new(AppState::new(config, storage, verifier, executor)))
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::clone(&self.state);
        let cors = build_cors_layer(&state.config.cors);

        Router::new()
            .route("/health", get(health))
            .route("/ready", get(ready))
            .nest("/api/v1", crate::routes::api_v1_routes())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to the configured port.
    pub async fn serve(&self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.create_router();

        tracing::info!(http_port = self.state.config.http_port, "Starting Helix API server");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| helix_core::Error::internal(format!("failed to bind to {addr}: {e}")))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| helix_core::Error::internal(format!("server error: {e}")))?;

        Ok(())
    }

    /// Creates a router without binding a port, for integration tests.
    #[doc(hidden)]
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }

    /// Returns the shared application state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }
}

/// Builds the CORS layer from configuration.
///
/// The method and header allow-lists are fixed; configuration controls only
/// which origins may use them.
fn build_cors_layer(cors_config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::DELETE,
            Method::GET,
            Method::HEAD,
            Method::OPTIONS,
            Method::PATCH,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-api-key"),
        ]);

    if cors_config.allowed_origins.is_empty() {
        return cors;
    }

    if cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*" {
        return cors.allow_origin(Any);
    }

    let mut allowed = Vec::new();
    for origin in &cors_config.allowed_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => allowed.push(value),
            Err(_) => {
                tracing::error!(origin = %origin, "Invalid CORS origin; skipping");
            }
        }
    }

    if allowed.is_empty() {
        tracing::warn!("All configured CORS origins were invalid; CORS disabled");
        cors
    } else {
        tracing::info!(origins = ?cors_config.allowed_origins, "CORS configured");
        cors.allow_origin(AllowOrigin::list(allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bytes::Bytes;
    use helix_core::{ObjectMeta, WritePrecondition, WriteResult};

    /// Backend whose every operation fails with a detail-laden error.
    struct BrokenBackend;

    #[async_trait]
    impl helix_core::StorageBackend for BrokenBackend {
        async fn get(&self, _path: &str) -> helix_core::Result<Bytes> {
            Err(helix_core::Error::storage("credentials rejected for gs://secret-bucket"))
        }

        async fn put(
            &self,
            _path: &str,
            _data: Bytes,
            _precondition: WritePrecondition,
        ) -> helix_core::Result<WriteResult> {
            Err(helix_core::Error::storage("credentials rejected for gs://secret-bucket"))
        }

        async fn head(&self, _path: &str) -> helix_core::Result<Option<ObjectMeta>> {
            Err(helix_core::Error::storage("credentials rejected for gs://secret-bucket"))
        }

        async fn list(&self, _prefix: &str) -> helix_core::Result<Vec<ObjectMeta>> {
            Err(helix_core::Error::storage("credentials rejected for gs://secret-bucket"))
        }
    }

    #[tokio::test]
    async fn ready_failure_body_omits_storage_detail() {
        let state = Arc::new(AppState::new(
            Config::for_tests(),
            Arc::new(BrokenBackend),
            Arc::new(StaticVerifier::returning(true, 1.0)),
            helix_flow::MemoryExecutor::new(),
        ));

        let response = ready(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let parsed: ReadyResponse = serde_json::from_slice(&body).expect("parse body");
        assert!(!parsed.ready);
        assert_eq!(parsed.message.as_deref(), Some("storage unreachable"));
        assert!(!String::from_utf8_lossy(&body).contains("secret-bucket"));
    }

    #[test]
    fn cors_layer_accepts_origin_lists() {
        let config = CorsConfig {
            allowed_origins: vec![
                "https://helix.example".to_string(),
                "not a header value\u{0}".to_string(),
            ],
        };
        // Invalid origins are skipped rather than failing startup.
        let _layer = build_cors_layer(&config);
    }

    #[test]
    fn app_state_debug_omits_collaborators() {
        let state = AppState::for_tests(Config::for_tests(), StaticVerifier::returning(true, 1.0));
        let rendered = format!("{state:?}");
        assert!(rendered.contains("<StorageBackend>"));
        assert!(!rendered.contains("test-secret"));
    }
}
