//! Server configuration.

use std::collections::BTreeSet;

use helix_core::{Error, Redacted, Result};
use helix_flow::DispatchConfig;

/// Default verification score threshold below which submissions are denied.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Verification oracle settings.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Endpoint the token is posted to for assessment.
    pub url: String,
    /// Shared secret identifying this deployment to the oracle.
    pub secret: Redacted,
    /// Minimum score an assessment must reach to be accepted.
    pub threshold: f64,
}

/// Job submission settings passed through to the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base URL of the job-submission service.
    pub service_url: String,
    /// Job definition name registered with the executor.
    pub job_definition: String,
    /// Queue the job is submitted to.
    pub job_queue: String,
    /// Optional bearer token for the submission service.
    pub bearer_token: Option<Redacted>,
}

/// CORS configuration for browser-based access.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins. Use `["*"]` to allow all origins (development only).
    /// Empty list disables CORS entirely.
    pub allowed_origins: Vec<String>,
}

/// Configuration for the Helix API server.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Enable debug mode: pretty logs, in-memory storage fallback.
    pub debug: bool,

    /// Object storage bucket (`s3://bucket` or `gs://bucket`).
    ///
    /// Required outside debug mode; absent in debug mode the server runs on
    /// in-memory storage.
    pub bucket: Option<String>,

    /// Verification oracle settings.
    pub verify: VerifyConfig,

    /// Executor submission settings.
    pub executor: ExecutorConfig,

    /// Species submissions may name.
    ///
    /// Submissions naming a species outside this list are rejected. The
    /// model reference used at dispatch time is `dispatch.model_path`; the
    /// list only gates what the ingress accepts.
    pub species_allowlist: BTreeSet<String>,

    /// Dispatch parameters (model reference, search width, compute class).
    pub dispatch: DispatchConfig,

    /// CORS configuration.
    pub cors: CorsConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Supported env vars:
    /// - `HELIX_HTTP_PORT`
    /// - `HELIX_DEBUG`
    /// - `HELIX_STORAGE_BUCKET`
    /// - `HELIX_VERIFY_URL`
    /// - `HELIX_VERIFY_SECRET` (required)
    /// - `HELIX_SCORE_THRESHOLD` (default: 0.5)
    /// - `HELIX_EXECUTOR_URL`
    /// - `HELIX_JOB_DEFINITION`
    /// - `HELIX_JOB_QUEUE`
    /// - `HELIX_EXECUTOR_BEARER_TOKEN`
    /// - `HELIX_SPECIES` (comma-separated allow-list, default: `human`)
    /// - `HELIX_MODEL_PATH`
    /// - `HELIX_BEAM_WIDTH`
    /// - `HELIX_USE_GPU`
    /// - `HELIX_CORS_ALLOWED_ORIGINS` (comma-separated, or `*`)
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any variable is
    /// present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let secret = env_string("HELIX_VERIFY_SECRET")
            .ok_or_else(|| Error::InvalidInput("HELIX_VERIFY_SECRET is required".to_string()))?;

        let mut config = Self {
            http_port: 8080,
            debug: false,
            bucket: env_string("HELIX_STORAGE_BUCKET"),
            verify: VerifyConfig {
                url: env_string("HELIX_VERIFY_URL").unwrap_or_else(default_verify_url),
                secret: Redacted::new(secret),
                threshold: DEFAULT_SCORE_THRESHOLD,
            },
            executor: ExecutorConfig {
                service_url: env_string("HELIX_EXECUTOR_URL").unwrap_or_default(),
                job_definition: env_string("HELIX_JOB_DEFINITION").unwrap_or_default(),
                job_queue: env_string("HELIX_JOB_QUEUE").unwrap_or_default(),
                bearer_token: env_string("HELIX_EXECUTOR_BEARER_TOKEN").map(Redacted::new),
            },
            species_allowlist: default_species_allowlist(),
            dispatch: DispatchConfig::default(),
            cors: CorsConfig::default(),
        };

        if let Some(port) = env_u16("HELIX_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env_bool("HELIX_DEBUG")? {
            config.debug = debug;
        }
        if let Some(threshold) = env_f64("HELIX_SCORE_THRESHOLD")? {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::InvalidInput(
                    "HELIX_SCORE_THRESHOLD must be within [0.0, 1.0]".to_string(),
                ));
            }
            config.verify.threshold = threshold;
        }
        if let Some(species) = env_string("HELIX_SPECIES") {
            config.species_allowlist = parse_species_list(&species)?;
        }
        if let Some(model_path) = env_string("HELIX_MODEL_PATH") {
            config.dispatch.model_path = model_path;
        }
        if let Some(beam_width) = env_u32("HELIX_BEAM_WIDTH")? {
            if beam_width == 0 {
                return Err(Error::InvalidInput(
                    "HELIX_BEAM_WIDTH must be greater than 0".to_string(),
                ));
            }
            config.dispatch.beam_width = beam_width;
        }
        if let Some(use_gpu) = env_bool("HELIX_USE_GPU")? {
            config.dispatch.use_gpu = use_gpu;
        }
        if let Some(origins) = env_string("HELIX_CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = parse_allowed_origins(&origins);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates invariants that span fields.
    ///
    /// # Errors
    ///
    /// Returns an error if production mode is missing required settings.
    pub fn validate(&self) -> Result<()> {
        if !self.debug {
            if self.bucket.is_none() {
                return Err(Error::InvalidInput(
                    "HELIX_STORAGE_BUCKET is required when HELIX_DEBUG=false".to_string(),
                ));
            }
            if self.executor.service_url.is_empty() {
                return Err(Error::InvalidInput(
                    "HELIX_EXECUTOR_URL is required when HELIX_DEBUG=false".to_string(),
                ));
            }
            if self.cors.allowed_origins.iter().any(|origin| origin == "*") {
                return Err(Error::InvalidInput(
                    "HELIX_CORS_ALLOWED_ORIGINS cannot include '*' when HELIX_DEBUG=false"
                        .to_string(),
                ));
            }
        }
        if self.species_allowlist.is_empty() {
            return Err(Error::InvalidInput(
                "species allow-list cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Test helper: a debug-mode config with fixed settings and no env reads.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            http_port: 8080,
            debug: true,
            bucket: None,
            verify: VerifyConfig {
                url: default_verify_url(),
                secret: Redacted::new("test-secret"),
                threshold: DEFAULT_SCORE_THRESHOLD,
            },
            executor: ExecutorConfig {
                service_url: String::new(),
                job_definition: String::new(),
                job_queue: String::new(),
                bearer_token: None,
            },
            species_allowlist: default_species_allowlist(),
            dispatch: DispatchConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

fn default_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

fn default_species_allowlist() -> BTreeSet<String> {
    BTreeSet::from(["human".to_string()])
}

fn parse_species_list(value: &str) -> Result<BTreeSet<String>> {
    let species: BTreeSet<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if species.is_empty() {
        return Err(Error::InvalidInput(
            "HELIX_SPECIES must name at least one species".to_string(),
        ));
    }
    Ok(species)
}

fn parse_allowed_origins(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == "*" {
        return vec!["*".to_string()];
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u32>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u32: {e}")))
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<f64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a float: {e}")))
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "n" => Ok(Some(false)),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_list_parses_and_trims() -> Result<()> {
        let species = parse_species_list("human, mouse")?;
        assert_eq!(species.len(), 2);
        assert!(species.contains("mouse"));
        Ok(())
    }

    #[test]
    fn species_list_rejects_empty() {
        assert!(parse_species_list("  ").is_err());
        assert!(parse_species_list(", ,").is_err());
    }

    #[test]
    fn allowed_origins_wildcard_stands_alone() {
        assert_eq!(parse_allowed_origins("*"), vec!["*".to_string()]);
        assert_eq!(
            parse_allowed_origins("https://a.example, https://b.example"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_allowed_origins("").is_empty());
    }

    #[test]
    fn production_requires_bucket_and_executor() {
        let mut config = Config::for_tests();
        config.debug = false;
        assert!(config.validate().is_err());

        config.bucket = Some("gs://helix-data".to_string());
        assert!(config.validate().is_err());

        config.executor.service_url = "http://executor:8081".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let mut config = Config::for_tests();
        config.debug = false;
        config.bucket = Some("gs://helix-data".to_string());
        config.executor.service_url = "http://executor:8081".to_string();
        config.cors.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = Config::for_tests();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("test-secret"));
    }
}
