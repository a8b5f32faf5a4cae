//! Engine configuration.

use crate::errors::ContentflowError;
use crate::output::OutputFormat;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration shared by every run of a [`WorkflowEngine`](crate::executor::WorkflowEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider used when a node names none.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model used when a node names none.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Completion token limit when a node sets none.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
    /// Bound on one provider call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: f64,
    /// How long persisted artifacts are kept.
    #[serde(default = "default_artifact_ttl")]
    pub artifact_ttl_hours: u32,
    /// Format output nodes render when they set none.
    #[serde(default)]
    pub default_output_format: OutputFormat,
    /// Threshold condition nodes compare against when they set none.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,
    /// Word count at which the heuristic quality score saturates.
    #[serde(default = "default_heuristic_target_words")]
    pub heuristic_target_words: usize,
    /// Level used by the logging progress sink (`trace` to `error`).
    #[serde(default = "default_progress_log_level")]
    pub progress_log_level: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_request_timeout() -> f64 {
    120.0
}

fn default_artifact_ttl() -> u32 {
    24
}

fn default_quality_threshold() -> f64 {
    70.0
}

fn default_heuristic_target_words() -> usize {
    300
}

fn default_progress_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_model: default_model(),
            default_max_tokens: default_max_tokens(),
            request_timeout_seconds: default_request_timeout(),
            artifact_ttl_hours: default_artifact_ttl(),
            default_output_format: OutputFormat::default(),
            quality_threshold: default_quality_threshold(),
            heuristic_target_words: default_heuristic_target_words(),
            progress_log_level: default_progress_log_level(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ContentflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("parsing engine config {}", path.display()))
    }

    /// Sets the default provider and model.
    #[must_use]
    pub fn with_default_model(
        mut self,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.default_provider = provider.into();
        self.default_model = model.into();
        self
    }

    /// Sets the provider call timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, seconds: f64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    /// Sets the artifact time-to-live.
    #[must_use]
    pub fn with_artifact_ttl_hours(mut self, hours: u32) -> Self {
        self.artifact_ttl_hours = hours;
        self
    }

    /// Sets the default output format.
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.default_output_format = format;
        self
    }

    /// Sets the default quality threshold.
    #[must_use]
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Provider call timeout as a `Duration`.
    ///
    /// Fails for zero, negative, non-finite or out-of-range values.
    pub fn request_timeout(&self) -> Result<Duration, ContentflowError> {
        positive_duration("request_timeout_seconds", self.request_timeout_seconds)
    }

    /// Parsed progress log level. Unknown names fall back to `INFO`.
    #[must_use]
    pub fn progress_level(&self) -> tracing::Level {
        self.progress_log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ContentflowError> {
        if self.default_provider.trim().is_empty() {
            return Err(ContentflowError::Config(
                "default_provider must not be empty".into(),
            ));
        }
        if self.default_model.trim().is_empty() {
            return Err(ContentflowError::Config(
                "default_model must not be empty".into(),
            ));
        }
        if self.default_max_tokens == 0 {
            return Err(ContentflowError::Config(
                "default_max_tokens must be positive".into(),
            ));
        }
        self.request_timeout()?;
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(ContentflowError::Config(format!(
                "quality_threshold must be within 0..=100, got {}",
                self.quality_threshold
            )));
        }
        if self.heuristic_target_words == 0 {
            return Err(ContentflowError::Config(
                "heuristic_target_words must be positive".into(),
            ));
        }
        if self.progress_log_level.parse::<tracing::Level>().is_err() {
            return Err(ContentflowError::Config(format!(
                "unknown progress_log_level '{}'",
                self.progress_log_level
            )));
        }
        Ok(())
    }
}

/// Connection settings for [`HttpGenerationProvider`](crate::providers::HttpGenerationProvider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    /// Base URL of the generation service; `/generate` is appended.
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Client-side request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: f64,
}

impl HttpProviderConfig {
    /// Creates a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_seconds: default_request_timeout(),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// The full generation endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/generate", self.base_url.trim_end_matches('/'))
    }

    /// Gets timeout as Duration.
    pub fn timeout(&self) -> Result<Duration, ContentflowError> {
        positive_duration("timeout_seconds", self.timeout_seconds)
    }

    /// Rejects values the provider cannot connect with.
    pub fn validate(&self) -> Result<(), ContentflowError> {
        if self.base_url.trim().is_empty() {
            return Err(ContentflowError::Config("base_url must not be empty".into()));
        }
        self.timeout()?;
        Ok(())
    }
}

fn positive_duration(field: &str, seconds: f64) -> Result<Duration, ContentflowError> {
    if seconds <= 0.0 {
        return Err(ContentflowError::Config(format!(
            "{field} must be positive, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        ContentflowError::Config(format!("{field} is not a valid duration ({seconds}): {e}"))
    })
}
