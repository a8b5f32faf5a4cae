//! The external generation service contract.

use crate::errors::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// The fully rendered prompt.
    pub prompt: String,
    /// Provider name.
    pub provider: String,
    /// Model id.
    pub model: String,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Token accounting returned by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt and completion tokens together.
    #[serde(default)]
    pub total_tokens: u64,
}

/// The service's answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text.
    #[serde(default)]
    pub content: String,
    /// Token usage, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Cost, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl GenerationResponse {
    /// Creates a response with content only.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
            cost: None,
        }
    }

    /// Sets token usage and cost.
    #[must_use]
    pub fn with_usage(mut self, total_tokens: u64, cost: f64) -> Self {
        self.usage = Some(TokenUsage { total_tokens });
        self.cost = Some(cost);
        self
    }
}

/// An external AI generation service.
///
/// Implementations must return an error rather than empty or placeholder
/// content. The adapter enforces this again on every response.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generates content for the request.
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationResponse, ProviderError>;
}
