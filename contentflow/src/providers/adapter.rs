//! The AI invocation adapter.

use super::{GenerationProvider, GenerationRequest, ModelSelection, PromptRenderer};
use crate::config::EngineConfig;
use crate::core::AiUsage;
use crate::envelope::InvocationView;
use crate::errors::ProviderError;
use crate::nodes::{NodeConfig, NodeKind};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Content and usage returned by a successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    /// Generated content. Never empty.
    pub content: String,
    /// Tokens consumed.
    pub tokens: u64,
    /// Cost of the call.
    pub cost: f64,
    /// Provider that served the call.
    pub provider: String,
    /// Model that served the call.
    pub model: String,
}

impl GenerationOutcome {
    /// The usage part of the outcome.
    #[must_use]
    pub fn usage(&self) -> AiUsage {
        AiUsage {
            tokens: self.tokens,
            cost: self.cost,
            provider: self.provider.clone(),
            model: self.model.clone(),
        }
    }
}

/// Turns a node and its invocation view into one bounded provider call.
#[derive(Clone)]
pub struct AiInvocationAdapter {
    provider: Arc<dyn GenerationProvider>,
    config: Arc<EngineConfig>,
    renderer: PromptRenderer,
}

impl std::fmt::Debug for AiInvocationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiInvocationAdapter")
            .field("default_provider", &self.config.default_provider)
            .field("default_model", &self.config.default_model)
            .finish_non_exhaustive()
    }
}

impl AiInvocationAdapter {
    /// Creates an adapter over a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn GenerationProvider>, config: Arc<EngineConfig>) -> Self {
        Self {
            provider,
            config,
            renderer: PromptRenderer::new(),
        }
    }

    /// The engine configuration in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the request a node would send.
    #[must_use]
    pub fn build_request(
        &self,
        kind: NodeKind,
        view: &InvocationView,
        node_config: &NodeConfig,
    ) -> GenerationRequest {
        let selection = ModelSelection::resolve(node_config, &self.config);
        GenerationRequest {
            prompt: self.renderer.render(kind, view, node_config),
            provider: selection.provider,
            model: selection.model,
            max_tokens: node_config
                .max_tokens
                .filter(|t| *t > 0)
                .unwrap_or(self.config.default_max_tokens),
            temperature: node_config.temperature,
        }
    }

    /// Generates content for a process node.
    ///
    /// Empty or whitespace-only content is an error; no substitute text is
    /// ever produced.
    pub async fn generate(
        &self,
        kind: NodeKind,
        view: &InvocationView,
        node_config: &NodeConfig,
    ) -> Result<GenerationOutcome, ProviderError> {
        let request = self.build_request(kind, view, node_config);
        let provider = request.provider.clone();
        let model = request.model.clone();
        let timeout = self
            .config
            .request_timeout()
            .map_err(|e| ProviderError::Config {
                provider: provider.clone(),
                message: e.to_string(),
            })?;

        debug!(
            node_kind = %kind,
            provider = %provider,
            model = %model,
            prompt_chars = request.prompt.len(),
            max_tokens = request.max_tokens,
            "Invoking generation provider"
        );

        let started = Instant::now();
        let response = match tokio::time::timeout(timeout, self.provider.generate(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(provider = %provider, model = %model, "Generation call timed out");
                return Err(ProviderError::Timeout {
                    provider,
                    seconds: timeout.as_secs_f64(),
                });
            }
        };

        if response.content.trim().is_empty() {
            warn!(provider = %provider, model = %model, "Provider returned empty content");
            return Err(ProviderError::empty_content(provider, model));
        }

        let tokens = response.usage.map_or(0, |u| u.total_tokens);
        let cost = response.cost.unwrap_or(0.0);
        info!(
            node_kind = %kind,
            provider = %provider,
            model = %model,
            tokens,
            cost,
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Generation completed"
        );

        Ok(GenerationOutcome {
            content: response.content,
            tokens,
            cost,
            provider,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{ContextEnvelope, CustomerContext};
    use crate::providers::GenerationResponse;
    use crate::testing::MockGenerationProvider;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn view() -> InvocationView {
        let input = json!({"topic": "X"}).as_object().cloned().unwrap_or_default();
        ContextEnvelope::create_initial(&NodeConfig::new(), input, CustomerContext::default(), "wf")
            .extract_for_invocation()
    }

    fn adapter(provider: MockGenerationProvider) -> (AiInvocationAdapter, Arc<MockGenerationProvider>) {
        let provider = Arc::new(provider);
        let adapter = AiInvocationAdapter::new(provider.clone(), Arc::new(EngineConfig::default()));
        (adapter, provider)
    }

    #[tokio::test]
    async fn test_generate_returns_content_and_usage() {
        let (adapter, provider) = adapter(MockGenerationProvider::with_response(
            GenerationResponse::new("Y").with_usage(42, 0.01),
        ));
        let node = NodeConfig::new().with_selected_model("anthropic:claude-3-haiku");

        let outcome = adapter
            .generate(NodeKind::ContentWriter, &view(), &node)
            .await
            .unwrap();

        assert_eq!(outcome.content, "Y");
        assert_eq!(outcome.tokens, 42);
        assert_eq!(outcome.provider, "anthropic");
        assert_eq!(outcome.model, "claude-3-haiku");
        assert_eq!(provider.call_count(), 1);

        let request = provider.last_request().unwrap();
        assert!(request.prompt.contains('X'));
        assert_eq!(request.max_tokens, 2000);
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let (adapter, _) = adapter(MockGenerationProvider::with_response(GenerationResponse::new(
            "   \n",
        )));

        let err = adapter
            .generate(NodeKind::BlogWriter, &view(), &NodeConfig::new())
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::empty_content("openai", "gpt-4o-mini"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let (adapter, _) = adapter(MockGenerationProvider::failing(ProviderError::request(
            "openai",
            "connection reset",
        )));

        let err = adapter
            .generate(NodeKind::ContentWriter, &view(), &NodeConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Request { .. }));
    }

    #[tokio::test]
    async fn test_call_is_bounded_by_timeout() {
        let provider = Arc::new(
            MockGenerationProvider::with_response(GenerationResponse::new("late"))
                .with_delay(Duration::from_millis(200)),
        );
        let config = EngineConfig::default().with_request_timeout(0.02);
        let adapter = AiInvocationAdapter::new(provider, Arc::new(config));

        let err = adapter
            .generate(NodeKind::ContentWriter, &view(), &NodeConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_negative_timeout_fails_without_calling_provider() {
        let provider = Arc::new(MockGenerationProvider::new());
        let config = EngineConfig::default().with_request_timeout(-1.0);
        let adapter = AiInvocationAdapter::new(provider.clone(), Arc::new(config));

        let err = adapter
            .generate(NodeKind::ContentWriter, &view(), &NodeConfig::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Config { ref provider, .. } if provider == "openai"));
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_build_request_uses_node_limits() {
        let (adapter, _) = adapter(MockGenerationProvider::new());
        let mut node = NodeConfig::new();
        node.max_tokens = Some(500);
        node.temperature = Some(0.3);

        let request = adapter.build_request(NodeKind::Summarizer, &view(), &node);
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.provider, "openai");
    }
}
