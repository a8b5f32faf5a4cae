//! Test doubles for the engine's external collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::core::NodeResult;
use crate::dispatch::{DispatchContext, NodeDispatch};
use crate::envelope::ContextEnvelope;
use crate::errors::{NodeError, ProviderError, StorageError};
use crate::nodes::Node;
use crate::output::{ExecutionStore, PersistedArtifact};
use crate::providers::{GenerationProvider, GenerationRequest, GenerationResponse};

/// A generation provider with scripted answers.
///
/// Queued responses are served in order; once the queue is drained the
/// fallback response (or error) is returned for every further call.
#[derive(Debug)]
pub struct MockGenerationProvider {
    queue: Mutex<VecDeque<Result<GenerationResponse, ProviderError>>>,
    fallback: Result<GenerationResponse, ProviderError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationProvider {
    /// Creates a provider answering every call with `mock content`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_response(GenerationResponse::new("mock content").with_usage(10, 0.001))
    }

    /// Creates a provider answering every call with `response`.
    #[must_use]
    pub fn with_response(response: GenerationResponse) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Ok(response),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a provider serving `responses` in order, then repeating the last one.
    #[must_use]
    pub fn with_responses(responses: Vec<GenerationResponse>) -> Self {
        let fallback = responses.last().cloned().unwrap_or_default();
        let provider = Self::with_response(fallback);
        provider.queue.lock().extend(responses.into_iter().map(Ok));
        provider
    }

    /// Creates a provider returning blank content.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_response(GenerationResponse::new(""))
    }

    /// Creates a provider failing every call with `error`.
    #[must_use]
    pub fn failing(error: ProviderError) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Err(error),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call once the queued responses are drained.
    #[must_use]
    pub fn then_failing(mut self, error: ProviderError) -> Self {
        self.fallback = Err(error);
        self
    }

    /// Sleeps before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().last().cloned()
    }

    /// Every prompt received, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.prompt.clone()).collect()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        self.requests.lock().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.queue.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

/// One call observed by a [`RecordingDispatcher`].
#[derive(Debug, Clone)]
pub struct RecordedDispatch {
    /// The dispatched node id.
    pub node_id: String,
    /// The envelope the node received.
    pub envelope: ContextEnvelope,
}

/// A dispatcher spy recording every call before delegating.
pub struct RecordingDispatcher {
    inner: Arc<dyn NodeDispatch>,
    calls: Mutex<Vec<RecordedDispatch>>,
}

impl std::fmt::Debug for RecordingDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingDispatcher")
            .field("calls", &self.calls.lock().len())
            .finish_non_exhaustive()
    }
}

impl RecordingDispatcher {
    /// Wraps a dispatcher.
    #[must_use]
    pub fn new(inner: Arc<dyn NodeDispatch>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Total number of dispatch calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls for one node.
    #[must_use]
    pub fn calls_for(&self, node_id: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.node_id == node_id).count()
    }

    /// Node ids in dispatch order.
    #[must_use]
    pub fn dispatched_ids(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.node_id.clone()).collect()
    }

    /// Every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedDispatch> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl NodeDispatch for RecordingDispatcher {
    async fn dispatch(
        &self,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<NodeResult, NodeError> {
        self.calls.lock().push(RecordedDispatch {
            node_id: node.id.clone(),
            envelope: envelope.clone(),
        });
        self.inner.dispatch(node, envelope, ctx).await
    }
}

/// A store whose every operation fails.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    /// Creates a store failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ExecutionStore for FailingStore {
    async fn save(&self, artifact: PersistedArtifact) -> Result<(), StorageError> {
        Err(StorageError::write(artifact.execution_id, &self.message))
    }

    async fn load(&self, execution_id: &str) -> Result<Option<PersistedArtifact>, StorageError> {
        Err(StorageError::Read {
            execution_id: execution_id.to_string(),
            message: self.message.clone(),
        })
    }

    async fn purge_expired(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 100,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_then_last_repeats() {
        let provider = MockGenerationProvider::with_responses(vec![
            GenerationResponse::new("first"),
            GenerationResponse::new("second"),
        ]);

        let a = provider.generate(request("a")).await.unwrap();
        let b = provider.generate(request("b")).await.unwrap();
        let c = provider.generate(request("c")).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert_eq!(c.content, "second");
        assert_eq!(provider.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failing_provider_records_call() {
        let provider = MockGenerationProvider::failing(ProviderError::request("openai", "down"));
        assert!(provider.generate(request("p")).await.is_err());
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "p");
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = FailingStore::new("disk full");
        assert!(store.load("e").await.is_err());
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }
}
