//! AI generation: the provider seam and the invocation adapter.
//!
//! Process nodes never talk to a provider directly. They go through the
//! [`AiInvocationAdapter`], which resolves the model, renders the prompt,
//! bounds the call with a timeout and turns empty content into
//! [`ProviderError::EmptyContent`](crate::errors::ProviderError::EmptyContent).

mod adapter;
#[cfg(feature = "http")]
mod http;
mod model;
mod prompt;
mod provider;

pub use adapter::{AiInvocationAdapter, GenerationOutcome};
#[cfg(feature = "http")]
pub use http::HttpGenerationProvider;
pub use model::ModelSelection;
pub use prompt::PromptRenderer;
pub use provider::{GenerationProvider, GenerationRequest, GenerationResponse, TokenUsage};
