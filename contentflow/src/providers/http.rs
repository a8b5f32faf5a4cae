//! Generation provider backed by an HTTP service.

use super::{GenerationProvider, GenerationRequest, GenerationResponse};
use crate::config::HttpProviderConfig;
use crate::errors::ProviderError;
use async_trait::async_trait;
use tracing::debug;

/// Posts each [`GenerationRequest`] as JSON to `{base_url}/generate`.
#[derive(Debug, Clone)]
pub struct HttpGenerationProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
}

impl HttpGenerationProvider {
    /// Creates a provider with its own client.
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let config_error = |e: crate::errors::ContentflowError| ProviderError::Config {
            provider: "http".to_string(),
            message: e.to_string(),
        };
        config.validate().map_err(config_error)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout().map_err(config_error)?)
            .build()
            .map_err(|e| ProviderError::request("http", e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Creates a provider sharing an existing client.
    #[must_use]
    pub fn with_client(config: HttpProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// The connection settings.
    #[must_use]
    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let provider = request.provider.clone();
        let endpoint = self.config.endpoint();
        debug!(endpoint = %endpoint, provider = %provider, model = %request.model, "POST generation request");

        let mut builder = self.client.post(&endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider.clone(),
                    seconds: self.config.timeout_seconds,
                }
            } else {
                ProviderError::request(provider.clone(), e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider,
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                provider,
                message: e.to_string(),
            })
    }
}
