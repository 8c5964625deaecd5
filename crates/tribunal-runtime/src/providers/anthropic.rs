//! Anthropic Claude adapter.
//!
//! ## Security
//!
//! This adapter uses the centralized [`ApiCredential`] system for secure
//! credential handling. See the [`secrets`](super::secrets) module for details.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::completion::{non_empty, parse_completion, send_checked};
use super::factory::{AdapterContext, ProviderFactory};
use super::secrets::ApiCredential;
use super::transport::{HttpRequest, HttpTransport};
use super::{CompletionSettings, ProviderAdapter, ProviderConfig, ProviderError, ProviderId};
use crate::resilience::RetryPolicy;

pub(crate) const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
pub(crate) const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API request format.
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Anthropic API response format.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlockResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentBlockResponse {
    text: Option<String>,
}

/// Anthropic Claude adapter.
///
/// # Security
///
/// The API key is stored using [`ApiCredential`] which:
/// - Cannot be accidentally printed via `Debug` or `Display`
/// - Is zeroed on drop
/// - Must be explicitly exposed via `.expose()` when needed
pub struct AnthropicAdapter {
    credential: ApiCredential,
    base_url: String,
    model: String,
    settings: CompletionSettings,
    retry: RetryPolicy,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for AnthropicAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicAdapter")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicAdapter {
    /// Create a new Anthropic adapter.
    ///
    /// # Arguments
    /// * `credential` - Anthropic API key
    /// * `context` - Shared transport, sampling settings and retry policy
    pub fn new(credential: ApiCredential, context: &AdapterContext) -> Self {
        Self {
            credential,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            model: ANTHROPIC_MODEL.to_string(),
            settings: context.settings,
            retry: context.retry.clone(),
            transport: Arc::clone(&context.transport),
        }
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn attempt(&self, prompt: &str) -> Result<JsonValue, ProviderError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| ProviderError::Transport(format!("request encoding failed: {e}")))?;

        // SECURITY: Only expose the credential here, at the point of use
        let request = HttpRequest::post(&self.base_url, body)
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION);

        let raw = send_checked(self.transport.as_ref(), request, self.name()).await?;
        let envelope: AnthropicResponse = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::MalformedOutput(format!("unexpected Anthropic envelope: {e}"))
        })?;

        let text = envelope.content.into_iter().next().and_then(|b| b.text);

        parse_completion(&non_empty(text, self.name())?, self.name())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn invoke(&self, prompt: &str) -> Result<JsonValue, ProviderError> {
        self.retry
            .run(self.name(), move || self.attempt(prompt))
            .await
    }
}

/// Factory for creating Anthropic adapters from a resolved [`ProviderConfig`].
pub struct AnthropicAdapterFactory;

impl ProviderFactory for AnthropicAdapterFactory {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn create(
        &self,
        credential: ApiCredential,
        config: &ProviderConfig,
        context: &AdapterContext,
    ) -> Arc<dyn ProviderAdapter> {
        let mut adapter =
            AnthropicAdapter::new(credential, context).with_base_url(config.base_url.clone());
        if let Some(model) = config.models.first() {
            adapter = adapter.with_model(model.clone());
        }
        Arc::new(adapter)
    }
}
