//! OpenAI chat-completions adapter (JSON object mode).

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

pub(crate) const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub(crate) const OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI adapter.
///
/// # Security
///
/// The API key is held as an [`ApiCredential`] and only exposed when the
/// `Authorization` header is built.
pub struct OpenAiAdapter {
    credential: ApiCredential,
    base_url: String,
    model: String,
    settings: CompletionSettings,
    retry: RetryPolicy,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiAdapter {
    pub fn new(credential: ApiCredential, context: &AdapterContext) -> Self {
        Self {
            credential,
            base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_MODEL.to_string(),
            settings: context.settings,
            retry: context.retry.clone(),
            transport: Arc::clone(&context.transport),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn attempt(&self, prompt: &str) -> Result<JsonValue, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
            response_format: ResponseFormat {
                type_: "json_object",
            },
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| ProviderError::Transport(format!("request encoding failed: {e}")))?;

        // SECURITY: Only expose the credential here, at the point of use
        let request = HttpRequest::post(&self.base_url, body)
            .header("authorization", format!("Bearer {}", self.credential.expose()));

        let raw = send_checked(self.transport.as_ref(), request, self.name()).await?;
        let envelope: ChatResponse = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::MalformedOutput(format!("unexpected OpenAI envelope: {e}"))
        })?;

        let text = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        parse_completion(&non_empty(text, self.name())?, self.name())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn invoke(&self, prompt: &str) -> Result<JsonValue, ProviderError> {
        self.retry
            .run(self.name(), move || self.attempt(prompt))
            .await
    }
}

/// Factory for [`OpenAiAdapter`]. Uses the first configured model.
pub struct OpenAiAdapterFactory;

impl ProviderFactory for OpenAiAdapterFactory {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn create(
        &self,
        credential: ApiCredential,
        config: &ProviderConfig,
        context: &AdapterContext,
    ) -> Arc<dyn ProviderAdapter> {
        let mut adapter =
            OpenAiAdapter::new(credential, context).with_base_url(config.base_url.clone());
        if let Some(model) = config.models.first() {
            adapter = adapter.with_model(model.clone());
        }
        Arc::new(adapter)
    }
}
