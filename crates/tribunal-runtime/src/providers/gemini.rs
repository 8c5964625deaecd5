//! Google Gemini adapter with model fallback.
//!
//! Models are tried in order. Each model gets the full rate-limit retry
//! budget; when a model still fails the next one is tried, after a short
//! pause if the failure was a rate limit. The last model's error is the
//! adapter's error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::completion::{non_empty, parse_completion, send_checked};
use super::factory::{AdapterContext, ProviderFactory};
use super::secrets::ApiCredential;
use super::transport::{HttpRequest, HttpTransport};
use super::{CompletionSettings, ProviderAdapter, ProviderConfig, ProviderError, ProviderId};
use crate::resilience::RetryPolicy;

pub(crate) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Preference order, fastest first.
pub(crate) const GEMINI_MODELS: &[&str] =
    &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-2.0-flash-lite"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini adapter.
pub struct GeminiAdapter {
    credential: ApiCredential,
    base_url: String,
    models: Vec<String>,
    settings: CompletionSettings,
    retry: RetryPolicy,
    model_switch_pause: Duration,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .finish()
    }
}

impl GeminiAdapter {
    pub fn new(credential: ApiCredential, context: &AdapterContext) -> Self {
        Self {
            credential,
            base_url: GEMINI_BASE_URL.to_string(),
            models: GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            settings: context.settings,
            retry: context.retry.clone(),
            model_switch_pause: context.model_switch_pause,
            transport: Arc::clone(&context.transport),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    async fn attempt(&self, model: &str, prompt: &str) -> Result<JsonValue, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
            },
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| ProviderError::Transport(format!("request encoding failed: {e}")))?;

        let url = format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        // SECURITY: Only expose the credential here, at the point of use
        let request = HttpRequest::post(url, body).query("key", self.credential.expose());

        let raw = send_checked(self.transport.as_ref(), request, self.name()).await?;
        let envelope: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::MalformedOutput(format!("unexpected Gemini envelope: {e}"))
        })?;

        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        parse_completion(&non_empty(text, self.name())?, self.name())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn invoke(&self, prompt: &str) -> Result<JsonValue, ProviderError> {
        let mut last_error = None;

        for (index, model) in self.models.iter().enumerate() {
            if let Some(previous) = &last_error {
                if matches!(previous, ProviderError::RateLimited { .. }) {
                    tokio::time::sleep(self.model_switch_pause).await;
                }
            }

            let model = model.as_str();
            match self
                .retry
                .run(self.name(), move || self.attempt(model, prompt))
                .await
            {
                Ok(value) => {
                    if index > 0 {
                        tracing::info!(provider = self.name(), model, "Fallback model succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = self.name(),
                        model,
                        error = %err,
                        "Model failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::NotConfigured("no Gemini models configured".to_string())
        }))
    }
}

/// Factory for [`GeminiAdapter`].
pub struct GeminiAdapterFactory;

impl ProviderFactory for GeminiAdapterFactory {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn create(
        &self,
        credential: ApiCredential,
        config: &ProviderConfig,
        context: &AdapterContext,
    ) -> Arc<dyn ProviderAdapter> {
        Arc::new(
            GeminiAdapter::new(credential, context)
                .with_base_url(config.base_url.clone())
                .with_models(config.models.clone()),
        )
    }
}
