//! Provider adapters for tribunal-runtime.
//!
//! This module defines the [`ProviderAdapter`] trait and one adapter per
//! supported service: Gemini (with model fallback), OpenAI and Anthropic.
//! Adapters talk HTTP through the [`HttpTransport`] seam so their retry and
//! parsing behaviour can be exercised without a network.
//!
//! ## Security
//!
//! All adapters use the [`secrets`] module for credential handling.
//! Credentials are exposed only when a request is assembled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

mod anthropic;
mod completion;
mod factory;
mod gemini;
mod openai;
pub mod secrets;
pub mod transport;

pub use anthropic::{AnthropicAdapter, AnthropicAdapterFactory};
pub use completion::strip_code_fences;
pub use factory::{AdapterContext, ProviderFactory, ProviderRegistry};
pub use gemini::{GeminiAdapter, GeminiAdapterFactory};
pub use openai::{OpenAiAdapter, OpenAiAdapterFactory};
pub use secrets::{ApiCredential, CredentialSource};
pub use transport::{HttpRequest, HttpResponse, HttpTransport};
#[cfg(any(test, feature = "test-util"))]
pub use transport::{ScriptedReply, ScriptedTransport};

#[cfg(feature = "http")]
pub use transport::ReqwestTransport;

/// Errors from a single provider invocation.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider task aborted: {0}")]
    TaskAborted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the attempt should be retried after backing off.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
            ProviderError::Http { .. } => ErrorKind::ProviderHttpError,
            ProviderError::EmptyResponse(_) => ErrorKind::EmptyResponse,
            ProviderError::MalformedOutput(_) => ErrorKind::MalformedOutput,
            ProviderError::Transport(_) => ErrorKind::Transport,
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::TaskAborted(_) => ErrorKind::TaskAborted,
            ProviderError::NotConfigured(_) => ErrorKind::NotConfigured,
        }
    }
}

/// Stable tag for a [`ProviderError`], carried in failure metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RateLimited,
    ProviderHttpError,
    EmptyResponse,
    MalformedOutput,
    Transport,
    Timeout,
    TaskAborted,
    NotConfigured,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ProviderHttpError => "provider_http_error",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TaskAborted => "task_aborted",
            ErrorKind::NotConfigured => "not_configured",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of supported providers, in dispatch order.
///
/// Serialized under the same name as [`ProviderId::key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "claude", alias = "anthropic")]
    Anthropic,
}

impl ProviderId {
    /// All providers in dispatch order.
    pub const ALL: [ProviderId; 3] = [ProviderId::Gemini, ProviderId::OpenAi, ProviderId::Anthropic];

    /// Short identifier used in configuration and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "claude",
        }
    }

    /// Name reported in `contributingProviders` / `failedProviders`.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "Gemini",
            ProviderId::OpenAi => "GPT-4o",
            ProviderId::Anthropic => "Claude 3.5",
        }
    }

    /// Key holding this provider's credential in the configuration store.
    pub fn credential_key(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "geminiApiKey",
            ProviderId::OpenAi => "openaiApiKey",
            ProviderId::Anthropic => "claudeApiKey",
        }
    }

    /// Environment variable consulted for the credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "GEMINI_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Anthropic => "CLAUDE_API_KEY",
        }
    }

    /// Human-readable credential name for logs and errors.
    pub fn credential_name(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "Gemini API key",
            ProviderId::OpenAi => "OpenAI API key",
            ProviderId::Anthropic => "Anthropic API key",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::Gemini => gemini::GEMINI_BASE_URL,
            ProviderId::OpenAi => openai::OPENAI_BASE_URL,
            ProviderId::Anthropic => anthropic::ANTHROPIC_BASE_URL,
        }
    }

    pub fn default_models(&self) -> &'static [&'static str] {
        match self {
            ProviderId::Gemini => gemini::GEMINI_MODELS,
            ProviderId::OpenAi => &[openai::OPENAI_MODEL],
            ProviderId::Anthropic => &[anthropic::ANTHROPIC_MODEL],
        }
    }

    /// Parse a provider key, accepting a few common aliases.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(ProviderId::Gemini),
            "openai" | "gpt" | "gpt-4o" => Some(ProviderId::OpenAi),
            "claude" | "anthropic" => Some(ProviderId::Anthropic),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Sampling settings shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings {
    /// Maximum tokens to generate
    pub max_output_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: 3500,
            temperature: 0.7,
        }
    }
}

/// A resolved provider entry: identity, credential and endpoint set.
///
/// `credential` is `None` when the configuration store has no key for the
/// provider; such providers are never dispatched.
#[derive(Debug)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub credential: Option<ApiCredential>,
    pub base_url: String,
    /// Models to try, in order. Only Gemini uses more than one.
    pub models: Vec<String>,
}

impl ProviderConfig {
    /// Entry with the provider's default endpoint and models.
    pub fn new(id: ProviderId, credential: Option<ApiCredential>) -> Self {
        Self {
            id,
            credential,
            base_url: id.default_base_url().to_string(),
            models: id.default_models().iter().map(|m| m.to_string()).collect(),
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

    pub fn is_configured(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// One provider's HTTP contract behind a shared interface.
///
/// # Contract
/// - One invocation produces one result; no state survives between calls.
/// - Rate limits are retried inside the adapter; every other failure is final.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Name reported in outcomes.
    fn name(&self) -> &str {
        self.id().display_name()
    }

    /// Send `prompt` as the sole user message and return the parsed JSON reply.
    async fn invoke(&self, prompt: &str) -> Result<JsonValue, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_keys_round_trip() {
        for id in ProviderId::ALL {
            assert_eq!(ProviderId::from_key(id.key()), Some(id));
        }
        assert_eq!(ProviderId::from_key("Anthropic"), Some(ProviderId::Anthropic));
        assert_eq!(ProviderId::from_key("mistral"), None);
    }

    #[test]
    fn test_provider_id_serde_names() {
        let id: ProviderId = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(id, ProviderId::OpenAi);
        let id: ProviderId = serde_json::from_str("\"claude\"").unwrap();
        assert_eq!(id, ProviderId::Anthropic);
        let id: ProviderId = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(id, ProviderId::Anthropic);
    }

    #[test]
    fn test_provider_id_serializes_as_key() {
        for id in ProviderId::ALL {
            assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(id.key()));
        }
    }

    #[test]
    fn test_only_gemini_has_fallback_models() {
        assert_eq!(ProviderId::Gemini.default_models().len(), 3);
        assert_eq!(ProviderId::OpenAi.default_models().len(), 1);
        assert_eq!(ProviderId::Anthropic.default_models().len(), 1);
    }

    #[test]
    fn test_error_kinds() {
        let err = ProviderError::RateLimited { retry_after: None };
        assert!(err.is_rate_limited());
        assert_eq!(err.kind().as_str(), "rate_limited");

        let err = ProviderError::Http {
            status: 401,
            message: "bad key".into(),
        };
        assert!(!err.is_rate_limited());
        assert_eq!(err.kind(), ErrorKind::ProviderHttpError);
        assert_eq!(err.to_string(), "API error: 401 - bad key");
    }

    #[test]
    fn test_provider_config_defaults() {
        let config = ProviderConfig::new(ProviderId::OpenAi, None);
        assert!(!config.is_configured());
        assert_eq!(config.base_url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.models, vec!["gpt-4o"]);

        let config = ProviderConfig::new(
            ProviderId::Gemini,
            Some(ApiCredential::new("k", CredentialSource::Programmatic, "Gemini API key")),
        );
        assert!(config.is_configured());
    }
}
