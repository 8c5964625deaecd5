//! Provider factory pattern for adapter construction.
//!
//! Each provider registers a factory that turns a resolved
//! [`ProviderConfig`] into a ready adapter. The registry builds the
//! dispatch list, skipping providers that have no credential.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let context = AdapterContext::from_config(&config, transport);
//! let adapters = registry.build(config.resolve_providers(&store), &context)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::secrets::ApiCredential;
use super::transport::HttpTransport;
use super::{CompletionSettings, ProviderAdapter, ProviderConfig, ProviderId};
use crate::config::{ConfigError, RuntimeConfig};
use crate::resilience::RetryPolicy;

/// Everything adapters share: the transport and runtime tunables.
#[derive(Clone)]
pub struct AdapterContext {
    pub transport: Arc<dyn HttpTransport>,
    pub settings: CompletionSettings,
    pub retry: RetryPolicy,
    pub model_switch_pause: Duration,
}

impl AdapterContext {
    /// Context with default tunables.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::from_config(&RuntimeConfig::default(), transport)
    }

    pub fn from_config(config: &RuntimeConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            settings: config.completion_settings(),
            retry: config.retry.clone(),
            model_switch_pause: config.model_switch_pause,
        }
    }
}

impl std::fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("settings", &self.settings)
            .field("retry", &self.retry)
            .field("model_switch_pause", &self.model_switch_pause)
            .finish_non_exhaustive()
    }
}

/// Factory for creating one provider's adapter.
pub trait ProviderFactory: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Create the adapter. `config` has already passed [`validate`](Self::validate).
    fn create(
        &self,
        credential: ApiCredential,
        config: &ProviderConfig,
        context: &AdapterContext,
    ) -> Arc<dyn ProviderAdapter>;

    /// Validate configuration without creating an adapter.
    fn validate(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "{} base_url must start with http:// or https://",
                config.id.key()
            )));
        }
        if config.models.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "{} needs at least one model",
                config.id.key()
            )));
        }
        Ok(())
    }
}

/// Registry of available provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<ProviderId, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with Gemini, OpenAI and Anthropic registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::GeminiAdapterFactory));
        registry.register(Arc::new(super::OpenAiAdapterFactory));
        registry.register(Arc::new(super::AnthropicAdapterFactory));
        registry
    }

    /// Register a factory, replacing any previous one for the same provider.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.provider(), factory);
    }

    pub fn has_provider(&self, id: ProviderId) -> bool {
        self.factories.contains_key(&id)
    }

    pub fn available(&self) -> Vec<ProviderId> {
        self.factories.keys().copied().collect()
    }

    /// Build adapters for every configured provider, keeping input order.
    ///
    /// Providers without a credential are skipped.
    pub fn build(
        &self,
        configs: Vec<ProviderConfig>,
        context: &AdapterContext,
    ) -> Result<Vec<Arc<dyn ProviderAdapter>>, ConfigError> {
        let mut adapters = Vec::with_capacity(configs.len());

        for mut config in configs {
            let Some(credential) = config.credential.take().filter(|c| !c.is_empty()) else {
                tracing::debug!(provider = %config.id, "No credential, skipping");
                continue;
            };

            let factory = self.factories.get(&config.id).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "No adapter registered for '{}'. Available: {:?}",
                    config.id.key(),
                    self.available()
                ))
            })?;

            factory.validate(&config)?;
            tracing::debug!(
                provider = %config.id,
                source = %credential.source(),
                "Provider configured"
            );
            adapters.push(factory.create(credential, &config, context));
        }

        Ok(adapters)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available())
            .finish()
    }
}
