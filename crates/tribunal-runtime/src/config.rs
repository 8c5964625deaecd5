//! Runtime configuration and credential lookup.
//!
//! Two sources feed the runtime:
//! - [`RuntimeConfig`]: tunables (timeouts, retry policy, endpoints) from YAML or JSON
//! - [`KeyValueStore`]: credentials and the preferred mode, from a document and/or the environment
//!
//! Durations are written human-style (`"5s"`, `"2m"`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{
    ApiCredential, CompletionSettings, CredentialSource, ProviderConfig, ProviderId,
};
use crate::resilience::RetryPolicy;

/// Store key holding the preferred mode.
pub const MODE_KEY: &str = "aiProvider";

/// Environment variable consulted for [`MODE_KEY`].
pub const MODE_ENV: &str = "TRIBUNAL_MODE";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown analysis mode '{0}'; expected consensus, triple, gemini, openai or claude")]
    UnknownMode(String),
}

/// Serde helpers for human-readable durations (`"3s"`, `"2m 30s"`).
pub(crate) mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// How a request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnalysisMode {
    /// Fan out to every configured provider and merge
    #[default]
    Consensus,
    /// Call exactly one provider
    Single(ProviderId),
}

impl FromStr for AnalysisMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consensus" | "triple" | "all" => Ok(AnalysisMode::Consensus),
            other => ProviderId::from_key(other)
                .map(AnalysisMode::Single)
                .ok_or_else(|| ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for AnalysisMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnalysisMode> for String {
    fn from(mode: AnalysisMode) -> Self {
        mode.to_string()
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Consensus => f.write_str("consensus"),
            AnalysisMode::Single(id) => f.write_str(id.key()),
        }
    }
}

/// Endpoint override for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: Option<String>,
    /// Models to try in order; empty keeps the provider default.
    pub models: Vec<String>,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub max_output_tokens: u32,

    pub temperature: f32,

    /// Per-request HTTP timeout
    #[serde(with = "duration_human")]
    pub request_timeout: Duration,

    /// Pause before trying the next Gemini model after a rate limit
    #[serde(with = "duration_human")]
    pub model_switch_pause: Duration,

    pub retry: RetryPolicy,

    pub endpoints: BTreeMap<ProviderId, EndpointConfig>,

    /// Mode used when neither the caller nor the key-value store picks one
    pub default_mode: AnalysisMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let settings = CompletionSettings::default();
        Self {
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
            request_timeout: Duration::from_secs(120),
            model_switch_pause: Duration::from_secs(3),
            retry: RetryPolicy::default(),
            endpoints: BTreeMap::new(),
            default_mode: AnalysisMode::Consensus,
        }
    }
}

impl RuntimeConfig {
    /// Parse YAML (or JSON, which YAML accepts) and validate.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.factor < 1.0 {
            return Err(ConfigError::Invalid(
                "retry.factor must be at least 1.0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(
                "max_output_tokens must be positive".to_string(),
            ));
        }
        for (id, endpoint) in &self.endpoints {
            if let Some(url) = &endpoint.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::Invalid(format!(
                        "{} base_url must start with http:// or https://",
                        id.key()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings {
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        }
    }

    /// Resolve every provider against `store`, in dispatch order.
    ///
    /// Providers without a credential are still listed, with `credential: None`.
    pub fn resolve_providers(&self, store: &dyn KeyValueStore) -> Vec<ProviderConfig> {
        ProviderId::ALL
            .into_iter()
            .map(|id| {
                let credential =
                    ApiCredential::from_store(store, id.credential_key(), id.credential_name());
                let mut config = ProviderConfig::new(id, credential);
                if let Some(endpoint) = self.endpoints.get(&id) {
                    if let Some(url) = &endpoint.base_url {
                        config = config.with_base_url(url.clone());
                    }
                    if !endpoint.models.is_empty() {
                        config = config.with_models(endpoint.models.clone());
                    }
                }
                config
            })
            .collect()
    }
}

/// Read the preferred mode from `store`, falling back to `fallback`.
pub fn preferred_mode(
    store: &dyn KeyValueStore,
    fallback: AnalysisMode,
) -> Result<AnalysisMode, ConfigError> {
    match store.lookup(MODE_KEY) {
        Some((value, _)) => value.parse(),
        None => Ok(fallback),
    }
}

/// Persistent key-value configuration.
///
/// Blank values count as absent.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Where values from this store come from.
    fn source(&self) -> CredentialSource;

    /// Non-blank value and its source.
    fn lookup(&self, key: &str) -> Option<(String, CredentialSource)> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| (v, self.source()))
    }
}

/// Values from a YAML/JSON document of string entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    values: BTreeMap<String, String>,
}

impl DocumentStore {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a document; non-string entries are ignored.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let document: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(text)?;
        let values = document
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_yaml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}

impl KeyValueStore for DocumentStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn source(&self) -> CredentialSource {
        CredentialSource::Config
    }
}

/// Values from environment variables, by key mapping.
#[derive(Debug, Clone)]
pub struct EnvStore {
    mapping: BTreeMap<String, String>,
}

impl EnvStore {
    /// Store mapping provider credential keys and [`MODE_KEY`] to their variables.
    pub fn new() -> Self {
        let mut store = Self::empty().with_mapping(MODE_KEY, MODE_ENV);
        for id in ProviderId::ALL {
            store = store.with_mapping(id.credential_key(), id.env_var());
        }
        store
    }

    pub fn empty() -> Self {
        Self {
            mapping: BTreeMap::new(),
        }
    }

    pub fn with_mapping(mut self, key: impl Into<String>, env_var: impl Into<String>) -> Self {
        self.mapping.insert(key.into(), env_var.into());
        self
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for EnvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.mapping
            .get(key)
            .and_then(|var| std::env::var(var).ok())
    }

    fn source(&self) -> CredentialSource {
        CredentialSource::Environment
    }
}

/// Stores consulted in order; the first non-blank value wins.
#[derive(Default)]
pub struct LayeredStore {
    layers: Vec<Box<dyn KeyValueStore>>,
}

impl LayeredStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl KeyValueStore + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }
}

impl KeyValueStore for LayeredStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|(value, _)| value)
    }

    fn source(&self) -> CredentialSource {
        self.layers
            .first()
            .map(|layer| layer.source())
            .unwrap_or(CredentialSource::Programmatic)
    }

    fn lookup(&self, key: &str) -> Option<(String, CredentialSource)> {
        self.layers.iter().find_map(|layer| layer.lookup(key))
    }
}

impl std::fmt::Debug for LayeredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources: Vec<CredentialSource> = self.layers.iter().map(|l| l.source()).collect();
        f.debug_struct("LayeredStore")
            .field("layers", &sources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_output_tokens, 3500);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.model_switch_pause, Duration::from_secs(3));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RuntimeConfig::from_yaml_str(
            r#"
request_timeout: 45s
retry:
  max_attempts: 2
endpoints:
  gemini:
    models: [gemini-2.0-flash]
"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(45));
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(5));
        assert_eq!(config.model_switch_pause, Duration::from_secs(3));
        assert_eq!(
            config.endpoints[&ProviderId::Gemini].models,
            vec!["gemini-2.0-flash"]
        );
    }

    #[test]
    fn test_json_config_accepted() {
        let config = RuntimeConfig::from_yaml_str(r#"{"temperature": 0.2, "model_switch_pause": "1s"}"#)
            .unwrap();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.model_switch_pause, Duration::from_secs(1));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(RuntimeConfig::from_yaml_str("retry:\n  max_attempts: 0").is_err());
        assert!(RuntimeConfig::from_yaml_str("temperature: 3.5").is_err());
        assert!(RuntimeConfig::from_yaml_str("endpoints:\n  openai:\n    base_url: ftp://x").is_err());
        assert!(RuntimeConfig::from_yaml_str("request_timeout: soon").is_err());
    }

    #[test]
    fn test_default_mode_from_yaml() {
        let config = RuntimeConfig::from_yaml_str("default_mode: triple").unwrap();
        assert_eq!(config.default_mode, AnalysisMode::Consensus);

        let config = RuntimeConfig::from_yaml_str("default_mode: claude").unwrap();
        assert_eq!(config.default_mode, AnalysisMode::Single(ProviderId::Anthropic));

        assert!(RuntimeConfig::from_yaml_str("default_mode: bard").is_err());
    }

    #[test]
    fn test_duration_round_trip_is_human() {
        let yaml = serde_yaml::to_string(&RuntimeConfig::default()).unwrap();
        assert!(yaml.contains("request_timeout: 2m"));
        assert!(yaml.contains("model_switch_pause: 3s"));
        assert!(yaml.contains("default_mode: consensus"));
    }

    #[test]
    fn test_endpoints_use_provider_keys() {
        let config = RuntimeConfig::from_yaml_str(
            "default_mode: claude\nendpoints:\n  anthropic:\n    models: [claude-3-5-haiku-latest]",
        )
        .unwrap();

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("  claude:"));
        assert!(!yaml.contains("anthropic"));
        assert!(yaml.contains("default_mode: claude"));
        assert_eq!(RuntimeConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("triple".parse::<AnalysisMode>().unwrap(), AnalysisMode::Consensus);
        assert_eq!("Consensus".parse::<AnalysisMode>().unwrap(), AnalysisMode::Consensus);
        assert_eq!(
            "claude".parse::<AnalysisMode>().unwrap(),
            AnalysisMode::Single(ProviderId::Anthropic)
        );
        assert_eq!(
            "openai".parse::<AnalysisMode>().unwrap(),
            AnalysisMode::Single(ProviderId::OpenAi)
        );
        assert!(matches!(
            "llama".parse::<AnalysisMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
        assert_eq!(AnalysisMode::Single(ProviderId::Anthropic).to_string(), "claude");
    }

    #[test]
    fn test_preferred_mode() {
        let store = DocumentStore::from_pairs([(MODE_KEY, "gemini")]);
        assert_eq!(
            preferred_mode(&store, AnalysisMode::Consensus).unwrap(),
            AnalysisMode::Single(ProviderId::Gemini)
        );
        assert_eq!(
            preferred_mode(&DocumentStore::default(), AnalysisMode::Single(ProviderId::OpenAi))
                .unwrap(),
            AnalysisMode::Single(ProviderId::OpenAi)
        );
        assert!(preferred_mode(&DocumentStore::from_pairs([(MODE_KEY, "bard")]), AnalysisMode::Consensus).is_err());
    }

    #[test]
    fn test_document_store_ignores_non_strings() {
        let store = DocumentStore::from_yaml_str(
            r#"{"geminiApiKey": "AIza-1", "retries": 3, "openaiApiKey": ""}"#,
        )
        .unwrap();

        assert_eq!(store.get("geminiApiKey").as_deref(), Some("AIza-1"));
        assert_eq!(store.get("retries"), None);
        assert_eq!(store.lookup("openaiApiKey"), None);
        assert_eq!(store.get("openaiApiKey").as_deref(), Some(""));
    }

    #[test]
    fn test_resolve_providers_in_dispatch_order() {
        let config = RuntimeConfig::from_yaml_str(
            "endpoints:\n  anthropic:\n    base_url: http://localhost:9000/v1/messages",
        )
        .unwrap();
        let store = DocumentStore::from_pairs([("claudeApiKey", "sk-ant"), ("geminiApiKey", " ")]);

        let providers = config.resolve_providers(&store);
        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id).collect();
        assert_eq!(ids, ProviderId::ALL.to_vec());

        assert!(!providers[0].is_configured());
        assert!(!providers[1].is_configured());
        assert!(providers[2].is_configured());
        assert_eq!(providers[2].base_url, "http://localhost:9000/v1/messages");
        assert_eq!(providers[0].models.len(), 3);
    }

    #[test]
    fn test_env_store_mapping() {
        std::env::set_var("TRIBUNAL_TEST_ENV_STORE", "value");
        let store = EnvStore::empty().with_mapping("someKey", "TRIBUNAL_TEST_ENV_STORE");
        assert_eq!(
            store.lookup("someKey"),
            Some(("value".to_string(), CredentialSource::Environment))
        );
        assert_eq!(store.get("unmapped"), None);
        std::env::remove_var("TRIBUNAL_TEST_ENV_STORE");
    }
}
