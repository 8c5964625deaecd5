//! Runtime orchestrator for concurrent provider dispatch.
//!
//! The orchestrator:
//! - Spawns one task per configured provider before awaiting any of them
//! - Waits for every task to settle (`join_all`, never a race)
//! - Hands the successes to the consensus merger in dispatch order
//!
//! One provider failing, panicking or backing off never cancels or delays
//! another.

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use tribunal_core::{
    build_consensus, AnalysisRequest, ConsensusError, ConsensusReport, DispatchMode, FailureNote,
    NamedReport, Report, ReportError, RequestKind,
};

use crate::config::{AnalysisMode, ConfigError, KeyValueStore, RuntimeConfig};
use crate::prompts;
use crate::providers::{
    AdapterContext, HttpTransport, ProviderAdapter, ProviderConfig, ProviderError, ProviderId,
    ProviderRegistry,
};

/// Errors that fail a whole analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No API keys configured; add at least one provider credential")]
    NoProvidersConfigured,

    #[error("{provider} API key missing")]
    MissingCredential { provider: String },

    #[error("All AI providers failed: {}", reasons.join(" | "))]
    AllProvidersFailed { reasons: Vec<String> },

    #[error("{provider} failed: {source}")]
    ProviderFailed {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Consensus failed: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// How one provider's task settled.
#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider: String,
    pub result: Result<Report, ProviderError>,
}

/// The orchestrator dispatches a request to providers and merges the answers.
pub struct Orchestrator {
    /// Configured adapters, in dispatch order
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl Orchestrator {
    /// Create an orchestrator over ready adapters, given in dispatch order.
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Resolve credentials from `store` and build the HTTP adapters.
    pub fn from_store(
        config: &RuntimeConfig,
        store: &dyn KeyValueStore,
    ) -> Result<Self, AnalysisError> {
        Self::builder()
            .config(config.clone())
            .providers(config.resolve_providers(store))
            .build()
    }

    /// Names of the configured providers, in dispatch order.
    pub fn providers(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Run `request` in `mode`.
    ///
    /// # Execution Flow
    /// 1. Build the prompt for the request kind
    /// 2. Consensus: fan out to every adapter and wait for all to settle
    /// 3. Single: call the named adapter only
    /// 4. Merge successes and annotate contributors and failures
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        mode: AnalysisMode,
    ) -> Result<ConsensusReport, AnalysisError> {
        let kind = request.kind();
        let prompt: Arc<str> = prompts::build_prompt(request).into();

        match mode {
            AnalysisMode::Consensus => self.run_consensus(kind, prompt).await,
            AnalysisMode::Single(id) => self.run_single(id, kind, &prompt).await,
        }
    }

    /// Dispatch `prompt` to every adapter and collect every outcome.
    ///
    /// Outcomes are returned in dispatch order regardless of finish order.
    pub async fn dispatch(&self, kind: RequestKind, prompt: Arc<str>) -> Vec<ProviderOutcome> {
        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let prompt = Arc::clone(&prompt);
                let span = tracing::info_span!("provider_task", provider = adapter.name());
                tokio::spawn(
                    async move { run_provider(adapter.as_ref(), kind, &prompt).await }
                        .instrument(span),
                )
            })
            .collect();

        let settled = join_all(handles).await;

        self.adapters
            .iter()
            .zip(settled)
            .map(|(adapter, joined)| {
                let provider = adapter.name().to_string();
                let result = joined
                    .unwrap_or_else(|e| Err(ProviderError::TaskAborted(e.to_string())));
                match &result {
                    Ok(_) => tracing::info!(provider = %provider, "Provider succeeded"),
                    Err(e) => tracing::warn!(
                        provider = %provider,
                        kind = %e.kind(),
                        error = %e,
                        "Provider failed"
                    ),
                }
                ProviderOutcome { provider, result }
            })
            .collect()
    }

    async fn run_consensus(
        &self,
        kind: RequestKind,
        prompt: Arc<str>,
    ) -> Result<ConsensusReport, AnalysisError> {
        if self.adapters.is_empty() {
            return Err(AnalysisError::NoProvidersConfigured);
        }

        tracing::info!(
            kind = %kind,
            providers = ?self.providers(),
            "Dispatching to all configured providers"
        );

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.dispatch(kind, prompt).await {
            match outcome.result {
                Ok(report) => successes.push(NamedReport::new(outcome.provider, report)),
                Err(e) => failures.push((outcome.provider, e)),
            }
        }

        if successes.is_empty() {
            return Err(AnalysisError::AllProvidersFailed {
                reasons: failures
                    .iter()
                    .map(|(provider, e)| format!("{provider}: {e}"))
                    .collect(),
            });
        }

        if successes.len() == 1 {
            tracing::info!(provider = %successes[0].provider, "Single success, returning it unmerged");
        } else {
            tracing::info!(successes = successes.len(), "Merging provider reports");
        }

        let notes = failures
            .iter()
            .map(|(provider, e)| FailureNote::new(provider.clone(), e.kind().as_str(), e.to_string()))
            .collect();

        Ok(build_consensus(&successes, notes, DispatchMode::Consensus)?)
    }

    async fn run_single(
        &self,
        id: ProviderId,
        kind: RequestKind,
        prompt: &str,
    ) -> Result<ConsensusReport, AnalysisError> {
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.id() == id)
            .ok_or_else(|| AnalysisError::MissingCredential {
                provider: id.display_name().to_string(),
            })?;

        let provider = adapter.name().to_string();
        tracing::info!(provider = %provider, kind = %kind, "Dispatching to single provider");

        let report = run_provider(adapter.as_ref(), kind, prompt)
            .instrument(tracing::info_span!("provider_task", provider = %provider))
            .await
            .map_err(|source| AnalysisError::ProviderFailed {
                provider: provider.clone(),
                source,
            })?;

        Ok(ConsensusReport::new(report, vec![provider], DispatchMode::Single)?)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.providers())
            .finish()
    }
}

async fn run_provider(
    adapter: &dyn ProviderAdapter,
    kind: RequestKind,
    prompt: &str,
) -> Result<Report, ProviderError> {
    tracing::debug!("Provider task started");
    let value = adapter.invoke(prompt).await?;
    Report::from_json(kind, value).map_err(|e| ProviderError::MalformedOutput(e.to_string()))
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    config: RuntimeConfig,
    registry: ProviderRegistry,
    transport: Option<Arc<dyn HttpTransport>>,
    providers: Vec<ProviderConfig>,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl OrchestratorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            registry: ProviderRegistry::with_defaults(),
            transport: None,
            providers: Vec::new(),
            adapters: Vec::new(),
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use `transport` instead of the default reqwest client.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolved provider entries; those without a credential are skipped.
    pub fn providers(mut self, providers: Vec<ProviderConfig>) -> Self {
        self.providers = providers;
        self
    }

    /// Add a ready adapter after the configured ones.
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator, AnalysisError> {
        self.config.validate()?;

        let mut adapters = Vec::new();
        if self.providers.iter().any(ProviderConfig::is_configured) {
            let transport = match self.transport {
                Some(transport) => transport,
                None => default_transport(&self.config)?,
            };
            let context = AdapterContext::from_config(&self.config, transport);
            adapters = self.registry.build(self.providers, &context)?;
        }
        adapters.extend(self.adapters);

        Ok(Orchestrator::new(adapters))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
fn default_transport(config: &RuntimeConfig) -> Result<Arc<dyn HttpTransport>, ConfigError> {
    let transport = crate::providers::ReqwestTransport::new(config.request_timeout)
        .map_err(|e| ConfigError::Invalid(format!("HTTP client setup failed: {e}")))?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "http"))]
fn default_transport(_config: &RuntimeConfig) -> Result<Arc<dyn HttpTransport>, ConfigError> {
    Err(ConfigError::Invalid(
        "no HTTP transport: enable the 'http' feature or supply one".to_string(),
    ))
}
