//! # tribunal-runtime
//!
//! Concurrent multi-provider dispatch for Tribunal.
//!
//! This crate owns everything that talks to the network:
//! - Provider adapters for Gemini (with model fallback), OpenAI and Anthropic
//! - Rate-limit retry with exponential backoff
//! - The orchestrator that fans a request out and settles every provider
//!
//! Merging the answers is left to `tribunal-core`, which is deterministic
//! and never makes network calls.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tribunal_runtime::{AnalysisMode, EnvStore, Orchestrator, RuntimeConfig};
//! use tribunal_core::{AnalysisRequest, KeywordMatchInput};
//!
//! let orchestrator = Orchestrator::from_store(&RuntimeConfig::default(), &EnvStore::new())?;
//! let request = AnalysisRequest::keyword_match(KeywordMatchInput::new(job, profile));
//! let report = orchestrator.analyze(&request, AnalysisMode::Consensus).await?;
//! ```

pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;

pub use config::{
    preferred_mode, AnalysisMode, ConfigError, DocumentStore, EndpointConfig, EnvStore,
    KeyValueStore, LayeredStore, RuntimeConfig, MODE_ENV, MODE_KEY,
};
pub use orchestrator::{AnalysisError, Orchestrator, OrchestratorBuilder, ProviderOutcome};
pub use prompts::build_prompt;
pub use providers::{
    ApiCredential, CredentialSource, ErrorKind, ProviderAdapter, ProviderConfig, ProviderError,
    ProviderId, ProviderRegistry,
};
pub use resilience::RetryPolicy;
