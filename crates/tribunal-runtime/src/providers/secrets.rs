//! Secure credential handling for provider adapters.
//!
//! Every adapter holds its API key as an [`ApiCredential`]:
//!
//! - **No accidental logging**: credentials never appear in Debug/Display output
//! - **Memory safety**: credentials are zeroed on drop
//! - **Explicit exposure**: the raw value is only reachable through `.expose()`
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::EnvStore;
//! use crate::providers::secrets::ApiCredential;
//!
//! let store = EnvStore::new();
//! if let Some(cred) = ApiCredential::from_store(&store, "geminiApiKey", "Gemini API key") {
//!     request.query("key", cred.expose());
//! }
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::config::KeyValueStore;

/// Where a credential was loaded from.
///
/// Useful for debugging configuration issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from a configuration document
    Config,
    /// Loaded from an environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// # Example
///
/// ```ignore
/// let cred = ApiCredential::new("sk-secret-key", CredentialSource::Environment, "OpenAI API key");
///
/// // Safe to log - shows [REDACTED]
/// tracing::debug!(credential = ?cred, "Loaded credential");
///
/// // Explicit exposure for API calls
/// let header = format!("Bearer {}", cred.expose());
/// ```
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Create a new credential from a string value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Look up a credential in a key-value store.
    ///
    /// Blank values count as absent, so a provider with an empty key is
    /// treated exactly like one that was never configured.
    pub fn from_store(store: &dyn KeyValueStore, key: &str, name: &'static str) -> Option<Self> {
        store
            .lookup(key)
            .map(|(value, source)| Self::new(value.trim(), source, name))
    }

    /// Expose the credential value for use in API calls.
    ///
    /// # Security
    ///
    /// Only call this where the request is assembled. Never store the result.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().trim().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
