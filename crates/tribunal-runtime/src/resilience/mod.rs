//! Resilience patterns for tribunal-runtime.
//!
//! Provides rate-limit retry with exponential backoff. Model fallback is
//! Gemini-specific and lives in its adapter.

mod retry;

pub use retry::RetryPolicy;
