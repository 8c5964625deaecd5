//! # tribunal-core
//!
//! Deterministic report model and consensus merging for Tribunal.
//!
//! This crate answers one question: given the JSON reports several AI
//! providers produced for the same request, what single report do we hand
//! back? It never touches the network.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: the same reports in the same order always merge to the same result
//! 2. **Lenient parsing**: wrong-shaped provider fields become absent, never errors
//! 3. **Bounded**: scores stay in range and capped lists stay within their caps
//!
//! ## Example
//!
//! ```rust
//! use tribunal_core::{ConsensusMerger, NamedReport, Report, RequestKind};
//!
//! let a = Report::from_json(RequestKind::KeywordMatch, serde_json::json!({"fitScore": 4})).unwrap();
//! let b = Report::from_json(RequestKind::KeywordMatch, serde_json::json!({"fitScore": 5})).unwrap();
//!
//! let merged = ConsensusMerger::new()
//!     .merge(&[NamedReport::new("Gemini", a), NamedReport::new("GPT-4o", b)])
//!     .unwrap();
//! assert_eq!(merged.as_keyword_fit().unwrap().fit_score, Some(5.0));
//! ```

pub mod dedup;
pub mod merger;
pub mod report;
pub mod request;

// Re-export main types at crate root
pub use dedup::{dedup, dedup_key, DEDUP_WINDOW};
pub use merger::{ConsensusMerger, MergeError};
pub use report::{
    ActionStep, ConsensusReport, DispatchMode, FailureNote, GrowthHacks, HeadlineVariant,
    ImpactStatement, KeywordFitReport, NamedReport, NetworkingScript, ProfileReport, Report,
    ReportError, Roast, SectionKey, SectionScores, Suggestions,
};
pub use request::{AnalysisRequest, KeywordMatchInput, ProfileSnapshot, RequestKind};

/// Merge provider reports and wrap the result for the caller.
///
/// `successes` must be in dispatch order; `failures` are recorded as
/// metadata only.
pub fn build_consensus(
    successes: &[NamedReport],
    failures: Vec<FailureNote>,
    mode: DispatchMode,
) -> Result<ConsensusReport, ConsensusError> {
    let report = ConsensusMerger::new().merge(successes)?;
    let contributors = successes.iter().map(|s| s.provider.clone()).collect();
    Ok(ConsensusReport::new(report, contributors, mode)?.with_failures(failures))
}

/// Errors from [`build_consensus`].
#[derive(thiserror::Error, Debug)]
pub enum ConsensusError {
    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}
