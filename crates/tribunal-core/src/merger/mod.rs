//! Consensus merger: folds several provider reports into one.
//!
//! The merger applies fixed, per-field rules:
//! 1. Scores → rounded mean of the values present
//! 2. Prose → longest non-empty string
//! 3. Lists → deduplicated or capped concatenation in dispatch order
//!
//! Input order is dispatch order. It never changes which values are eligible,
//! only which one wins a tie, so the same input always merges the same way.

mod keyword;
mod profile;
mod strategy;

pub use keyword::{MAX_RECOMMENDATIONS, RECOMMENDATIONS_PER_PROVIDER};
pub use profile::{
    ACTION_STEPS_PER_PROVIDER, IMPACT_STATEMENTS_PER_PROVIDER, MAX_ACTION_STEPS,
    MAX_DISTINCT_HEADLINES, MAX_HEADLINES, MAX_RED_FLAGS, MAX_VIRAL_HOOKS,
};
pub use strategy::{average, capped_concat, richest};

use thiserror::Error;

use crate::report::{KeywordFitReport, NamedReport, ProfileReport, Report};
use crate::request::RequestKind;

/// Errors from merging.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("Nothing to merge")]
    NoReports,

    #[error("Cannot merge a {found} report from {provider} into {expected} reports")]
    SchemaMismatch {
        provider: String,
        expected: RequestKind,
        found: RequestKind,
    },
}

/// The ConsensusMerger combines same-schema reports into one.
#[derive(Debug, Default)]
pub struct ConsensusMerger;

impl ConsensusMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge reports given in dispatch order.
    ///
    /// A single report is returned unchanged. All reports must share the
    /// schema of the first one.
    pub fn merge(&self, successes: &[NamedReport]) -> Result<Report, MergeError> {
        let first = successes.first().ok_or(MergeError::NoReports)?;
        if successes.len() == 1 {
            return Ok(first.report.clone());
        }

        let expected = first.report.kind();
        tracing::debug!(
            kind = %expected,
            providers = successes.len(),
            "Merging provider reports"
        );

        match expected {
            RequestKind::Profile => {
                let reports = successes
                    .iter()
                    .map(|named| match &named.report {
                        Report::Profile(report) => Ok((named.provider.as_str(), report)),
                        other => Err(mismatch(named, expected, other)),
                    })
                    .collect::<Result<Vec<(&str, &ProfileReport)>, _>>()?;
                Ok(Report::Profile(profile::merge_profiles(&reports)))
            }
            RequestKind::KeywordMatch => {
                let reports = successes
                    .iter()
                    .map(|named| match &named.report {
                        Report::KeywordFit(report) => Ok(report),
                        other => Err(mismatch(named, expected, other)),
                    })
                    .collect::<Result<Vec<&KeywordFitReport>, _>>()?;
                Ok(Report::KeywordFit(keyword::merge_keyword_fits(&reports)))
            }
        }
    }
}

fn mismatch(named: &NamedReport, expected: RequestKind, found: &Report) -> MergeError {
    MergeError::SchemaMismatch {
        provider: named.provider.clone(),
        expected,
        found: found.kind(),
    }
}
