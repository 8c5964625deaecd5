//! Keyword fit consensus.

use super::strategy::{average, capped_concat, richest};
use crate::dedup::dedup;
use crate::report::{KeywordFitReport, FIT_SCORE_RANGE};

pub const RECOMMENDATIONS_PER_PROVIDER: usize = 3;
pub const MAX_RECOMMENDATIONS: usize = 9;

pub(crate) fn merge_keyword_fits(reports: &[&KeywordFitReport]) -> KeywordFitReport {
    // Absent everywhere falls to the bottom of the scale rather than outside it.
    let fit_score = average(reports.iter().map(|r| r.fit_score))
        .unwrap_or(FIT_SCORE_RANGE.0)
        .clamp(FIT_SCORE_RANGE.0, FIT_SCORE_RANGE.1);

    let recommendations = dedup(capped_concat(
        reports.iter().map(|r| r.recommendations.as_slice()),
        RECOMMENDATIONS_PER_PROVIDER,
        None,
    ))
    .into_iter()
    .take(MAX_RECOMMENDATIONS)
    .collect();

    KeywordFitReport {
        fit_score: Some(fit_score),
        fit_verdict: richest(reports.iter().map(|r| r.fit_verdict.as_deref())),
        matched: dedup(reports.iter().flat_map(|r| r.matched.iter().cloned())),
        missing: dedup(reports.iter().flat_map(|r| r.missing.iter().cloned())),
        recommendations,
    }
}
