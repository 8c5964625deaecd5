//! Keyword fit report for a job description.

use serde::{Deserialize, Serialize};

use super::{lenient, score};

/// Range of the fit score.
pub const FIT_SCORE_RANGE: (f64, f64) = (1.0, 5.0);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordFitReport {
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub fit_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub fit_verdict: Option<String>,

    /// Requirements found in the profile.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub matched: Vec<String>,

    /// Requirements absent from the profile.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub missing: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub recommendations: Vec<String>,
}

impl KeywordFitReport {
    pub fn normalize(&mut self) {
        self.fit_score = self
            .fit_score
            .map(|v| v.clamp(FIT_SCORE_RANGE.0, FIT_SCORE_RANGE.1));
    }

    /// Share of extracted requirements that the profile covers, in percent.
    pub fn match_percentage(&self) -> u8 {
        let total = self.matched.len() + self.missing.len();
        if total == 0 {
            return 0;
        }
        ((self.matched.len() as f64 / total as f64) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_clamp() {
        let mut report: KeywordFitReport = serde_json::from_value(serde_json::json!({
            "fitScore": 9,
            "fitVerdict": "Strong match.",
            "matched": ["Rust", "Tokio"],
            "missing": ["Kubernetes"],
            "recommendations": ["Add Kubernetes to skills"]
        }))
        .unwrap();

        report.normalize();
        assert_eq!(report.fit_score, Some(5.0));
        assert_eq!(report.matched, vec!["Rust", "Tokio"]);
    }

    #[test]
    fn test_match_percentage() {
        let report = KeywordFitReport {
            matched: vec!["a".into(), "b".into()],
            missing: vec!["c".into()],
            ..Default::default()
        };
        assert_eq!(report.match_percentage(), 67);
        assert_eq!(KeywordFitReport::default().match_percentage(), 0);
    }
}
