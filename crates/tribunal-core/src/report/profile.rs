//! Profile review report.
//!
//! Field names mirror the JSON structure the providers are asked to emit, so a
//! single-provider report serializes back to the shape the provider produced.

use serde::{Deserialize, Serialize};

use super::{lenient, score};

/// Range of the three headline scores.
pub const TOP_SCORE_RANGE: (f64, f64) = (0.0, 100.0);

/// Range of each section sub-score.
pub const SECTION_SCORE_RANGE: (f64, f64) = (0.0, 10.0);

/// Complete profile review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    #[serde(default, deserialize_with = "lenient::object")]
    pub roast: Roast,

    #[serde(default, deserialize_with = "lenient::object")]
    pub section_scores: SectionScores,

    #[serde(default, deserialize_with = "lenient::object")]
    pub suggestions: Suggestions,
}

/// Scores and first-impression prose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roast {
    /// Overall impact score. The wire name is kept for compatibility with
    /// existing consumers.
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub brutality_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub algorithm_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub completeness_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub recruiter_view: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub industry_benchmark: Option<String>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub red_flags: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// The seven section sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKey {
    Headline,
    About,
    Experience,
    Skills,
    Recommendations,
    Featured,
    Url,
}

impl SectionKey {
    pub const ALL: [SectionKey; 7] = [
        SectionKey::Headline,
        SectionKey::About,
        SectionKey::Experience,
        SectionKey::Skills,
        SectionKey::Recommendations,
        SectionKey::Featured,
        SectionKey::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Headline => "headline",
            SectionKey::About => "about",
            SectionKey::Experience => "experience",
            SectionKey::Skills => "skills",
            SectionKey::Recommendations => "recommendations",
            SectionKey::Featured => "featured",
            SectionKey::Url => "url",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionScores {
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub headline: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub about: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub skills: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub featured: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", serialize_with = "score::rounded", skip_serializing_if = "Option::is_none")]
    pub url: Option<f64>,
}

impl SectionScores {
    pub fn get(&self, key: SectionKey) -> Option<f64> {
        *self.slot(key)
    }

    pub fn set(&mut self, key: SectionKey, value: Option<f64>) {
        *self.slot_mut(key) = value;
    }

    fn slot(&self, key: SectionKey) -> &Option<f64> {
        match key {
            SectionKey::Headline => &self.headline,
            SectionKey::About => &self.about,
            SectionKey::Experience => &self.experience,
            SectionKey::Skills => &self.skills,
            SectionKey::Recommendations => &self.recommendations,
            SectionKey::Featured => &self.featured,
            SectionKey::Url => &self.url,
        }
    }

    fn slot_mut(&mut self, key: SectionKey) -> &mut Option<f64> {
        match key {
            SectionKey::Headline => &mut self.headline,
            SectionKey::About => &mut self.about,
            SectionKey::Experience => &mut self.experience,
            SectionKey::Skills => &mut self.skills,
            SectionKey::Recommendations => &mut self.recommendations,
            SectionKey::Featured => &mut self.featured,
            SectionKey::Url => &mut self.url,
        }
    }
}

/// Concrete improvement suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    #[serde(default, deserialize_with = "lenient::list")]
    pub headlines: Vec<HeadlineVariant>,

    /// Suggested custom URL, `None` when the current one is already clean.
    #[serde(default, deserialize_with = "lenient::string")]
    pub url_fix: Option<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub impact_statements: Vec<ImpactStatement>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub action_plan: Vec<ActionStep>,

    #[serde(default, deserialize_with = "lenient::object")]
    pub growth_hacks: GrowthHacks,
}

/// One headline rewrite, labelled with the style it follows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineVariant {
    #[serde(rename = "type", default, deserialize_with = "lenient::string_or_empty")]
    pub kind: String,

    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub text: String,
}

impl HeadlineVariant {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }
}

/// A weak line from the profile and its stronger rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactStatement {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub improved: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub how: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStep {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub how: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthHacks {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub viral_hooks: Vec<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub networking_scripts: Vec<NetworkingScript>,
}

/// Outreach script for one kind of contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkingScript {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl ProfileReport {
    /// Clamp scores into their ranges and collapse placeholder URL fixes.
    pub fn normalize(&mut self) {
        let roast = &mut self.roast;
        for score in [
            &mut roast.brutality_score,
            &mut roast.algorithm_score,
            &mut roast.completeness_score,
        ] {
            *score = score.map(|v| v.clamp(TOP_SCORE_RANGE.0, TOP_SCORE_RANGE.1));
        }

        for key in SectionKey::ALL {
            let clamped = self
                .section_scores
                .get(key)
                .map(|v| v.clamp(SECTION_SCORE_RANGE.0, SECTION_SCORE_RANGE.1));
            self.section_scores.set(key, clamped);
        }

        self.suggestions.url_fix = self.suggestions.url_fix.take().filter(|fix| is_real_url_fix(fix));
    }
}

/// Providers sometimes emit the string `"null"` instead of JSON null.
pub(crate) fn is_real_url_fix(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != "null"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "roast": {
                "brutalityScore": 72,
                "algorithmScore": 64.6,
                "completenessScore": 140,
                "recruiterView": "Solid but generic.",
                "redFlags": ["No banner", 3],
                "summary": "Decent profile."
            },
            "sectionScores": {"headline": 6, "about": 12, "url": -1},
            "suggestions": {
                "headlines": [{"type": "SEO-Optimized", "text": "Rust Engineer"}],
                "urlFix": "null",
                "actionPlan": [{"step": "Add banner", "why": "Branding", "how": "Upload"}],
                "growthHacks": {
                    "viralHooks": ["Hook"],
                    "networkingScripts": [{"target": "Recruiter", "script": "Hi"}]
                }
            }
        })
    }

    #[test]
    fn test_parse_provider_document() {
        let report: ProfileReport = serde_json::from_value(sample()).unwrap();

        assert_eq!(report.roast.brutality_score, Some(72.0));
        assert_eq!(report.roast.algorithm_score, Some(64.6));
        assert_eq!(report.roast.red_flags, vec!["No banner"]);
        assert_eq!(report.roast.industry_benchmark, None);
        assert_eq!(report.suggestions.headlines[0].kind, "SEO-Optimized");
        assert_eq!(report.suggestions.growth_hacks.networking_scripts.len(), 1);
    }

    #[test]
    fn test_normalize_clamps_and_drops_null_url() {
        let mut report: ProfileReport = serde_json::from_value(sample()).unwrap();
        report.normalize();

        assert_eq!(report.roast.completeness_score, Some(100.0));
        assert_eq!(report.section_scores.about, Some(10.0));
        assert_eq!(report.section_scores.url, Some(0.0));
        assert_eq!(report.section_scores.headline, Some(6.0));
        assert_eq!(report.suggestions.url_fix, None);
    }

    #[test]
    fn test_url_fix_serializes_as_null() {
        let report = ProfileReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["suggestions"]["urlFix"].is_null());
        assert!(json["roast"].get("brutalityScore").is_none());
    }

    #[test]
    fn test_fractional_scores_leave_as_integers() {
        let report: ProfileReport = serde_json::from_value(sample()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["roast"]["algorithmScore"], 65);
        assert_eq!(json["roast"]["brutalityScore"], 72);
    }

    #[test]
    fn test_section_scores_by_key() {
        let mut scores = SectionScores::default();
        scores.set(SectionKey::Featured, Some(4.0));
        assert_eq!(scores.get(SectionKey::Featured), Some(4.0));
        assert_eq!(scores.featured, Some(4.0));
        assert_eq!(SectionKey::Featured.as_str(), "featured");
    }
}
