//! Analysis requests.
//!
//! A request is built once per call from a plain input record and never
//! mutated afterwards. The [`RequestKind`] decides which prompt is sent and
//! which report schema the merger applies.

use serde::{Deserialize, Serialize};

/// Profile text handed to keyword matching is capped at this many characters.
pub const MAX_PROFILE_TEXT_CHARS: usize = 8000;

/// Which analysis to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    /// Full profile review producing a [`ProfileReport`](crate::ProfileReport).
    Profile,
    /// Job-description fit producing a [`KeywordFitReport`](crate::KeywordFitReport).
    KeywordMatch,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Profile => "profile",
            RequestKind::KeywordMatch => "keywordMatch",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields gathered from a displayed profile.
///
/// Every field is optional on the wire; the page scraper that produces this
/// record routinely misses sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSnapshot {
    pub name: String,
    pub headline: String,
    pub about: String,
    /// Path portion of the profile URL, e.g. `/in/jane-doe`.
    pub profile_url: String,
    pub industry: String,
    pub connections_count: Option<String>,
    pub recommendations_count: Option<String>,
    pub has_profile_picture: bool,
    pub has_banner: bool,
    pub has_featured: bool,
    pub has_activity: bool,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub volunteering: Vec<String>,
    pub certifications: Vec<String>,
    pub skills: Vec<String>,
}

impl ProfileSnapshot {
    /// Flatten the searchable parts of the profile into one block of text.
    ///
    /// Headline, about, experience and skills are joined with spaces and the
    /// result is truncated to [`MAX_PROFILE_TEXT_CHARS`].
    pub fn searchable_text(&self) -> String {
        let joined = std::iter::once(self.headline.as_str())
            .chain(std::iter::once(self.about.as_str()))
            .chain(self.experience.iter().map(String::as_str))
            .chain(self.skills.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        truncate_chars(&joined, MAX_PROFILE_TEXT_CHARS)
    }
}

/// Job description paired with the candidate's profile text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatchInput {
    pub job_description: String,
    pub profile_text: String,
}

impl KeywordMatchInput {
    pub fn new(job_description: impl Into<String>, profile_text: impl Into<String>) -> Self {
        Self {
            job_description: job_description.into(),
            profile_text: truncate_chars(&profile_text.into(), MAX_PROFILE_TEXT_CHARS),
        }
    }

    /// Build from a job description and a scraped profile.
    pub fn from_snapshot(job_description: impl Into<String>, snapshot: &ProfileSnapshot) -> Self {
        Self {
            job_description: job_description.into(),
            profile_text: snapshot.searchable_text(),
        }
    }
}

/// Request payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "requestKind", content = "payload", rename_all = "camelCase")]
pub enum AnalysisRequest {
    Profile(ProfileSnapshot),
    KeywordMatch(KeywordMatchInput),
}

impl AnalysisRequest {
    pub fn profile(snapshot: ProfileSnapshot) -> Self {
        AnalysisRequest::Profile(snapshot)
    }

    pub fn keyword_match(input: KeywordMatchInput) -> Self {
        AnalysisRequest::KeywordMatch(input)
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            AnalysisRequest::Profile(_) => RequestKind::Profile,
            AnalysisRequest::KeywordMatch(_) => RequestKind::KeywordMatch,
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kind_follows_payload() {
        let profile = AnalysisRequest::profile(ProfileSnapshot::default());
        assert_eq!(profile.kind(), RequestKind::Profile);

        let keywords = AnalysisRequest::keyword_match(KeywordMatchInput::new("Rust", "Go"));
        assert_eq!(keywords.kind(), RequestKind::KeywordMatch);
    }

    #[test]
    fn test_searchable_text_joins_sections() {
        let snapshot = ProfileSnapshot {
            headline: "Engineer".to_string(),
            about: "Builds things".to_string(),
            experience: vec!["Acme | 2020".to_string()],
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..Default::default()
        };

        assert_eq!(snapshot.searchable_text(), "Engineer Builds things Acme | 2020 Rust SQL");
    }

    #[test]
    fn test_profile_text_is_truncated() {
        let input = KeywordMatchInput::new("jd", "é".repeat(MAX_PROFILE_TEXT_CHARS + 50));
        assert_eq!(input.profile_text.chars().count(), MAX_PROFILE_TEXT_CHARS);
    }

    #[test]
    fn test_snapshot_deserializes_scraper_record() {
        let json = serde_json::json!({
            "name": "Jane Doe",
            "profileUrl": "/in/jane-doe",
            "hasProfilePicture": true,
            "connectionsCount": "500",
            "skills": ["Rust"]
        });

        let snapshot: ProfileSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.name, "Jane Doe");
        assert_eq!(snapshot.profile_url, "/in/jane-doe");
        assert!(snapshot.has_profile_picture);
        assert!(!snapshot.has_banner);
        assert_eq!(snapshot.connections_count.as_deref(), Some("500"));
    }

    #[test]
    fn test_request_wire_format_is_tagged() {
        let request = AnalysisRequest::keyword_match(KeywordMatchInput::new("jd", "text"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requestKind"], "keywordMatch");
        assert_eq!(json["payload"]["jobDescription"], "jd");
    }
}
