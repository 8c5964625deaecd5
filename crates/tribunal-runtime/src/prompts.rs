//! Prompt construction for each request kind.
//!
//! The same prompt goes to every provider. Prompts carry:
//! 1. A fixed role and scoring rubric
//! 2. The request payload
//! 3. The exact JSON shape the report parser expects

use lazy_static::lazy_static;
use regex::Regex;
use tribunal_core::{AnalysisRequest, KeywordMatchInput, ProfileSnapshot};

lazy_static! {
    /// A hand-picked profile path: `/in/` plus a lowercase slug.
    static ref VANITY_PATH: Regex = Regex::new(r"^/in/[a-z][a-z0-9-]{2,}$").unwrap();

    /// The random suffix the network appends to generated slugs.
    static ref GENERATED_SUFFIX: Regex = Regex::new(r"-[a-zA-Z0-9]{8,}$").unwrap();
}

/// How the profile URL looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Vanity,
    Generated,
    Unknown,
}

impl UrlStatus {
    pub fn classify(profile_url: &str) -> Self {
        let path = profile_url.trim();
        if path.is_empty() {
            UrlStatus::Unknown
        } else if VANITY_PATH.is_match(path) && !GENERATED_SUFFIX.is_match(path) {
            UrlStatus::Vanity
        } else {
            UrlStatus::Generated
        }
    }

    fn note(&self) -> &'static str {
        match self {
            UrlStatus::Vanity => "Custom vanity URL in use",
            UrlStatus::Generated => "Auto-generated URL; should be replaced with a clean vanity URL",
            UrlStatus::Unknown => "Unknown",
        }
    }
}

/// Build the prompt for `request`.
pub fn build_prompt(request: &AnalysisRequest) -> String {
    match request {
        AnalysisRequest::Profile(snapshot) => profile_prompt(snapshot),
        AnalysisRequest::KeywordMatch(input) => keyword_prompt(input),
    }
}

const PROFILE_ROLE: &str = r#"You are a senior executive recruiter and LinkedIn strategist.
Review the profile below and return a structured JSON report.
Prioritise specific, high-impact improvements. Be objective and skip filler."#;

const PROFILE_RUBRIC: &str = r#"SCORING
Impact score "brutalityScore" (0-100), start from the evidence:
  +10 clear, keyword-rich About section    +10 recent activity
  +25 experience with metrics and results  +10 relevant, complete education
  +10 certifications                       +5  volunteering
  +10 relevant skills                      +20 overall clarity and hireability
  -10 no profile photo                     -10 generic headline
  -5  under 500 connections                -15 duty-focused experience without results
  -20 About or Experience missing

Section scores (each 0-10): headline, about, experience, skills, recommendations, featured, url.

Completeness score (0-100): photo 15, headline 10, about 15, experience 20, education 10,
skills 10, featured 10, banner 5, recommendations 5.

Algorithm score (0-100): search strength of the profile for its industry.

Headlines: the first variant follows
  [Current Role] | [Top 2-3 Skills] | [Differentiator] | [Quantified Achievement] | [Goal]
and stays under 220 characters.

Every action step explains what to do, why it helps, and how to do it."#;

const PROFILE_SCHEMA: &str = r#"OUTPUT
Return ONLY valid JSON with no markdown and no commentary.
"original" in impactStatements must quote the experience data.
Set "urlFix" to null when the URL is already clean.

{
  "roast": {
    "brutalityScore": <integer 0-100>,
    "algorithmScore": <integer 0-100>,
    "completenessScore": <integer 0-100>,
    "recruiterView": "<first impression after a 7-second scan, 2 sentences>",
    "industryBenchmark": "<comparison with top performers, 2-3 sentences>",
    "redFlags": ["<critical weakness>"],
    "summary": "<executive summary, 2-3 sentences>"
  },
  "sectionScores": {
    "headline": <0-10>, "about": <0-10>, "experience": <0-10>, "skills": <0-10>,
    "recommendations": <0-10>, "featured": <0-10>, "url": <0-10>
  },
  "suggestions": {
    "headlines": [
      {"type": "Taplio Formula", "text": "<formula headline>"},
      {"type": "SEO-Optimized", "text": "<keyword-rich headline>"},
      {"type": "Executive Presence", "text": "<authority headline>"}
    ],
    "urlFix": null,
    "impactStatements": [
      {"original": "<weak line>", "improved": "<rewrite with metrics>", "why": "<benefit>", "how": "<steps>"}
    ],
    "actionPlan": [
      {"step": "<action>", "why": "<benefit>", "how": "<steps>"}
    ],
    "growthHacks": {
      "viralHooks": ["<content hook>"],
      "networkingScripts": [
        {"target": "Recruiter", "script": "<outreach message>"},
        {"target": "Peer/Founder", "script": "<value-first message>"}
      ]
    }
  }
}"#;

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Prompt for a full profile review.
pub fn profile_prompt(snapshot: &ProfileSnapshot) -> String {
    let industry = or_default(&snapshot.industry, "Unknown");
    let url_status = UrlStatus::classify(&snapshot.profile_url);

    format!(
        "{PROFILE_ROLE}\n\n\
         CONTEXT\n\
         Industry: {industry}\n\
         Profile URL: {url}\n\
         URL status: {url_note}\n\n\
         PROFILE\n\
         Name: {name}\n\
         Headline: {headline}\n\
         About: {about}\n\
         Profile photo: {photo}\n\
         Banner image: {banner}\n\
         Featured section: {featured}\n\
         Connections: {connections}\n\
         Recommendations: {recommendations}\n\
         Recent activity: {activity}\n\
         Experience: {experience}\n\
         Education: {education}\n\
         Volunteering: {volunteering}\n\
         Certifications: {certifications}\n\
         Skills: {skills}\n\n\
         {PROFILE_RUBRIC}\n\
         Benchmark against top performers in the {benchmark} industry.\n\n\
         {PROFILE_SCHEMA}\n",
        url = or_default(&snapshot.profile_url, "Unknown"),
        url_note = url_status.note(),
        name = or_default(&snapshot.name, "Unknown"),
        headline = or_default(&snapshot.headline, "None"),
        about = or_default(&snapshot.about, "None"),
        photo = yes_no(snapshot.has_profile_picture),
        banner = yes_no(snapshot.has_banner),
        featured = yes_no(snapshot.has_featured),
        connections = snapshot.connections_count.as_deref().unwrap_or("Unknown"),
        recommendations = snapshot.recommendations_count.as_deref().unwrap_or("0"),
        activity = yes_no(snapshot.has_activity),
        experience = json_list(&snapshot.experience),
        education = json_list(&snapshot.education),
        volunteering = json_list(&snapshot.volunteering),
        certifications = json_list(&snapshot.certifications),
        skills = json_list(&snapshot.skills),
        benchmark = if snapshot.industry.trim().is_empty() { "same" } else { industry },
    )
}

const KEYWORD_RUBRIC: &str = r#"STEPS
1. Extract the 20 most important skills or requirements from the job description.
2. Check each one against the profile text, ignoring case.
3. Score the fit from 1 to 5:
   5 = 80%+ matched, strong alignment
   4 = 60-79% matched, minor gaps
   3 = 40-59% matched, notable gaps
   2 = 20-39% matched, major gaps
   1 = under 20% matched
4. Return ONLY valid JSON with no markdown.

{
  "fitScore": <integer 1-5>,
  "fitVerdict": "<honest assessment, 1-2 sentences>",
  "matched": ["<keyword found in the profile>"],
  "missing": ["<important keyword not in the profile>"],
  "recommendations": ["<specific change and where in the profile to make it>"]
}"#;

/// Prompt for a job-description fit check.
pub fn keyword_prompt(input: &KeywordMatchInput) -> String {
    format!(
        "You are an applicant tracking system expert.\n\n\
         JOB DESCRIPTION\n\"\"\"\n{jd}\n\"\"\"\n\n\
         CANDIDATE PROFILE\n\"\"\"\n{profile}\n\"\"\"\n\n\
         {KEYWORD_RUBRIC}\n",
        jd = input.job_description,
        profile = input.profile_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_classification() {
        assert_eq!(UrlStatus::classify("/in/jane-doe"), UrlStatus::Vanity);
        assert_eq!(UrlStatus::classify("/in/jane-doe-4a7b9c21"), UrlStatus::Generated);
        assert_eq!(UrlStatus::classify("/in/Jane"), UrlStatus::Generated);
        assert_eq!(UrlStatus::classify("/in/jd"), UrlStatus::Generated);
        assert_eq!(UrlStatus::classify("/company/acme"), UrlStatus::Generated);
        assert_eq!(UrlStatus::classify(""), UrlStatus::Unknown);
    }

    #[test]
    fn test_profile_prompt_includes_payload() {
        let snapshot = ProfileSnapshot {
            name: "Jane Doe".into(),
            headline: "Staff Engineer".into(),
            industry: "Fintech".into(),
            profile_url: "/in/jane-doe".into(),
            has_profile_picture: true,
            skills: vec!["Rust".into(), "Kafka".into()],
            ..Default::default()
        };

        let prompt = build_prompt(&AnalysisRequest::profile(snapshot));
        assert!(prompt.contains("Name: Jane Doe"));
        assert!(prompt.contains("Industry: Fintech"));
        assert!(prompt.contains("Custom vanity URL in use"));
        assert!(prompt.contains("Profile photo: Yes"));
        assert!(prompt.contains("Banner image: No"));
        assert!(prompt.contains(r#"Skills: ["Rust","Kafka"]"#));
        assert!(prompt.contains("top performers in the Fintech industry"));
        assert!(prompt.contains("\"sectionScores\""));
        assert!(prompt.contains("\"urlFix\": null"));
    }

    #[test]
    fn test_profile_prompt_defaults_missing_fields() {
        let prompt = profile_prompt(&ProfileSnapshot::default());
        assert!(prompt.contains("Name: Unknown"));
        assert!(prompt.contains("Headline: None"));
        assert!(prompt.contains("Connections: Unknown"));
        assert!(prompt.contains("Recommendations: 0"));
        assert!(prompt.contains("URL status: Unknown"));
        assert!(prompt.contains("Experience: []"));
        assert!(prompt.contains("in the same industry"));
    }

    #[test]
    fn test_keyword_prompt() {
        let input = KeywordMatchInput::new("Senior Rust engineer, Tokio, Kafka", "Rust developer");
        let prompt = build_prompt(&AnalysisRequest::keyword_match(input));

        assert!(prompt.contains("Senior Rust engineer, Tokio, Kafka"));
        assert!(prompt.contains("Rust developer"));
        assert!(prompt.contains("\"fitScore\": <integer 1-5>"));
    }
}
