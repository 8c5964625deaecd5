//! Report model.
//!
//! Provider output is parsed into typed reports with optional fields rather
//! than handled as loose JSON maps. The [`ConsensusReport`] wraps the final
//! report with the bookkeeping the caller needs: who contributed, who failed.

mod keyword;
mod lenient;
mod profile;
mod score;

pub use keyword::{KeywordFitReport, FIT_SCORE_RANGE};
pub use profile::{
    ActionStep, GrowthHacks, HeadlineVariant, ImpactStatement, NetworkingScript, ProfileReport,
    Roast, SectionKey, SectionScores, Suggestions, SECTION_SCORE_RANGE, TOP_SCORE_RANGE,
};

pub(crate) use profile::is_real_url_fix;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::request::RequestKind;

/// Errors from turning provider JSON into reports.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Expected a JSON object for a {kind} report, got {found}")]
    NotAnObject { kind: RequestKind, found: &'static str },

    #[error("Report schema mismatch: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("A consensus report needs at least one contributing provider")]
    NoContributors,
}

/// A parsed report of either schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Profile(ProfileReport),
    KeywordFit(KeywordFitReport),
}

impl Report {
    /// Parse a provider's JSON document as the schema for `kind`.
    ///
    /// Parsing is lenient below the root: wrong-shaped fields become absent.
    /// The result is normalized (scores clamped into range).
    pub fn from_json(kind: RequestKind, value: JsonValue) -> Result<Self, ReportError> {
        if !value.is_object() {
            return Err(ReportError::NotAnObject {
                kind,
                found: json_type_name(&value),
            });
        }

        let report = match kind {
            RequestKind::Profile => {
                let mut report: ProfileReport = serde_json::from_value(value)?;
                report.normalize();
                Report::Profile(report)
            }
            RequestKind::KeywordMatch => {
                let mut report: KeywordFitReport = serde_json::from_value(value)?;
                report.normalize();
                Report::KeywordFit(report)
            }
        };

        Ok(report)
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Report::Profile(_) => RequestKind::Profile,
            Report::KeywordFit(_) => RequestKind::KeywordMatch,
        }
    }

    pub fn as_profile(&self) -> Option<&ProfileReport> {
        match self {
            Report::Profile(report) => Some(report),
            Report::KeywordFit(_) => None,
        }
    }

    pub fn as_keyword_fit(&self) -> Option<&KeywordFitReport> {
        match self {
            Report::KeywordFit(report) => Some(report),
            Report::Profile(_) => None,
        }
    }
}

/// A report together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedReport {
    pub provider: String,
    pub report: Report,
}

impl NamedReport {
    pub fn new(provider: impl Into<String>, report: Report) -> Self {
        Self {
            provider: provider.into(),
            report,
        }
    }
}

/// How the caller asked for the analysis to be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    Consensus,
    Single,
}

/// Why one provider did not contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureNote {
    pub provider: String,
    /// Stable error tag, e.g. `rate_limited`.
    pub kind: String,
    pub message: String,
}

impl FailureNote {
    pub fn new(
        provider: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Terminal artifact handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusReport {
    #[serde(flatten)]
    pub report: Report,

    /// Providers whose output went into `report`, in dispatch order.
    pub contributing_providers: Vec<String>,

    /// Providers that failed, in dispatch order. Absent when none failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_providers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureNote>,

    pub mode: DispatchMode,

    pub generated_at: DateTime<Utc>,
}

impl ConsensusReport {
    /// Build a report. Fails when `contributing_providers` is empty.
    pub fn new(
        report: Report,
        contributing_providers: Vec<String>,
        mode: DispatchMode,
    ) -> Result<Self, ReportError> {
        if contributing_providers.is_empty() {
            return Err(ReportError::NoContributors);
        }

        Ok(Self {
            report,
            contributing_providers,
            failed_providers: None,
            failures: Vec::new(),
            mode,
            generated_at: Utc::now(),
        })
    }

    /// Record the providers that failed alongside the contributors.
    pub fn with_failures(mut self, failures: Vec<FailureNote>) -> Self {
        self.failed_providers = if failures.is_empty() {
            None
        } else {
            Some(failures.iter().map(|f| f.provider.clone()).collect())
        };
        self.failures = failures;
        self
    }

    pub fn kind(&self) -> RequestKind {
        self.report.kind()
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
