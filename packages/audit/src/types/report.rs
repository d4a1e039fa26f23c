//! The compliance report and the persisted audit record.
//!
//! Shape invariants (score range, guidance/fix minimums, empty-violations
//! implies Compliant) are enforced by `crate::normalize`, never assumed
//! from the model output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall compliance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Compliant,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

/// Violation severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Default risk score when the model omitted one.
    pub fn default_risk_score(&self) -> u8 {
        match self {
            Severity::Critical => 90,
            Severity::High => 70,
            Severity::Medium => 50,
            Severity::Low => 30,
        }
    }

    /// Lenient parse of model output; anything unrecognized becomes Medium.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "LOW" => Severity::Low,
            _ => Severity::Medium,
        }
    }
}

/// Financial exposure assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialPenalty {
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
    pub description: String,
}

impl Default for FinancialPenalty {
    fn default() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            description: "No specific penalty assessment available.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthicalMarketing {
    pub score: u8,
    pub assessment: String,
}

impl Default for EthicalMarketing {
    fn default() -> Self {
        Self {
            score: 50,
            assessment: "No ethical marketing assessment available.".to_string(),
        }
    }
}

/// One regulatory violation found in the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,

    /// Cited regulation name; always English regardless of source language.
    pub regulation: String,

    pub violation_title: String,

    /// Verbatim quote from the content, in the source language.
    pub evidence: String,

    /// English rendering of the evidence.
    pub translation: String,

    /// Actionable guidance points; at least two after normalization.
    pub guidance: Vec<String>,

    /// Complete compliant rewrites of the offending copy; at least two
    /// after normalization. Placeholder entries are bracketed so reviewers
    /// can spot them.
    pub fix: Vec<String>,

    pub risk_score: u8,
}

/// The canonical audit result returned to callers and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// 0 = fully compliant, 100 = maximally non-compliant.
    pub score: u8,

    pub status: Status,

    pub summary: String,

    /// Echo of the cleaned (or translated) text the audit ran on.
    #[serde(default)]
    pub transcription: String,

    #[serde(rename = "financialPenalty", default)]
    pub financial_penalty: FinancialPenalty,

    #[serde(rename = "ethicalMarketing", default)]
    pub ethical_marketing: EthicalMarketing,

    #[serde(default)]
    pub violations: Vec<Violation>,

    /// Id of the model that actually produced this report; "none" for
    /// error shells.
    #[serde(rename = "modelUsed")]
    pub model_used: String,

    #[serde(rename = "usedFallback", default)]
    pub used_fallback: bool,

    #[serde(rename = "processingTimeMs", default)]
    pub processing_time_ms: u64,

    /// Set only on error shells when even the fallback model failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Error shell: the pipeline never throws past the reasoner; callers
    /// get a degenerate but well-shaped report instead.
    pub fn error_shell(message: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            score: 0,
            status: Status::NeedsReview,
            summary: "Analysis unavailable due to an internal error.".to_string(),
            transcription: String::new(),
            financial_penalty: FinancialPenalty::default(),
            ethical_marketing: EthicalMarketing::default(),
            violations: Vec::new(),
            model_used: "none".to_string(),
            used_fallback: false,
            processing_time_ms,
            error: Some(message.into()),
        }
    }
}

/// Record handed to the external store after an audit completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub user_id: String,
    /// text | url | webpage | image | video | audio | document
    pub content_type: String,
    /// Original input, capped so records stay bounded.
    pub original_input: String,
    pub extracted_text: String,
    /// Transcript of spoken content, empty for written sources.
    pub transcript: String,
    pub report: Report,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_lenient_parse() {
        assert_eq!(Severity::parse_lenient("critical"), Severity::Critical);
        assert_eq!(Severity::parse_lenient(" HIGH "), Severity::High);
        assert_eq!(Severity::parse_lenient("severe"), Severity::Medium);
        assert_eq!(Severity::parse_lenient(""), Severity::Medium);
    }

    #[test]
    fn severity_risk_defaults() {
        assert_eq!(Severity::Critical.default_risk_score(), 90);
        assert_eq!(Severity::Low.default_risk_score(), 30);
    }

    #[test]
    fn status_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&Status::NeedsReview).unwrap(),
            "\"Needs Review\""
        );
        assert_eq!(
            serde_json::to_string(&Status::NonCompliant).unwrap(),
            "\"Non-Compliant\""
        );
    }

    #[test]
    fn error_shell_shape() {
        let shell = Report::error_shell("upstream failed", 1234);
        assert_eq!(shell.score, 0);
        assert_eq!(shell.model_used, "none");
        assert!(shell.violations.is_empty());
        assert_eq!(shell.processing_time_ms, 1234);
        assert!(shell.error.as_deref().unwrap().contains("upstream"));
    }
}
