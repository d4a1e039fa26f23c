//! Report normalization: turn arbitrary model output into a valid Report.
//!
//! The model's JSON is treated as adversarial. All repair lives here, in
//! two passes: a tolerant parse (fence stripping, balanced-brace slicing,
//! trailing-comma removal) and a field-by-field coercion that guarantees
//! every report invariant. Normalization is idempotent: running a
//! normalized report through again changes nothing.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::types::{
    EthicalMarketing, FinancialPenalty, Report, RiskLevel, Severity, Status, Violation,
};

/// Placeholder fix entries are bracketed so reviewers can spot stubs.
const FIX_PLACEHOLDER: &str =
    "[Placeholder: provide a complete compliant rewrite of the flagged claim]";

const GUIDANCE_PLACEHOLDER: &str =
    "Review the flagged claim against the cited regulation and substantiate or remove it.";

/// Parse model output into a JSON value, repairing common damage.
pub fn parse_model_json(raw: &str) -> Result<Value, String> {
    let stripped = strip_code_fences(raw);

    // Fast path: the model behaved.
    if let Ok(value) = serde_json::from_str::<Value>(stripped.trim()) {
        return Ok(value);
    }

    // Slice out the first balanced JSON object and retry.
    let sliced = balanced_json_slice(&stripped)
        .ok_or_else(|| "no JSON object found in model output".to_string())?;
    if let Ok(value) = serde_json::from_str::<Value>(sliced) {
        return Ok(value);
    }

    // Last repair: drop trailing commas, a frequent model artifact.
    let without_commas = drop_trailing_commas(sliced);
    serde_json::from_str::<Value>(&without_commas).map_err(|e| e.to_string())
}

/// Strip Markdown code fences (```json ... ```) when the model wrapped
/// its output in them.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let body = trimmed.trim_start_matches("```");
    // Drop an optional language tag on the opening fence line.
    let body = match body.find('\n') {
        Some(idx) => &body[idx + 1..],
        None => body,
    };
    body.trim_end().trim_end_matches("```").trim().to_string()
}

/// Slice from the first `{` to its matching `}`, tracking string and
/// escape state so braces inside evidence quotes do not end the scan.
fn balanced_json_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' | b'[' if !in_string => depth += 1,
            b'}' | b']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn drop_trailing_commas(json: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("static regex"));
    re.replace_all(json, "$1").into_owned()
}

/// Coerce a parsed JSON value into a valid [`Report`].
pub fn normalize_value(value: &Value) -> Report {
    let violations: Vec<Violation> = value
        .get("violations")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(normalize_violation).collect())
        .unwrap_or_default();

    let mut score = coerce_score(value.get("score"));
    let mut status = value
        .get("status")
        .and_then(Value::as_str)
        .and_then(parse_status)
        .unwrap_or(Status::NeedsReview);

    // No violations means nothing to score: the report is compliant.
    if violations.is_empty() {
        status = Status::Compliant;
        score = 0;
    }

    Report {
        score,
        status,
        summary: string_or(value.get("summary"), "Summary unavailable."),
        transcription: string_or(value.get("transcription"), ""),
        financial_penalty: normalize_financial_penalty(value.get("financialPenalty")),
        ethical_marketing: normalize_ethical_marketing(value.get("ethicalMarketing")),
        violations,
        model_used: string_or(value.get("modelUsed"), ""),
        used_fallback: value
            .get("usedFallback")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        processing_time_ms: value
            .get("processingTimeMs")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        error: value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Parse and normalize in one step.
pub fn normalize_str(raw: &str) -> Result<Report, String> {
    Ok(normalize_value(&parse_model_json(raw)?))
}

/// Score fields arrive as integers, floats, fractions in [0, 1], strings,
/// or not at all.
pub fn coerce_score(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = number else { return 0 };
    let scaled = if (0.0..=1.0).contains(&number) && number.fract() != 0.0 {
        number * 100.0
    } else {
        number
    };
    scaled.round().clamp(0.0, 100.0) as u8
}

fn parse_status(s: &str) -> Option<Status> {
    match s.trim().to_ascii_lowercase().as_str() {
        "compliant" => Some(Status::Compliant),
        "needs review" | "needs-review" | "needs_review" => Some(Status::NeedsReview),
        "non-compliant" | "non compliant" | "noncompliant" | "non_compliant" => {
            Some(Status::NonCompliant)
        }
        _ => None,
    }
}

fn normalize_violation(value: &Value) -> Violation {
    let severity = value
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::parse_lenient)
        .unwrap_or(Severity::Medium);

    let mut guidance = string_list(value.get("guidance"));
    while guidance.len() < 2 {
        guidance.push(GUIDANCE_PLACEHOLDER.to_string());
    }

    let mut fix = string_list(value.get("fix"));
    while fix.len() < 2 {
        fix.push(FIX_PLACEHOLDER.to_string());
    }

    let risk_score = match value.get("risk_score") {
        Some(v) => coerce_score(Some(v)),
        None => severity.default_risk_score(),
    };

    Violation {
        severity,
        regulation: string_or(value.get("regulation"), "Unspecified regulation"),
        violation_title: string_or(value.get("violation_title"), "Unspecified violation"),
        evidence: string_or(value.get("evidence"), "Evidence not identified"),
        translation: string_or(value.get("translation"), "Translation unavailable"),
        guidance,
        fix,
        risk_score,
    }
}

fn normalize_financial_penalty(value: Option<&Value>) -> FinancialPenalty {
    let Some(value) = value else {
        return FinancialPenalty::default();
    };
    let risk_level = value
        .get("riskLevel")
        .and_then(Value::as_str)
        .map(|s| match s.trim().to_ascii_lowercase().as_str() {
            "none" => RiskLevel::None,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Low,
        })
        .unwrap_or(RiskLevel::Low);
    FinancialPenalty {
        risk_level,
        description: string_or(
            value.get("description"),
            &FinancialPenalty::default().description,
        ),
    }
}

fn normalize_ethical_marketing(value: Option<&Value>) -> EthicalMarketing {
    let Some(value) = value else {
        return EthicalMarketing::default();
    };
    EthicalMarketing {
        score: coerce_score(value.get("score")),
        assessment: string_or(
            value.get("assessment"),
            &EthicalMarketing::default().assessment,
        ),
    }
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
