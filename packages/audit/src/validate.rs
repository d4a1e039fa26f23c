//! Extraction sufficiency scoring and the content-loss guard.
//!
//! A failed validation is a signal, not a fatal error: the strategy
//! runner logs the warnings and may still accept the text (or move to
//! the next strategy when it is hopeless). The content-loss guard is the
//! hard check: cleaning may never discard more than 40% of raw text.

use crate::error::ExtractError;

/// Maximum share of raw text the cleaner may discard.
const MAX_CLEANING_LOSS: f64 = 0.40;

const MIN_LENGTH: usize = 3_000;
const MIN_WORDS: usize = 450;
const HEADING_HEAVY_MIN_WORDS: usize = 900;

/// Outcome of scoring one extraction.
#[derive(Debug, Clone)]
pub struct Validation {
    pub length: usize,
    pub word_count: usize,
    pub heading_heavy: bool,
    pub truncation_suspected: bool,
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub reasons: Vec<String>,
}

/// Score extracted text for sufficiency and truncation.
pub fn validate(text: &str) -> Validation {
    let length = text.chars().count();
    let word_count = text.split_whitespace().count();

    let heading_heavy = is_heading_heavy(text);
    let truncation_suspected = is_truncation_suspected(text);

    let mut warnings = Vec::new();
    let mut reasons = Vec::new();

    if heading_heavy {
        warnings.push("text is mostly headings".to_string());
    }
    if truncation_suspected {
        warnings.push("text appears truncated".to_string());
    }

    let mut is_valid = true;
    if length < MIN_LENGTH {
        is_valid = false;
        reasons.push(format!("only {length} chars (want {MIN_LENGTH})"));
    }
    if word_count < MIN_WORDS {
        is_valid = false;
        reasons.push(format!("only {word_count} words (want {MIN_WORDS})"));
    }
    if heading_heavy && word_count < HEADING_HEAVY_MIN_WORDS {
        is_valid = false;
        reasons.push("heading-heavy with too little body text".to_string());
    }

    Validation {
        length,
        word_count,
        heading_heavy,
        truncation_suspected,
        is_valid,
        warnings,
        reasons,
    }
}

fn is_heading_heavy(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }

    let heading_like = lines.iter().filter(|l| is_heading_like(l)).count();
    let prose_lines = lines
        .iter()
        .filter(|l| l.split_whitespace().count() >= 12)
        .count();

    let heading_ratio = heading_like as f64 / lines.len() as f64;
    let prose_ratio = prose_lines as f64 / lines.len() as f64;

    heading_ratio >= 0.70 && prose_ratio < 0.25
}

fn is_heading_like(line: &str) -> bool {
    let line = line.trim();
    if line.split_whitespace().count() <= 6 {
        return true;
    }
    if line.chars().count() >= 6
        && line
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| c.is_uppercase())
    {
        return true;
    }
    line.starts_with('#') || line.ends_with(':')
}

fn is_truncation_suspected(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.ends_with('…') || trimmed.ends_with("...") {
        return true;
    }
    let lower = text.to_lowercase();
    ["read more", "continue reading", "subscribe to read", "view more"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Fail when cleaning discarded more than the allowed share of raw text.
pub fn enforce_content_loss_guard(raw: &str, cleaned: &str) -> Result<(), ExtractError> {
    if raw.is_empty() {
        return Ok(());
    }
    let raw_len = raw.chars().count() as f64;
    let cleaned_len = cleaned.chars().count() as f64;
    let lost = (raw_len - cleaned_len).max(0.0) / raw_len;
    if lost > MAX_CLEANING_LOSS {
        return Err(ExtractError::CleaningLoss {
            lost_pct: lost * 100.0,
        });
    }
    Ok(())
}
