//! Language and script detection.
//!
//! Devanagari/Latin script ratios decide the common Indian-market cases
//! directly; everything else goes to the statistical classifier over a
//! bounded prefix. Detection runs on cleaned text only and is
//! deterministic for a given input.

use crate::types::{ContentMetadata, ExtractedContent, Language};

/// Texts shorter than this are tagged Unknown rather than classified.
const MIN_DETECTABLE_CHARS: usize = 80;

/// Characters fed to the statistical classifier.
const CLASSIFIER_PREFIX_CHARS: usize = 6_000;

const MIXED_SCRIPT_THRESHOLD: f64 = 0.15;
const DEVANAGARI_THRESHOLD: f64 = 0.20;

/// Detect the language of cleaned content.
///
/// Texts below the detectable floor are Unknown regardless of script.
pub fn detect_language(text: &str) -> Language {
    if text.chars().count() < MIN_DETECTABLE_CHARS {
        return Language::Unknown;
    }

    let mut devanagari = 0usize;
    let mut latin = 0usize;
    let mut non_whitespace = 0usize;

    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        non_whitespace += 1;
        if ('\u{0900}'..='\u{097F}').contains(&c) {
            devanagari += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }

    if non_whitespace > 0 {
        let dev_ratio = devanagari as f64 / non_whitespace as f64;
        let latin_ratio = latin as f64 / non_whitespace as f64;
        if dev_ratio > MIXED_SCRIPT_THRESHOLD && latin_ratio > MIXED_SCRIPT_THRESHOLD {
            return Language::Mixed;
        }
        if dev_ratio > DEVANAGARI_THRESHOLD {
            return Language::Hi;
        }
    }

    let prefix: String = text.chars().take(CLASSIFIER_PREFIX_CHARS).collect();
    match whatlang::detect_lang(&prefix) {
        Some(lang) => map_lang(lang),
        None => Language::Unknown,
    }
}

fn map_lang(lang: whatlang::Lang) -> Language {
    use whatlang::Lang;
    match lang {
        Lang::Eng => Language::En,
        Lang::Hin => Language::Hi,
        Lang::Urd => Language::Other("ur".to_string()),
        Lang::Pan => Language::Other("pa".to_string()),
        Lang::Ben => Language::Other("bn".to_string()),
        other => Language::Other(other.code().chars().take(2).collect()),
    }
}

/// Run detection and stamp the content with its metadata tags.
pub fn enrich(content: &mut ExtractedContent) -> ContentMetadata {
    content.language = detect_language(&content.cleaned);
    content.metadata()
}
