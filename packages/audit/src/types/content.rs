//! Extracted content and its metadata as it moves through the pipeline.

use serde::{Deserialize, Serialize};

/// Where the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Article-like web page
    Blog,
    Youtube,
    /// Direct media file behind a URL
    Media,
    /// Uploaded file
    Upload,
    /// Speech-to-text output
    Transcript,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Blog => "blog",
            SourceType::Youtube => "youtube",
            SourceType::Media => "media",
            SourceType::Upload => "upload",
            SourceType::Transcript => "transcript",
        }
    }
}

/// Whether the text reads as written prose or spoken word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Article,
    Speech,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Article => "article",
            ContentFormat::Speech => "speech",
        }
    }
}

/// Detected language of the cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Hi,
    /// Substantial Devanagari and Latin mix (Hinglish copy is common in ads)
    Mixed,
    Unknown,
    /// Any other ISO-639-1 code
    Other(String),
}

impl Language {
    /// ISO-2 style tag used in records and prompts.
    pub fn code(&self) -> &str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Mixed => "mixed",
            Language::Unknown => "unknown",
            Language::Other(code) => code,
        }
    }

    /// True when the audit needs an English rendering for the reasoner.
    pub fn needs_translation(&self) -> bool {
        matches!(self, Language::Hi | Language::Mixed)
    }
}

/// Tags attached to extracted content after detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub source_type: SourceType,
    pub content_format: ContentFormat,
    pub language: Language,
    /// Name of the strategy that produced the text (e.g. "caption_track").
    pub extraction_method: String,
}

/// Text recovered from one input, enriched monotonically through
/// cleaner -> detector -> translator -> reducer, then discarded once the
/// report exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Text exactly as the extractor produced it.
    pub raw: String,

    /// After whitespace/boilerplate cleaning. Guarded against content loss.
    pub cleaned: String,

    /// English rendering, present only for non-English sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,

    pub source_type: SourceType,
    pub content_format: ContentFormat,
    pub extraction_method: String,
    pub language: Language,

    /// Set for last-resort extractions where only page metadata was
    /// available; relaxes the minimum-length requirement downstream.
    #[serde(default)]
    pub metadata_only: bool,
}

impl ExtractedContent {
    /// Wrap pasted text: raw and cleaned are the same body.
    pub fn from_text(body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            raw: body.clone(),
            cleaned: body,
            translated: None,
            source_type: SourceType::Upload,
            content_format: ContentFormat::Article,
            extraction_method: "direct".to_string(),
            language: Language::Unknown,
            metadata_only: false,
        }
    }

    /// The text the claim reducer and reasoner should see: the English
    /// rendering when one exists, the cleaned source otherwise.
    pub fn analysis_text(&self) -> &str {
        self.translated
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.cleaned)
    }

    pub fn metadata(&self) -> ContentMetadata {
        ContentMetadata {
            source_type: self.source_type,
            content_format: self.content_format,
            language: self.language.clone(),
            extraction_method: self.extraction_method.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_text_prefers_translation() {
        let mut c = ExtractedContent::from_text("मूल पाठ");
        assert_eq!(c.analysis_text(), "मूल पाठ");
        c.translated = Some("original text".to_string());
        assert_eq!(c.analysis_text(), "original text");
        // Blank translations are ignored
        c.translated = Some("   ".to_string());
        assert_eq!(c.analysis_text(), "मूल पाठ");
    }

    #[test]
    fn needs_translation() {
        assert!(Language::Hi.needs_translation());
        assert!(Language::Mixed.needs_translation());
        assert!(!Language::En.needs_translation());
        assert!(!Language::Other("ta".into()).needs_translation());
    }
}
