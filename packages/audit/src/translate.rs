//! Translation to English for non-English content.
//!
//! Uses the same reasoner backend as the audit itself, with a plain-text
//! generation config. Failure is non-fatal: the pipeline proceeds without
//! a translation and the reasoner sees the source text.

use std::time::Duration;

use tracing::warn;

use crate::traits::{GenerationConfig, GenerationRequest, Reasoner};
use crate::types::Language;

/// Only the leading slice is translated; the claim reducer caps the
/// analysis input anyway.
const MAX_TRANSLATE_CHARS: usize = 10_000;

const TRANSLATE_MAX_TOKENS: u32 = 1_500;

const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Translate content to English. Returns `None` on any failure.
pub async fn translate(
    reasoner: &dyn Reasoner,
    model: &str,
    text: &str,
    language: &Language,
) -> Option<String> {
    let clipped: String = text.chars().take(MAX_TRANSLATE_CHARS).collect();

    let system = translation_prompt(language);
    let request = GenerationRequest::new(model, system, clipped).with_config(
        GenerationConfig::default()
            .with_max_output_tokens(TRANSLATE_MAX_TOKENS)
            .plain_text(),
    );

    let result = tokio::time::timeout(TRANSLATE_TIMEOUT, reasoner.generate(&request)).await;
    match result {
        Ok(Ok(translated)) => {
            let translated = translated.trim().to_string();
            if translated.is_empty() {
                None
            } else {
                Some(translated)
            }
        }
        Ok(Err(e)) => {
            warn!(language = language.code(), error = %e, "translation failed, continuing without it");
            None
        }
        Err(_) => {
            warn!(language = language.code(), "translation timed out, continuing without it");
            None
        }
    }
}

fn translation_prompt(language: &Language) -> String {
    let source = match language {
        Language::Hi => "Hindi",
        Language::Mixed => "mixed Hindi and English",
        other => other.code(),
    };
    format!(
        "Translate the following {source} marketing content to English. \
         Preserve medical terms, product names, and the exact phrasing of \
         claims (do not soften or paraphrase claim language). \
         Output the translation as plain text only, with no commentary."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasonerError;
    use crate::testing::MockReasoner;

    #[tokio::test]
    async fn translates_and_trims() {
        let reasoner = MockReasoner::new().with_response("  The cure works in 7 days.  ");
        let out = translate(&reasoner, "model-x", "इलाज सात दिन में", &Language::Hi).await;
        assert_eq!(out.as_deref(), Some("The cure works in 7 days."));

        let calls = reasoner.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].json_output);
        assert_eq!(calls[0].max_output_tokens, 1_500);
        assert!(calls[0].system.contains("Hindi"));
    }

    #[tokio::test]
    async fn failure_is_none_not_error() {
        let reasoner =
            MockReasoner::new().with_error(ReasonerError::Upstream("quota".to_string().into()));
        let out = translate(&reasoner, "model-x", "पाठ", &Language::Hi).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn empty_translation_is_none() {
        let reasoner = MockReasoner::new().with_response("   ");
        let out = translate(&reasoner, "model-x", "पाठ", &Language::Mixed).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn input_is_clipped() {
        let reasoner = MockReasoner::new().with_response("translated");
        let long = "अ".repeat(25_000);
        translate(&reasoner, "model-x", &long, &Language::Hi).await;
        let calls = reasoner.calls();
        assert_eq!(calls[0].user.chars().count(), MAX_TRANSLATE_CHARS);
    }
}
