//! Extraction strategies and the fallback runner.
//!
//! Each strategy turns one source (URL, file, buffer) into plain text or
//! fails with an [`ExtractError`]. Strategies compose into an ordered
//! plan per input kind; the runner tries them sequentially, cleans and
//! scores each success, and only gives up when the whole plan is spent.

mod browser;
mod document;
mod media;
mod shell;
mod web;
mod youtube;

pub use browser::HeadlessBrowser;
pub use document::{DocText, ImageOcrExtract, PdfTextThenOcr};
pub use media::TranscribeUpload;
pub use web::{MetadataOnly, ReaderProxy, ReadabilityLocal};
pub use youtube::{AudioDownload, CaptionTrack, OEmbed};

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clean;
use crate::config::PipelineConfig;
use crate::error::{AuditError, ExtractError, ExtractResult};
use crate::traits::{Fetcher, Ocr, Transcriber};
use crate::types::{AuditInput, ContentFormat, ExtractedContent, Kind, Language, SourceType};
use crate::validate;

/// Shared services and knobs available to every strategy.
#[derive(Clone)]
pub struct StrategyContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub ocr: Arc<dyn Ocr>,
    pub config: Arc<PipelineConfig>,
    pub cancel: CancellationToken,
}

impl StrategyContext {
    fn check_cancelled(&self) -> ExtractResult<()> {
        if self.cancel.is_cancelled() {
            Err(ExtractError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Raw output of one successful strategy, before cleaning.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub text: String,
    /// Strategy tag recorded on the content (e.g. "caption_track").
    pub method: &'static str,
    pub source_type: SourceType,
    pub content_format: ContentFormat,
    /// Metadata-only extractions bypass the minimum-length check.
    pub metadata_only: bool,
}

impl Extracted {
    pub fn new(text: String, method: &'static str) -> Self {
        Self {
            text,
            method,
            source_type: SourceType::Blog,
            content_format: ContentFormat::Article,
            metadata_only: false,
        }
    }

    pub fn with_source(mut self, source_type: SourceType, format: ContentFormat) -> Self {
        self.source_type = source_type;
        self.content_format = format;
        self
    }

    pub fn metadata_only(mut self) -> Self {
        self.metadata_only = true;
        self
    }
}

/// One extraction strategy.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Strategy tag used in logs and on the resulting content.
    fn name(&self) -> &'static str;

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted>;
}

/// Build the ordered strategy plan for one classified input.
///
/// `Kind::Text` has no plan: the pipeline routes pasted text straight to
/// the reasoner.
pub fn plan_for(kind: Kind, input: &AuditInput, config: &PipelineConfig) -> Vec<Box<dyn Extractor>> {
    match (kind, input) {
        (Kind::WebPage, AuditInput::Url { href }) => web_plan(href, config),
        (Kind::YouTube, AuditInput::Url { href }) => {
            let mut plan: Vec<Box<dyn Extractor>> = vec![
                Box::new(CaptionTrack::new(href)),
                Box::new(OEmbed::new(href)),
            ];
            if config.enable_audio_download {
                plan.push(Box::new(AudioDownload::new(href)));
            }
            plan
        }
        (Kind::MediaUrl, AuditInput::Url { href }) => {
            vec![Box::new(media::MediaUrlExtract::new(href))]
        }
        (Kind::Image, AuditInput::File { bytes, mime, .. }) => {
            vec![Box::new(ImageOcrExtract::new(bytes.clone(), mime.clone()))]
        }
        (Kind::Audio | Kind::Video, AuditInput::File { bytes, mime, .. }) => {
            vec![Box::new(TranscribeUpload::new(bytes.clone(), mime.clone()))]
        }
        (Kind::Document, AuditInput::File { bytes, mime, filename }) => {
            document_plan(bytes, mime, filename)
        }
        _ => Vec::new(),
    }
}

fn web_plan(href: &str, config: &PipelineConfig) -> Vec<Box<dyn Extractor>> {
    let mut plan: Vec<Box<dyn Extractor>> = Vec::new();
    if !config.reader_proxy_base.is_empty() {
        plan.push(Box::new(ReaderProxy::new(href)));
    }
    plan.push(Box::new(ReadabilityLocal::new(href)));
    if config.enable_headless_browser {
        plan.push(Box::new(HeadlessBrowser::new(href)));
    }
    plan.push(Box::new(MetadataOnly::new(href)));
    plan
}

fn document_plan(bytes: &[u8], mime: &str, filename: &str) -> Vec<Box<dyn Extractor>> {
    let mime = mime.to_ascii_lowercase();
    if mime == "application/pdf" || filename.to_ascii_lowercase().ends_with(".pdf") {
        vec![Box::new(PdfTextThenOcr::new(bytes.to_vec()))]
    } else {
        // .docx and legacy .doc both go through the document converter.
        vec![Box::new(DocText::new(
            bytes.to_vec(),
            mime.to_string(),
            filename.to_string(),
        ))]
    }
}

/// Run a plan to completion: first strategy whose cleaned output survives
/// the guards wins.
pub async fn acquire(
    kind: Kind,
    input: &AuditInput,
    ctx: &StrategyContext,
) -> Result<ExtractedContent, AuditError> {
    // Media URLs need a sniff before a plan exists: an HTML response
    // degrades to the web-page plan.
    if kind == Kind::MediaUrl {
        return media::acquire_media_url(input, ctx).await;
    }

    let plan = plan_for(kind, input, &ctx.config);
    if plan.is_empty() {
        return Err(AuditError::InvalidInput {
            reason: format!("no extraction plan for {} input", kind.as_str()),
        });
    }
    run_plan(&plan, ctx).await
}

pub(crate) async fn run_plan(
    plan: &[Box<dyn Extractor>],
    ctx: &StrategyContext,
) -> Result<ExtractedContent, AuditError> {
    let mut last_error = ExtractError::Unsupported("empty plan".to_string());

    for strategy in plan {
        if ctx.cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        let method = strategy.name();
        debug!(event = "strategy_start", method, "trying extraction strategy");

        let extracted = match strategy.extract(ctx).await {
            Ok(e) => e,
            Err(ExtractError::Cancelled) => return Err(AuditError::Cancelled),
            Err(e) => {
                warn!(
                    event = "strategy_failed",
                    method,
                    status = "error",
                    message = %e,
                    "extraction strategy failed, moving on"
                );
                last_error = e;
                continue;
            }
        };

        match finish_attempt(extracted, ctx) {
            Ok(content) => {
                info!(
                    event = "strategy_succeeded",
                    method,
                    status = "ok",
                    chars = content.cleaned.chars().count(),
                    "extraction strategy succeeded"
                );
                return Ok(content);
            }
            Err(e) => {
                warn!(
                    event = "strategy_rejected",
                    method,
                    status = "rejected",
                    message = %e,
                    "extraction output rejected, moving on"
                );
                last_error = e;
            }
        }
    }

    Err(AuditError::ExtractionExhausted { last: last_error })
}

/// Clean, guard, and score one strategy's output.
pub(crate) fn finish_attempt(
    extracted: Extracted,
    ctx: &StrategyContext,
) -> ExtractResult<ExtractedContent> {
    let cleaned = clean::clean(&extracted.text);

    validate::enforce_content_loss_guard(&extracted.text, &cleaned)?;

    let cleaned_chars = cleaned.chars().count();
    if !extracted.metadata_only && cleaned_chars < ctx.config.min_cleaned_chars {
        return Err(ExtractError::TooShort { len: cleaned_chars });
    }

    let validation = validate::validate(&cleaned);
    if !validation.is_valid {
        // A signal, not a verdict: short ads are still auditable.
        debug!(
            length = validation.length,
            words = validation.word_count,
            reasons = ?validation.reasons,
            warnings = ?validation.warnings,
            "extraction below validator thresholds"
        );
    }

    Ok(ExtractedContent {
        raw: extracted.text,
        cleaned,
        translated: None,
        source_type: extracted.source_type,
        content_format: extracted.content_format,
        extraction_method: extracted.method.to_string(),
        language: Language::Unknown,
        metadata_only: extracted.metadata_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockOcr, MockTranscriber};

    fn ctx() -> StrategyContext {
        StrategyContext {
            fetcher: Arc::new(MockFetcher::new()),
            transcriber: Arc::new(MockTranscriber::new("")),
            ocr: Arc::new(MockOcr::new("")),
            config: Arc::new(PipelineConfig::default()),
            cancel: CancellationToken::new(),
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl Extractor for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn extract(&self, _ctx: &StrategyContext) -> ExtractResult<Extracted> {
            Ok(Extracted::new(self.0.to_string(), "fixed"))
        }
    }

    struct Failing;

    #[async_trait]
    impl Extractor for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn extract(&self, _ctx: &StrategyContext) -> ExtractResult<Extracted> {
            Err(ExtractError::NoCaptions)
        }
    }

    #[tokio::test]
    async fn runner_falls_through_to_the_next_strategy() {
        let long = "This advertisement promises complete recovery from chronic joint pain within one week of starting the herbal supplement course. ".repeat(5);
        let long: &'static str = Box::leak(long.into_boxed_str());
        let plan: Vec<Box<dyn Extractor>> = vec![Box::new(Failing), Box::new(Fixed(long))];

        let content = run_plan(&plan, &ctx()).await.unwrap();
        assert_eq!(content.extraction_method, "fixed");
        assert!(content.cleaned.contains("complete recovery"));
    }

    #[tokio::test]
    async fn runner_rejects_short_output_and_reports_last_error() {
        let plan: Vec<Box<dyn Extractor>> =
            vec![Box::new(Fixed("too short")), Box::new(Failing)];
        let err = run_plan(&plan, &ctx()).await.unwrap_err();
        match err {
            AuditError::ExtractionExhausted { last } => {
                assert!(matches!(last, ExtractError::NoCaptions))
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn cancellation_short_circuits_the_plan() {
        let mut c = ctx();
        c.cancel = CancellationToken::new();
        c.cancel.cancel();
        let plan: Vec<Box<dyn Extractor>> = vec![Box::new(Failing)];
        assert!(matches!(
            run_plan(&plan, &c).await,
            Err(AuditError::Cancelled)
        ));
    }

    #[test]
    fn web_plan_respects_feature_gates() {
        let href = "https://example.com/post";
        let base = PipelineConfig::default();
        let names: Vec<_> = web_plan(href, &base).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["reader_proxy", "readability_local", "metadata_only"]
        );

        let with_browser = PipelineConfig::default().with_headless_browser(true);
        let names: Vec<_> = web_plan(href, &with_browser)
            .iter()
            .map(|s| s.name())
            .collect();
        assert!(names.contains(&"headless_browser"));
    }

    #[test]
    fn youtube_plan_gates_audio_download() {
        let input = AuditInput::Url {
            href: "https://youtu.be/abc".into(),
        };
        let base = plan_for(Kind::YouTube, &input, &PipelineConfig::default());
        assert_eq!(base.len(), 2);

        let gated = plan_for(
            Kind::YouTube,
            &input,
            &PipelineConfig::default().with_audio_download(true),
        );
        assert_eq!(gated.len(), 3);
        assert_eq!(gated[2].name(), "audio_download");
    }
}
