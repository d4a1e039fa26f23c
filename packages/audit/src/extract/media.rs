//! Media transcription strategies: uploads and direct media URLs.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{finish_attempt, Extracted, Extractor, StrategyContext};
use crate::error::{AuditError, ExtractError, ExtractResult};
use crate::types::{AuditInput, ContentFormat, ExtractedContent, SourceType};

/// Transcribes an uploaded audio or video file.
pub struct TranscribeUpload {
    bytes: Vec<u8>,
    mime: String,
}

impl TranscribeUpload {
    pub fn new(bytes: Vec<u8>, mime: String) -> Self {
        Self { bytes, mime }
    }
}

#[async_trait]
impl Extractor for TranscribeUpload {
    fn name(&self) -> &'static str {
        "transcribe_upload"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let text = transcribe_bytes(ctx, &self.bytes, &self.mime).await?;
        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Upload, ContentFormat::Speech))
    }
}

pub(super) async fn transcribe_bytes(
    ctx: &StrategyContext,
    bytes: &[u8],
    mime: &str,
) -> ExtractResult<String> {
    let call = ctx.transcriber.transcribe(bytes, mime);
    let result = tokio::select! {
        r = tokio::time::timeout(ctx.config.transcribe_timeout, call) => r,
        _ = ctx.cancel.cancelled() => return Err(ExtractError::Cancelled),
    };
    let text = result
        .map_err(|_| ExtractError::Transcribe("transcription timed out".into()))?
        .map_err(ExtractError::Transcribe)?;
    if text.trim().is_empty() {
        return Err(ExtractError::Transcribe("empty transcript".into()));
    }
    Ok(text)
}

/// Strategy wrapper for a media URL that was already fetched and sniffed.
pub(super) struct MediaUrlExtract {
    href: String,
}

impl MediaUrlExtract {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[async_trait]
impl Extractor for MediaUrlExtract {
    fn name(&self) -> &'static str {
        "media_url"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let fetched = ctx.fetcher.get(&self.href).await?;
        let mime = fetched
            .mime
            .clone()
            .unwrap_or_else(|| "audio/mpeg".to_string());
        let text = transcribe_bytes(ctx, &fetched.bytes, &mime).await?;
        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Media, ContentFormat::Speech))
    }
}

/// Acquire content behind a media URL.
///
/// The URL is fetched once and sniffed: some "media" links actually serve
/// an HTML landing page, which degrades to the web-page plan instead of
/// feeding HTML bytes to the transcriber.
pub(super) async fn acquire_media_url(
    input: &AuditInput,
    ctx: &StrategyContext,
) -> Result<ExtractedContent, AuditError> {
    let AuditInput::Url { href } = input else {
        return Err(AuditError::InvalidInput {
            reason: "media extraction requires a URL input".to_string(),
        });
    };

    let fetched = match ctx.fetcher.get(href).await {
        Ok(f) => f,
        Err(e) => {
            return Err(AuditError::ExtractionExhausted {
                last: ExtractError::Fetch(e),
            })
        }
    };

    if fetched.looks_like_html() {
        info!(url = %href, "media URL served HTML, degrading to web page plan");
        let plan = super::web_plan(href, &ctx.config);
        return super::run_plan(&plan, ctx).await;
    }

    if ctx.cancel.is_cancelled() {
        return Err(AuditError::Cancelled);
    }

    let mime = fetched
        .mime
        .clone()
        .unwrap_or_else(|| "audio/mpeg".to_string());
    debug!(url = %href, mime = %mime, bytes = fetched.bytes.len(), "transcribing media URL");

    let extracted = match transcribe_bytes(ctx, &fetched.bytes, &mime).await {
        Ok(text) => Extracted::new(text, "media_url")
            .with_source(SourceType::Media, ContentFormat::Speech),
        Err(ExtractError::Cancelled) => return Err(AuditError::Cancelled),
        Err(e) => return Err(AuditError::ExtractionExhausted { last: e }),
    };

    finish_attempt(extracted, ctx)
        .map_err(|last| AuditError::ExtractionExhausted { last })
}
