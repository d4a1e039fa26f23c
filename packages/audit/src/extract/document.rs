//! Document extraction: PDFs, office documents, and image OCR.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::shell;
use super::{Extracted, Extractor, StrategyContext};
use crate::error::{ExtractError, ExtractResult};
use crate::types::{ContentFormat, SourceType};

const PANDOC_TIMEOUT: Duration = Duration::from_secs(20);
const OCR_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOOL_OUTPUT: usize = 8 * 1024 * 1024;

/// PDF rendering scale: 144 dpi is 2x the PDF default of 72.
const PDF_RENDER_DPI: &str = "144";

/// Embedded text first, page OCR for scanned documents.
pub struct PdfTextThenOcr {
    bytes: Vec<u8>,
}

impl PdfTextThenOcr {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[async_trait]
impl Extractor for PdfTextThenOcr {
    fn name(&self) -> &'static str {
        "pdf_text_then_ocr"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;

        let embedded = embedded_pdf_text(self.bytes.clone()).await;
        match &embedded {
            Ok(text) if text.chars().count() >= ctx.config.min_pdf_chars => {
                return Ok(Extracted::new(text.clone(), "pdf_text")
                    .with_source(SourceType::Upload, ContentFormat::Article));
            }
            Ok(text) => {
                debug!(
                    chars = text.chars().count(),
                    min = ctx.config.min_pdf_chars,
                    "embedded PDF text too short, trying page OCR"
                );
            }
            Err(reason) => {
                warn!(reason = %reason, "embedded PDF text extraction failed, trying page OCR");
            }
        }

        let ocr_text = self.ocr_pages(ctx).await?;
        if ocr_text.trim().is_empty() {
            return Err(ExtractError::Document(
                "no text recovered from PDF pages".to_string(),
            ));
        }
        Ok(Extracted::new(ocr_text, "pdf_ocr")
            .with_source(SourceType::Upload, ContentFormat::Article))
    }
}

impl PdfTextThenOcr {
    /// Render pages to PNG and OCR each one, bounded in pages and time.
    async fn ocr_pages(&self, ctx: &StrategyContext) -> ExtractResult<String> {
        let tmp = tempfile::tempdir().map_err(|e| ExtractError::Document(e.to_string()))?;
        let pdf_path = tmp.path().join("input.pdf");
        tokio::fs::write(&pdf_path, &self.bytes)
            .await
            .map_err(|e| ExtractError::Document(e.to_string()))?;

        let mut cmd = Command::new("pdftoppm");
        cmd.arg("-png")
            .arg("-r")
            .arg(PDF_RENDER_DPI)
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(ctx.config.max_pdf_pages.to_string())
            .arg(&pdf_path)
            .arg(tmp.path().join("page"));

        shell::run_stdout_bounded(
            "pdftoppm",
            cmd,
            ctx.config.pdf_render_timeout,
            64 * 1024,
            &ctx.cancel,
        )
        .await?;

        let mut pages: Vec<_> = std::fs::read_dir(tmp.path())
            .map_err(|e| ExtractError::Document(e.to_string()))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
            .collect();
        pages.sort();
        if pages.is_empty() {
            return Err(ExtractError::Document("PDF rendered no pages".to_string()));
        }

        let mut out = String::new();
        for (index, page) in pages.iter().enumerate() {
            ctx.check_cancelled()?;
            let bytes = tokio::fs::read(page)
                .await
                .map_err(|e| ExtractError::Document(e.to_string()))?;
            match ocr_with_deadline(ctx, &bytes, "image/png").await {
                Ok(text) => {
                    if !out.is_empty() {
                        out.push_str("\n\n");
                    }
                    out.push_str(text.trim());
                }
                Err(ExtractError::Cancelled) => return Err(ExtractError::Cancelled),
                Err(e) => {
                    // One unreadable page does not sink the document.
                    warn!(page = index + 1, error = %e, "page OCR failed");
                }
            }
        }
        Ok(out)
    }
}

/// `pdf-extract` runs on the blocking pool; it has panicked on malformed
/// documents before, so the call is fenced with `catch_unwind`.
async fn embedded_pdf_text(bytes: Vec<u8>) -> Result<String, String> {
    tokio::task::spawn_blocking(move || {
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| "pdf parser panicked".to_string())?
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}

async fn ocr_with_deadline(
    ctx: &StrategyContext,
    bytes: &[u8],
    mime: &str,
) -> ExtractResult<String> {
    let call = ctx
        .ocr
        .image_to_text(bytes, mime, &ctx.config.ocr_languages);
    let result = tokio::select! {
        r = tokio::time::timeout(OCR_TIMEOUT, call) => r,
        _ = ctx.cancel.cancelled() => return Err(ExtractError::Cancelled),
    };
    let text = result
        .map_err(|_| ExtractError::Ocr("OCR timed out".into()))?
        .map_err(ExtractError::Ocr)?;
    if text.trim().is_empty() {
        return Err(ExtractError::Ocr("empty OCR output".into()));
    }
    Ok(text)
}

/// Office documents (.docx and legacy .doc) via the pandoc converter.
pub struct DocText {
    bytes: Vec<u8>,
    mime: String,
    filename: String,
}

impl DocText {
    pub fn new(bytes: Vec<u8>, mime: String, filename: String) -> Self {
        Self {
            bytes,
            mime,
            filename,
        }
    }

    fn suffix(&self) -> &'static str {
        if self.mime == "application/msword" || self.filename.to_ascii_lowercase().ends_with(".doc")
        {
            ".doc"
        } else {
            ".docx"
        }
    }
}

#[async_trait]
impl Extractor for DocText {
    fn name(&self) -> &'static str {
        "doc_text"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;

        let tmp = tempfile::Builder::new()
            .prefix("audit-")
            .suffix(self.suffix())
            .tempfile()
            .map_err(|e| ExtractError::Document(e.to_string()))?;
        std::fs::write(tmp.path(), &self.bytes)
            .map_err(|e| ExtractError::Document(e.to_string()))?;

        let mut cmd = Command::new("pandoc");
        cmd.arg(tmp.path()).arg("-t").arg("plain").arg("--wrap=none");

        let out = shell::run_stdout_bounded(
            "pandoc",
            cmd,
            PANDOC_TIMEOUT,
            MAX_TOOL_OUTPUT,
            &ctx.cancel,
        )
        .await?;
        let text = String::from_utf8_lossy(&out).to_string();
        if text.trim().is_empty() {
            return Err(ExtractError::Document("converter produced no text".to_string()));
        }

        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Upload, ContentFormat::Article))
    }
}

/// OCR over an uploaded image.
pub struct ImageOcrExtract {
    bytes: Vec<u8>,
    mime: String,
}

impl ImageOcrExtract {
    pub fn new(bytes: Vec<u8>, mime: String) -> Self {
        Self { bytes, mime }
    }
}

#[async_trait]
impl Extractor for ImageOcrExtract {
    fn name(&self) -> &'static str {
        "image_ocr"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let text = ocr_with_deadline(ctx, &self.bytes, &self.mime).await?;
        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Upload, ContentFormat::Article))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::testing::{MockFetcher, MockOcr, MockTranscriber};

    fn ctx_with_ocr(ocr: MockOcr) -> StrategyContext {
        StrategyContext {
            fetcher: Arc::new(MockFetcher::new()),
            transcriber: Arc::new(MockTranscriber::new("")),
            ocr: Arc::new(ocr),
            config: Arc::new(PipelineConfig::default()),
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn image_ocr_passes_configured_languages() {
        let ocr = MockOcr::new("चमत्कारी इलाज in seven days");
        let ctx = ctx_with_ocr(ocr.clone());
        let strategy = ImageOcrExtract::new(vec![1, 2, 3], "image/png".to_string());
        let extracted = strategy.extract(&ctx).await.unwrap();
        assert!(extracted.text.contains("चमत्कारी"));

        let calls = ocr.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].languages, "eng+hin");
    }

    #[tokio::test]
    async fn empty_ocr_output_is_an_error() {
        let ctx = ctx_with_ocr(MockOcr::new("   "));
        let strategy = ImageOcrExtract::new(vec![1], "image/jpeg".to_string());
        assert!(matches!(
            strategy.extract(&ctx).await,
            Err(ExtractError::Ocr(_))
        ));
    }

    #[test]
    fn doc_suffix_detection() {
        let docx = DocText::new(
            vec![],
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
            "brochure.docx".into(),
        );
        assert_eq!(docx.suffix(), ".docx");

        let doc = DocText::new(vec![], "application/msword".into(), "old.doc".into());
        assert_eq!(doc.suffix(), ".doc");
    }

    #[tokio::test]
    async fn malformed_pdf_reports_failure_not_panic() {
        // Not a PDF at all; pdftoppm is unlikely to exist in test
        // environments, so the strategy must fail either at the embedded
        // pass or the render pass without crashing.
        let ctx = ctx_with_ocr(MockOcr::new("text"));
        let strategy = PdfTextThenOcr::new(b"not a pdf".to_vec());
        assert!(strategy.extract(&ctx).await.is_err());
    }
}
