//! The audit pipeline: orchestration of acquisition, enrichment, and
//! reasoning for one input.
//!
//! Stage order is fixed: fingerprint, rule load, extraction, metadata
//! detection, translation, claim reduction, reasoner call, normalization,
//! best-effort persistence. The pipeline holds no mutable state between
//! requests; every audit runs against the shared [`Services`] record.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{AuditError, Result};
use crate::extract::{self, StrategyContext};
use crate::fingerprint;
use crate::metadata;
use crate::reason::ReasonerAdapter;
use crate::reduce;
use crate::router::ModelRouter;
use crate::traits::{AuditStore, Fetcher, Ocr, Reasoner, RuleRepository, Transcriber};
use crate::translate;
use crate::types::{
    AuditInput, AuditOptions, AuditRecord, ContentFormat, ExtractedContent, Kind, Report,
};

/// Persisted `original_input` is capped so records stay bounded.
const MAX_STORED_INPUT: usize = 10_000;

/// Process-wide external capabilities, injected once and shared across
/// requests. Every member must be safe for concurrent calls.
#[derive(Clone)]
pub struct Services {
    pub reasoner: Arc<dyn Reasoner>,
    pub transcriber: Arc<dyn Transcriber>,
    pub ocr: Arc<dyn Ocr>,
    pub rules: Arc<dyn RuleRepository>,
    pub store: Arc<dyn AuditStore>,
    pub fetcher: Arc<dyn Fetcher>,
}

/// The audit pipeline.
pub struct Pipeline {
    services: Services,
    config: Arc<PipelineConfig>,
    router: ModelRouter,
}

impl Pipeline {
    /// Build a pipeline with the default model routing derived from the
    /// config thresholds.
    pub fn new(services: Services, config: PipelineConfig) -> Self {
        let router = ModelRouter::default()
            .with_thresholds(config.short_threshold, config.long_threshold);
        Self {
            services,
            config: Arc::new(config),
            router,
        }
    }

    /// Override the model routing table.
    pub fn with_router(mut self, router: ModelRouter) -> Self {
        self.router = router;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Audit one input to completion.
    pub async fn audit(&self, input: AuditInput, options: AuditOptions) -> Result<Report> {
        self.audit_cancellable(input, options, CancellationToken::new())
            .await
    }

    /// Audit one input with a caller-held cancellation signal. The signal
    /// propagates to in-flight fetches, subprocesses, and model calls.
    pub async fn audit_cancellable(
        &self,
        input: AuditInput,
        options: AuditOptions,
        cancel: CancellationToken,
    ) -> Result<Report> {
        let started = Instant::now();
        let audit_id = Uuid::new_v4().to_string();

        if options.user_id.trim().is_empty() {
            return Err(AuditError::Unauthenticated);
        }
        self.check_input_limits(&input)?;

        let kind = fingerprint::classify(&input)?;
        info!(
            audit_id = %audit_id,
            kind = kind.as_str(),
            user = %options.user_id,
            category = %options.category,
            "audit started"
        );

        let country = if options.jurisdiction.country.trim().is_empty() {
            self.config.jurisdiction_default.as_str()
        } else {
            options.jurisdiction.country.as_str()
        };
        let rules = self
            .services
            .rules
            .load(country, options.jurisdiction.region.as_deref(), &options.category)
            .await
            .map_err(AuditError::Rules)?;
        debug!(audit_id = %audit_id, rule_count = rules.len(), "rule pack ready");

        let mut extracted = self.acquire(kind, &input, &cancel).await?;

        let meta = metadata::enrich(&mut extracted);
        debug!(
            audit_id = %audit_id,
            language = meta.language.code(),
            method = %meta.extraction_method,
            chars = extracted.cleaned.chars().count(),
            "content acquired"
        );

        if meta.language.needs_translation() {
            extracted.translated = translate::translate(
                self.services.reasoner.as_ref(),
                &self.router.default_model,
                &extracted.cleaned,
                &meta.language,
            )
            .await;
        }
        if cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        let reduced =
            reduce::reduce_claims(extracted.analysis_text(), self.config.max_content_for_ai);

        let adapter = ReasonerAdapter::new(self.router.clone(), &self.config);
        let mut report = adapter
            .analyze(
                self.services.reasoner.as_ref(),
                &rules,
                &options,
                &meta,
                &reduced,
                &cancel,
            )
            .await?;

        report.transcription = extracted.analysis_text().to_string();
        report.processing_time_ms = started.elapsed().as_millis() as u64;

        self.persist(&audit_id, &input, &options, &extracted, &report)
            .await;

        info!(
            audit_id = %audit_id,
            score = report.score,
            violations = report.violations.len(),
            model = %report.model_used,
            elapsed_ms = report.processing_time_ms,
            "audit finished"
        );
        Ok(report)
    }

    fn check_input_limits(&self, input: &AuditInput) -> Result<()> {
        match input {
            AuditInput::Text { body } => {
                let len = body.chars().count();
                if len > self.config.max_text_length {
                    return Err(AuditError::TextTooLong {
                        len,
                        max: self.config.max_text_length,
                    });
                }
            }
            AuditInput::File { bytes, .. } => {
                if bytes.len() as u64 > self.config.max_media_size {
                    return Err(AuditError::PayloadTooLarge {
                        len: bytes.len() as u64,
                        max: self.config.max_media_size,
                    });
                }
            }
            AuditInput::Url { .. } => {}
        }
        Ok(())
    }

    async fn acquire(
        &self,
        kind: Kind,
        input: &AuditInput,
        cancel: &CancellationToken,
    ) -> Result<ExtractedContent> {
        if kind == Kind::Text {
            let AuditInput::Text { body } = input else {
                unreachable!("Text kind only classifies text inputs");
            };
            return Ok(ExtractedContent::from_text(body.clone()));
        }

        let ctx = StrategyContext {
            fetcher: self.services.fetcher.clone(),
            transcriber: self.services.transcriber.clone(),
            ocr: self.services.ocr.clone(),
            config: self.config.clone(),
            cancel: cancel.clone(),
        };
        extract::acquire(kind, input, &ctx).await
    }

    /// Best-effort persistence: a storage failure is logged, never
    /// surfaced to the caller.
    async fn persist(
        &self,
        audit_id: &str,
        input: &AuditInput,
        options: &AuditOptions,
        extracted: &ExtractedContent,
        report: &Report,
    ) {
        let original_input = match input {
            AuditInput::Text { body } => clip(body, MAX_STORED_INPUT),
            AuditInput::Url { href } => href.clone(),
            // Raw upload bytes are not persisted; the extracted text is.
            AuditInput::File { filename, mime, .. } => format!("{filename} ({mime})"),
        };
        let transcript = if extracted.content_format == ContentFormat::Speech {
            extracted.cleaned.clone()
        } else {
            String::new()
        };

        let record = AuditRecord {
            id: audit_id.to_string(),
            user_id: options.user_id.clone(),
            content_type: input.content_type().to_string(),
            original_input,
            extracted_text: extracted.cleaned.clone(),
            transcript,
            report: report.clone(),
            created_at: chrono::Utc::now(),
        };

        if let Err(e) = self.services.store.save(&record).await {
            warn!(audit_id = %audit_id, error = %e, "failed to persist audit record");
        }
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
