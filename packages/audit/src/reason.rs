//! The reasoner adapter: one-shot structured audit calls.
//!
//! Owns the call discipline around the raw [`Reasoner`]: wall-clock
//! timeout, single-fallback on failure, the fail-safe re-analysis pass,
//! and the handoff to the normalizer. The adapter never errors out of a
//! model failure; the worst case is a structured error-shell report.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{AuditError, ReasonerError};
use crate::normalize;
use crate::prompts;
use crate::router::{ModelChoice, ModelRouter};
use crate::traits::{GenerationRequest, Reasoner};
use crate::types::{AuditOptions, ContentMetadata, Report, RulePack};

/// A clean first pass scoring at or above this triggers the fail-safe
/// re-analysis (suspiciously confident for marketing content).
const FAILSAFE_SCORE: u8 = 90;

pub struct ReasonerAdapter {
    router: ModelRouter,
    timeout: Duration,
    enable_failsafe: bool,
}

impl ReasonerAdapter {
    pub fn new(router: ModelRouter, config: &PipelineConfig) -> Self {
        Self {
            router,
            timeout: config.reason_timeout,
            enable_failsafe: config.enable_failsafe_reanalysis,
        }
    }

    /// Run the audit call chain and return a well-shaped report.
    ///
    /// Failure handling, in order: the routed model, then one fallback
    /// model, then the structured error shell. Only cancellation
    /// propagates as an error.
    pub async fn analyze(
        &self,
        reasoner: &dyn Reasoner,
        rules: &RulePack,
        options: &AuditOptions,
        meta: &ContentMetadata,
        content: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, AuditError> {
        let system = prompts::audit_system_prompt(rules, options, meta, false);
        let user = prompts::audit_user_prompt(content);

        let choice = self.router.select(content);
        let mut model_used = choice.model.clone();
        let mut used_fallback = false;

        let mut value = match self.call_once(reasoner, &choice, &system, &user, cancel).await {
            Ok(value) => Some(value),
            Err(ReasonerError::Unconfigured) => {
                return Ok(Report::error_shell("reasoner not configured", 0))
            }
            Err(e) => {
                warn!(model = %choice.model, error = %e, "primary reasoner call failed");
                None
            }
        };

        if cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        if value.is_none() {
            if let Some(fallback) = self.router.fallback(&choice.model) {
                match self
                    .call_once(reasoner, &fallback, &system, &user, cancel)
                    .await
                {
                    Ok(v) => {
                        info!(model = %fallback.model, "fallback reasoner call succeeded");
                        model_used = fallback.model.clone();
                        used_fallback = true;
                        value = Some(v);
                    }
                    Err(e) => {
                        warn!(model = %fallback.model, error = %e, "fallback reasoner call failed");
                    }
                }
            }
        }

        let Some(mut value) = value else {
            return Ok(Report::error_shell(
                "reasoner unavailable on primary and fallback models",
                0,
            ));
        };

        // Fail-safe re-analysis: a spotless pass with a suspiciously high
        // confidence gets one stricter look. Bounded to a single extra call.
        if self.enable_failsafe && is_suspiciously_clean(&value) {
            info!(model = %model_used, "clean high-score pass, running fail-safe re-analysis");
            let strict_system = prompts::audit_system_prompt(rules, options, meta, true);
            match self
                .call_once(reasoner, &choice, &strict_system, &user, cancel)
                .await
            {
                Ok(rerun) if has_violations(&rerun) => {
                    info!("fail-safe re-analysis found violations, superseding first pass");
                    value = rerun;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "fail-safe re-analysis failed, keeping first pass");
                }
            }
        }

        let mut report = normalize::normalize_value(&value);
        report.model_used = model_used;
        report.used_fallback = used_fallback;
        Ok(report)
    }

    async fn call_once(
        &self,
        reasoner: &dyn Reasoner,
        choice: &ModelChoice,
        system: &str,
        user: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, ReasonerError> {
        let request = GenerationRequest::new(&choice.model, system, user)
            .with_config(choice.config.clone());

        let call = reasoner.generate(&request);
        let raw = tokio::select! {
            result = tokio::time::timeout(self.timeout, call) => {
                result.map_err(|_| ReasonerError::Timeout {
                    seconds: self.timeout.as_secs(),
                })??
            }
            _ = cancel.cancelled() => {
                return Err(ReasonerError::Upstream("cancelled".into()));
            }
        };

        normalize::parse_model_json(&raw).map_err(ReasonerError::InvalidJson)
    }
}

fn has_violations(value: &Value) -> bool {
    value
        .get("violations")
        .and_then(Value::as_array)
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

fn is_suspiciously_clean(value: &Value) -> bool {
    !has_violations(value) && normalize::coerce_score(value.get("score")) >= FAILSAFE_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockReasoner, StaticRules};
    use crate::traits::RuleRepository;
    use crate::types::{ContentFormat, Language, SourceType, Status};

    fn meta() -> ContentMetadata {
        ContentMetadata {
            source_type: SourceType::Blog,
            content_format: ContentFormat::Article,
            language: Language::En,
            extraction_method: "direct".to_string(),
        }
    }

    async fn rules() -> RulePack {
        StaticRules::healthcare()
            .load("India", None, "healthcare")
            .await
            .unwrap()
    }

    fn adapter(failsafe: bool) -> ReasonerAdapter {
        let config = PipelineConfig::default().with_failsafe_reanalysis(failsafe);
        ReasonerAdapter::new(ModelRouter::default(), &config)
    }

    const VIOLATING: &str = r#"{"score": 75, "status": "Non-Compliant", "summary": "Cure claim found.",
        "violations": [{"severity": "HIGH", "regulation": "DMR Act",
            "violation_title": "Cure claim", "evidence": "cures all diseases",
            "translation": "cures all diseases",
            "guidance": ["Remove the cure claim", "Substantiate with trials"],
            "fix": ["Supports general wellness", "May help as part of a routine"],
            "risk_score": 80}]}"#;

    #[tokio::test]
    async fn happy_path_normalizes_and_stamps_the_model() {
        let reasoner = MockReasoner::new().with_response(VIOLATING);
        let report = adapter(true)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "This medicine cures all diseases",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.score, 75);
        assert_eq!(report.model_used, "gemini-2.0-flash");
        assert!(!report.used_fallback);
        assert_eq!(report.violations.len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_uses_the_fallback_model() {
        let reasoner = MockReasoner::new()
            .with_error(ReasonerError::Upstream("503".into()))
            .with_response(VIOLATING);
        let report = adapter(false)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "content",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(report.used_fallback);
        assert_eq!(report.model_used, "gemini-1.5-flash");
        assert_eq!(report.violations.len(), 1);
    }

    #[tokio::test]
    async fn double_failure_returns_the_error_shell() {
        let reasoner = MockReasoner::new()
            .with_error(ReasonerError::Timeout { seconds: 30 })
            .with_error(ReasonerError::Upstream("503".into()));
        let report = adapter(false)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "content",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.model_used, "none");
        assert_eq!(report.score, 0);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn invalid_json_counts_as_failure_and_falls_back() {
        let reasoner = MockReasoner::new()
            .with_response("I could not produce JSON, sorry!")
            .with_response(VIOLATING);
        let report = adapter(false)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "content",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(report.used_fallback);
        assert_eq!(report.violations.len(), 1);
    }

    #[tokio::test]
    async fn failsafe_rerun_supersedes_a_clean_high_score() {
        let clean = r#"{"score": 95, "status": "Compliant", "summary": "Fine.", "violations": []}"#;
        let reasoner = MockReasoner::new()
            .with_response(clean)
            .with_response(VIOLATING);
        let report = adapter(true)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "content",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.status, Status::NonCompliant);

        let calls = reasoner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].system.contains("carefully analyze and detect ANY"));
    }

    #[tokio::test]
    async fn failsafe_keeps_a_clean_rerun() {
        let clean = r#"{"score": 92, "violations": []}"#;
        let reasoner = MockReasoner::new()
            .with_response(clean)
            .with_response(clean);
        let report = adapter(true)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "content",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        // Normalizer: empty violations means Compliant with score 0.
        assert_eq!(report.status, Status::Compliant);
        assert_eq!(report.score, 0);
        assert_eq!(reasoner.calls().len(), 2);
    }

    #[tokio::test]
    async fn failsafe_disabled_makes_one_call() {
        let clean = r#"{"score": 95, "violations": []}"#;
        let reasoner = MockReasoner::new().with_response(clean);
        adapter(false)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "content",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(reasoner.calls().len(), 1);
    }

    #[tokio::test]
    async fn raw_text_never_reaches_the_reasoner() {
        let reasoner = MockReasoner::new().with_response(VIOLATING);
        adapter(false)
            .analyze(
                &reasoner,
                &rules().await,
                &AuditOptions::new("u", "healthcare"),
                &meta(),
                "REDUCED-CONTENT-ONLY",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let calls = reasoner.calls();
        assert!(calls[0].user.contains("REDUCED-CONTENT-ONLY"));
    }
}
