//! Testing utilities including mock service implementations.
//!
//! These are useful for testing applications that drive the audit
//! pipeline without real model, OCR, or network calls. All mocks are
//! deterministic, cheaply cloneable (shared state behind `Arc`), and
//! record their calls for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{FetchError, ReasonResult, ReasonerError};
use crate::traits::{
    AuditStore, Fetched, Fetcher, GenerationRequest, Ocr, Reasoner, RuleRepository, ServiceError,
    Transcriber,
};
use crate::types::{AuditRecord, Rule, RulePack};

// =============================================================================
// MockFetcher
// =============================================================================

#[derive(Clone)]
enum CannedResponse {
    Ok(Fetched),
    /// HTTP error status; the optional body is what `get_lenient` sees.
    Status(u16, Option<String>),
}

/// A fetcher serving canned responses without touching the network.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, CannedResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a full canned response for a URL.
    pub fn with_response(self, url: impl Into<String>, fetched: Fetched) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), CannedResponse::Ok(fetched));
        self
    }

    /// Serve an HTML page for a URL.
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let fetched = Fetched {
            bytes: html.into().into_bytes(),
            mime: Some("text/html; charset=utf-8".to_string()),
            final_url: url.clone(),
            status: 200,
        };
        self.with_response(url, fetched)
    }

    /// Serve plain text for a URL (reader-proxy style).
    pub fn with_text(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        let url = url.into();
        let fetched = Fetched {
            bytes: text.into().into_bytes(),
            mime: Some("text/plain; charset=utf-8".to_string()),
            final_url: url.clone(),
            status: 200,
        };
        self.with_response(url, fetched)
    }

    /// Fail a URL with an HTTP status; `get_lenient` fails too.
    pub fn failing_with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), CannedResponse::Status(status, None));
        self
    }

    /// Fail a URL with an HTTP status but give `get_lenient` a body
    /// (block pages still carry title/meta tags).
    pub fn failing_with_body(
        self,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), CannedResponse::Status(status, Some(body.into())));
        self
    }

    /// URLs fetched, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        self.calls.write().unwrap().push(url.to_string());
        match self.responses.read().unwrap().get(url) {
            Some(CannedResponse::Ok(fetched)) => Ok(fetched.clone()),
            Some(CannedResponse::Status(status, _)) => Err(FetchError::Http {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(FetchError::Http {
                status: 404,
                url: url.to_string(),
            }),
        }
    }

    async fn get_lenient(&self, url: &str) -> Result<Fetched, FetchError> {
        self.calls.write().unwrap().push(url.to_string());
        match self.responses.read().unwrap().get(url) {
            Some(CannedResponse::Ok(fetched)) => Ok(fetched.clone()),
            Some(CannedResponse::Status(status, Some(body))) => Ok(Fetched {
                bytes: body.clone().into_bytes(),
                mime: Some("text/html".to_string()),
                final_url: url.to_string(),
                status: *status,
            }),
            Some(CannedResponse::Status(status, None)) => Err(FetchError::Http {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(FetchError::Http {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

// =============================================================================
// MockTranscriber
// =============================================================================

/// Record of one transcription call.
#[derive(Debug, Clone)]
pub struct TranscribeCall {
    pub byte_len: usize,
    pub mime: String,
}

/// Transcriber returning a fixed transcript.
#[derive(Clone)]
pub struct MockTranscriber {
    transcript: Arc<RwLock<String>>,
    calls: Arc<RwLock<Vec<TranscribeCall>>>,
}

impl MockTranscriber {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: Arc::new(RwLock::new(transcript.into())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<TranscribeCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, bytes: &[u8], mime: &str) -> Result<String, ServiceError> {
        self.calls.write().unwrap().push(TranscribeCall {
            byte_len: bytes.len(),
            mime: mime.to_string(),
        });
        Ok(self.transcript.read().unwrap().clone())
    }
}

// =============================================================================
// MockOcr
// =============================================================================

/// Record of one OCR call.
#[derive(Debug, Clone)]
pub struct OcrCall {
    pub byte_len: usize,
    pub mime: String,
    pub languages: String,
}

/// OCR returning fixed text.
#[derive(Clone)]
pub struct MockOcr {
    text: Arc<RwLock<String>>,
    calls: Arc<RwLock<Vec<OcrCall>>>,
}

impl MockOcr {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(RwLock::new(text.into())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<OcrCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Ocr for MockOcr {
    async fn image_to_text(
        &self,
        bytes: &[u8],
        mime: &str,
        languages: &str,
    ) -> Result<String, ServiceError> {
        self.calls.write().unwrap().push(OcrCall {
            byte_len: bytes.len(),
            mime: mime.to_string(),
            languages: languages.to_string(),
        });
        Ok(self.text.read().unwrap().clone())
    }
}

// =============================================================================
// MockReasoner
// =============================================================================

/// Record of one reasoner call.
#[derive(Debug, Clone)]
pub struct ReasonerCall {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_output_tokens: u32,
    pub json_output: bool,
}

/// Reasoner replaying a scripted queue of responses.
///
/// Each `generate` pops the next scripted response; when the queue is
/// empty it falls back to a minimal compliant-report JSON so pipelines
/// always complete.
#[derive(Clone, Default)]
pub struct MockReasoner {
    script: Arc<RwLock<VecDeque<ReasonResult<String>>>>,
    calls: Arc<RwLock<Vec<ReasonerCall>>>,
}

impl MockReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response string.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.script
            .write()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ReasonerError) -> Self {
        self.script.write().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<ReasonerCall> {
        self.calls.read().unwrap().clone()
    }

    /// A syntactically valid, violation-free report body.
    pub fn compliant_report_json() -> &'static str {
        r#"{"score": 10, "status": "Compliant", "summary": "No issues found.",
            "financialPenalty": {"riskLevel": "None", "description": "No exposure."},
            "ethicalMarketing": {"score": 90, "assessment": "Fair claims."},
            "violations": []}"#
    }
}

#[async_trait]
impl Reasoner for MockReasoner {
    async fn generate(&self, request: &GenerationRequest) -> ReasonResult<String> {
        self.calls.write().unwrap().push(ReasonerCall {
            model: request.model.clone(),
            system: request.system.clone(),
            user: request.user.clone(),
            max_output_tokens: request.config.max_output_tokens,
            json_output: request.config.json_output,
        });
        match self.script.write().unwrap().pop_front() {
            Some(scripted) => scripted,
            None => Ok(Self::compliant_report_json().to_string()),
        }
    }
}

// =============================================================================
// MemoryAuditStore
// =============================================================================

/// In-memory audit history; also usable as a storage backend for a
/// server run without external storage.
#[derive(Clone, Default)]
pub struct MemoryAuditStore {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn save(&self, record: &AuditRecord) -> Result<(), ServiceError> {
        self.records.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<AuditRecord>, ServiceError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list(
        &self,
        user_id: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<AuditRecord>, ServiceError> {
        let mut records: Vec<_> = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records.into_iter().skip(skip).take(limit).collect())
    }
}

/// Store whose `save` always fails; for asserting that persistence
/// failures never fail an audit.
#[derive(Clone, Default)]
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn save(&self, _record: &AuditRecord) -> Result<(), ServiceError> {
        Err("storage unavailable".into())
    }

    async fn get(&self, _id: &str) -> Result<Option<AuditRecord>, ServiceError> {
        Err("storage unavailable".into())
    }

    async fn list(
        &self,
        _user_id: &str,
        _limit: usize,
        _skip: usize,
    ) -> Result<Vec<AuditRecord>, ServiceError> {
        Err("storage unavailable".into())
    }
}

// =============================================================================
// StaticRules
// =============================================================================

/// Rule repository serving one fixed pack regardless of jurisdiction.
#[derive(Clone, Default)]
pub struct StaticRules {
    pack: Arc<RwLock<RulePack>>,
}

impl StaticRules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            pack: Arc::new(RwLock::new(RulePack::new(rules))),
        }
    }

    /// A small healthcare pack usable across tests.
    pub fn healthcare() -> Self {
        Self::new(vec![
            Rule {
                id: "dmr-1".to_string(),
                regulation: "Drugs and Magic Remedies Act, 1954".to_string(),
                section: Some("Section 4".to_string()),
                title: "Prohibits advertisements claiming to cure diseases".to_string(),
                jurisdiction_path: "india/healthcare".to_string(),
            },
            Rule {
                id: "ascicode-1".to_string(),
                regulation: "ASCI Code".to_string(),
                section: None,
                title: "Advertisements must not mislead by exaggeration".to_string(),
                jurisdiction_path: "india/common".to_string(),
            },
        ])
    }
}

#[async_trait]
impl RuleRepository for StaticRules {
    async fn load(
        &self,
        _country: &str,
        _region: Option<&str>,
        _category: &str,
    ) -> Result<RulePack, ServiceError> {
        Ok(self.pack.read().unwrap().clone())
    }
}

/// Convenience constructor for an audit record in tests.
pub fn test_record(id: &str, user_id: &str) -> AuditRecord {
    AuditRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        content_type: "text".to_string(),
        original_input: "input".to_string(),
        extracted_text: "extracted".to_string(),
        transcript: String::new(),
        report: crate::types::Report::error_shell("test", 0),
        created_at: Utc::now(),
    }
}
