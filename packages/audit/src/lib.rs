//! Marketing-content compliance audit pipeline.
//!
//! Takes heterogeneous marketing inputs (text, URLs, uploaded media and
//! documents, YouTube links), drives them through the right extraction
//! strategy with ordered fallbacks, normalizes and enriches the text,
//! invokes a structured-generation reasoner against a jurisdiction- and
//! industry-specific rule pack, and yields a canonical compliance
//! [`Report`].
//!
//! # Design
//!
//! - External capabilities (reasoner, transcriber, OCR, rule source,
//!   store, fetcher) sit behind [`traits`]; production adapters and test
//!   mocks implement them interchangeably.
//! - Extraction is a per-kind plan of ordered strategies; failures fall
//!   through, and only an exhausted plan errors.
//! - Model output is adversarial: [`normalize`] repairs and coerces it
//!   into a report that always satisfies the shape invariants.
//! - The pipeline never crashes past the reasoner: the worst model
//!   outcome is a structured error-shell report.
//!
//! # Usage
//!
//! ```rust,ignore
//! use audit::{Pipeline, Services, PipelineConfig, AuditInput, AuditOptions};
//!
//! let pipeline = Pipeline::new(services, PipelineConfig::from_env());
//! let report = pipeline
//!     .audit(
//!         AuditInput::Text { body: "This medicine cures everything!".into() },
//!         AuditOptions::new("user-1", "healthcare"),
//!     )
//!     .await?;
//! ```

pub mod clean;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fingerprint;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod reason;
pub mod reduce;
pub mod router;
pub mod rules;
pub mod testing;
pub mod traits;
pub mod translate;
pub mod types;
pub mod validate;

#[cfg(feature = "gemini")]
pub mod ai;

pub use config::PipelineConfig;
pub use error::{AuditError, ExtractError, FetchError, ReasonerError, Result};
pub use fetch::HttpFetcher;
pub use pipeline::{Pipeline, Services};
pub use router::{ModelChoice, ModelRouter};
pub use rules::FsRuleRepository;
pub use traits::{
    AuditStore, Fetched, Fetcher, GenerationConfig, GenerationRequest, Ocr, Reasoner,
    RuleRepository, ServiceError, Transcriber,
};
pub use types::{
    AuditInput, AuditOptions, AuditRecord, ContentFormat, ContentMetadata, EthicalMarketing,
    ExtractedContent, FinancialPenalty, Jurisdiction, Kind, Language, Report, RiskLevel, Rule,
    RulePack, Severity, SourceType, Status, Violation,
};
