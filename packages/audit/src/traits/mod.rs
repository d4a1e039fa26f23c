//! Service trait abstractions.
//!
//! These are INFRASTRUCTURE seams only - no audit logic. Vendor adapters
//! (Gemini, local OCR, a database-backed store) implement them behind the
//! pipeline; mocks in `crate::testing` implement them for tests.

pub mod fetcher;
pub mod ocr;
pub mod reasoner;
pub mod rules;
pub mod store;
pub mod transcriber;

pub use fetcher::{Fetched, Fetcher};
pub use ocr::Ocr;
pub use reasoner::{GenerationConfig, GenerationRequest, Reasoner};
pub use rules::RuleRepository;
pub use store::AuditStore;
pub use transcriber::Transcriber;

/// Opaque error produced by an external capability (transcriber, OCR,
/// store, rule source). Callers wrap it into the matching typed variant.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;
