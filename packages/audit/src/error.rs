//! Typed errors for the audit library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Extractor-local failures
//! (`FetchError`, `ExtractError`) are recoverable: the strategy runner
//! catches them and advances to the next strategy. `AuditError` is the
//! pipeline boundary type that callers map onto transport status codes.

use thiserror::Error;

/// Errors surfaced at the pipeline boundary.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Malformed URL, missing body, unsupported MIME type
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Options carried no user id
    #[error("missing user id")]
    Unauthenticated,

    /// Text body exceeds the configured input cap
    #[error("text too long: {len} chars (max {max})")]
    TextTooLong { len: usize, max: usize },

    /// Uploaded or fetched payload exceeds the media size cap
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: u64, max: u64 },

    /// Every strategy in the plan failed
    #[error("extraction exhausted: {last}")]
    ExtractionExhausted {
        #[source]
        last: ExtractError,
    },

    /// Rule pack could not be loaded
    #[error("rule repository error: {0}")]
    Rules(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request was cancelled
    #[error("audit cancelled")]
    Cancelled,
}

/// Errors from the bounded HTTP fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Deadline expired before the body was read
    #[error("fetch timed out: {url}")]
    Timeout { url: String },

    /// Server answered with status >= 400
    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    /// Connection-level failure (DNS, reset, TLS)
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Body exceeded the size cap while streaming
    #[error("payload too large: {url} exceeds {max} bytes")]
    TooLarge { url: String, max: u64 },

    /// URL failed to parse or has a disallowed scheme
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Transient failures are worth a bounded retry; 4xx (except 429) are not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors local to a single extraction strategy.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Strategy produced text below the usable minimum
    #[error("extracted text too short: {len} chars")]
    TooShort { len: usize },

    /// Cleaning discarded more than the allowed share of raw text
    #[error("cleaning lost {lost_pct:.0}% of raw text")]
    CleaningLoss { lost_pct: f64 },

    /// No caption track published for the video
    #[error("no captions available")]
    NoCaptions,

    /// Subprocess tool missing, failed, or exceeded its deadline
    #[error("subprocess {tool} failed: {reason}")]
    Subprocess { tool: &'static str, reason: String },

    /// Strategy requires a feature that is disabled by configuration
    #[error("{0} is disabled")]
    Disabled(&'static str),

    /// Transcription backend failed or returned empty text
    #[error("transcription failed: {0}")]
    Transcribe(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// OCR backend failed or returned empty text
    #[error("OCR failed: {0}")]
    Ocr(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Document parser could not recover text
    #[error("document parse failed: {0}")]
    Document(String),

    /// The source kind has no strategy plan
    #[error("unsupported source: {0}")]
    Unsupported(String),

    /// Cancellation observed mid-strategy
    #[error("extraction cancelled")]
    Cancelled,
}

/// Errors from the reasoner call path.
#[derive(Debug, Error)]
pub enum ReasonerError {
    /// Wall-clock deadline expired
    #[error("reasoner timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Response could not be coerced into report JSON even after repair
    #[error("reasoner returned invalid JSON: {0}")]
    InvalidJson(String),

    /// Upstream model API failure
    #[error("reasoner upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No model credentials or endpoint configured
    #[error("reasoner not configured")]
    Unconfigured,
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result alias for extractor strategies.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result alias for reasoner calls.
pub type ReasonResult<T> = std::result::Result<T, ReasonerError>;
