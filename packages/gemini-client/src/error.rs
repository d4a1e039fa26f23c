//! Gemini client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    /// Missing API key or malformed configuration
    #[error("config error: {0}")]
    Config(String),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// API returned a non-success status
    #[error("Gemini API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Response carried no candidates or only empty parts
    #[error("empty response from Gemini")]
    Empty,
}

pub type Result<T> = std::result::Result<T, GeminiError>;
