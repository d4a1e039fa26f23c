//! Reasoner trait for structured-JSON model calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReasonResult;

/// Generation parameters for one model call.
///
/// The audit path pins `temperature` to 0.0 so the only nondeterminism
/// left is the model itself; the normalizer treats the output as
/// adversarial regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Ask the backend for a JSON response MIME where supported.
    pub json_output: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.95,
            max_output_tokens: 8_192,
            json_output: true,
        }
    }
}

impl GenerationConfig {
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Plain-text variant used by the translator.
    pub fn plain_text(mut self) -> Self {
        self.json_output = false;
        self
    }
}

/// A fully templated prompt plus the model and parameters to run it with.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Backend model id, e.g. "gemini-2.0-flash".
    pub model: String,
    pub system: String,
    pub user: String,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }
}

/// The external structured-generation model.
///
/// Implementations wrap a specific provider and must be safe for
/// concurrent calls; the pipeline shares one instance process-wide.
/// Timeouts and fallback are the caller's job (`crate::reason`), not the
/// implementation's.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// One-shot generation; returns the raw model text (ideally JSON, but
    /// never trusted to be).
    async fn generate(&self, request: &GenerationRequest) -> ReasonResult<String>;
}
