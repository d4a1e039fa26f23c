//! Pure Gemini REST API client
//!
//! A clean, minimal client for the Generative Language API with no
//! domain-specific logic. Supports text generation with a system
//! instruction, JSON-only response MIME, and inline media parts (images
//! and audio) for vision/transcription use.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, GenerateRequest, GenerationConfig, Part};
//!
//! let client = GeminiClient::from_env()?;
//! let request = GenerateRequest::user(vec![Part::text("Say hello")])
//!     .with_config(GenerationConfig { temperature: Some(0.0), ..Default::default() });
//! let text = client.generate("gemini-2.0-flash", request).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{GeminiError, Result};
pub use types::{
    Content, GenerateRequest, GenerateResponse, GenerationConfig, InlineData, Part,
};

use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (proxies, regional endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `generateContent` and return the first candidate's text.
    pub async fn generate(&self, model: &str, request: GenerateRequest) -> Result<String> {
        let start = std::time::Instant::now();
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %model, error = %e, "Gemini request failed");
                GeminiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(model = %model, status = status.as_u16(), "Gemini API error");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(GeminiError::Empty);
        }

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Gemini generation complete"
        );
        Ok(text)
    }
}

/// Encode bytes for an inline data part.
pub fn encode_inline(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
