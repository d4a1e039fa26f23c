//! Gemini implementations of the service traits.
//!
//! Wraps the pure `gemini-client` and implements the audit-specific
//! seams: structured generation for the reasoner, inline-image OCR, and
//! inline-audio transcription. One shared client serves all adapters;
//! the pipeline constructs them once and reuses them across requests.

use async_trait::async_trait;
use gemini_client::{encode_inline, GeminiClient, GeminiError, GenerateRequest, Part};

use crate::error::{ReasonResult, ReasonerError};
use crate::traits::{GenerationRequest, Ocr, Reasoner, ServiceError, Transcriber};

const OCR_MODEL: &str = "gemini-2.0-flash";
const TRANSCRIBE_MODEL: &str = "gemini-2.0-flash";

const OCR_PROMPT: &str =
    "Extract all readable text from this image exactly as written, preserving the \
     original language and line breaks. Return only the text.";

const TRANSCRIBE_PROMPT: &str =
    "Transcribe this recording verbatim in its original language. Return only the \
     transcript text.";

fn to_client_config(config: &crate::traits::GenerationConfig) -> gemini_client::GenerationConfig {
    gemini_client::GenerationConfig {
        temperature: Some(config.temperature),
        top_p: Some(config.top_p),
        max_output_tokens: Some(config.max_output_tokens),
        response_mime_type: config
            .json_output
            .then(|| "application/json".to_string()),
    }
}

/// Gemini-backed [`Reasoner`].
#[derive(Clone)]
pub struct GeminiReasoner {
    client: GeminiClient,
}

impl GeminiReasoner {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> ReasonResult<Self> {
        GeminiClient::from_env()
            .map(Self::new)
            .map_err(|_| ReasonerError::Unconfigured)
    }
}

#[async_trait]
impl Reasoner for GeminiReasoner {
    async fn generate(&self, request: &GenerationRequest) -> ReasonResult<String> {
        let api_request = GenerateRequest::user(vec![Part::text(&request.user)])
            .with_system(&request.system)
            .with_config(to_client_config(&request.config));

        self.client
            .generate(&request.model, api_request)
            .await
            .map_err(|e| match e {
                GeminiError::Config(_) => ReasonerError::Unconfigured,
                GeminiError::Parse(m) => ReasonerError::InvalidJson(m),
                other => ReasonerError::Upstream(Box::new(other)),
            })
    }
}

/// Gemini vision as an [`Ocr`] backend. The model infers the language
/// itself; the tesseract-style hint is ignored.
#[derive(Clone)]
pub struct GeminiOcr {
    client: GeminiClient,
    model: String,
}

impl GeminiOcr {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: OCR_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Ocr for GeminiOcr {
    async fn image_to_text(
        &self,
        bytes: &[u8],
        mime: &str,
        _languages: &str,
    ) -> Result<String, ServiceError> {
        let request = GenerateRequest::user(vec![
            Part::text(OCR_PROMPT),
            Part::inline(mime, encode_inline(bytes)),
        ])
        .with_config(gemini_client::GenerationConfig {
            temperature: Some(0.0),
            max_output_tokens: Some(4_096),
            ..Default::default()
        });

        let text = self.client.generate(&self.model, request).await?;
        Ok(text)
    }
}

/// Gemini inline-audio transcription as a [`Transcriber`] backend.
#[derive(Clone)]
pub struct GeminiTranscriber {
    client: GeminiClient,
    model: String,
}

impl GeminiTranscriber {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: TRANSCRIBE_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(&self, bytes: &[u8], mime: &str) -> Result<String, ServiceError> {
        let request = GenerateRequest::user(vec![
            Part::text(TRANSCRIBE_PROMPT),
            Part::inline(mime, encode_inline(bytes)),
        ])
        .with_config(gemini_client::GenerationConfig {
            temperature: Some(0.0),
            max_output_tokens: Some(8_192),
            ..Default::default()
        });

        let text = self.client.generate(&self.model, request).await?;
        Ok(text)
    }
}
