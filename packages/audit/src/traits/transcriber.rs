//! Transcriber trait for speech-to-text.

use std::path::Path;

use async_trait::async_trait;

use super::ServiceError;

/// Speech-to-text over an audio or video payload.
///
/// Implementations must be safe for concurrent calls. The extractor layer
/// owns the deadline; implementations should not install their own long
/// timeouts.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an in-memory media buffer. Succeeds only with non-empty
    /// text; an empty transcript is an error.
    async fn transcribe(&self, bytes: &[u8], mime: &str) -> Result<String, ServiceError>;

    /// Transcribe a file on disk (e.g. a downloaded MP3). The default
    /// reads the file and delegates to [`Transcriber::transcribe`].
    async fn transcribe_file(&self, path: &Path, mime: &str) -> Result<String, ServiceError> {
        let bytes = tokio::fs::read(path).await?;
        self.transcribe(&bytes, mime).await
    }
}
