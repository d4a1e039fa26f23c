//! OCR trait for image-to-text.

use async_trait::async_trait;

use super::ServiceError;

/// Optical character recognition over an image buffer.
///
/// `languages` is a tesseract-style hint ("eng+hin"); backends that infer
/// language on their own may ignore it.
#[async_trait]
pub trait Ocr: Send + Sync {
    /// Extract readable text from one image. An empty result is an error.
    async fn image_to_text(
        &self,
        bytes: &[u8],
        mime: &str,
        languages: &str,
    ) -> Result<String, ServiceError>;
}
