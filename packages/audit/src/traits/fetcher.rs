//! Fetcher trait for bounded HTTP GETs.

use async_trait::async_trait;

use crate::error::FetchError;

/// A fetched HTTP body with the response metadata the extractors need.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// Content-Type header value, if the server sent one.
    pub mime: Option<String>,
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
}

impl Fetched {
    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Best-effort check that the body is an HTML page rather than the
    /// media file the URL suffix promised.
    pub fn looks_like_html(&self) -> bool {
        if let Some(mime) = &self.mime {
            let m = mime.to_ascii_lowercase();
            if m.starts_with("text/html") || m.starts_with("application/xhtml") {
                return true;
            }
            // A concrete non-HTML type wins over byte sniffing.
            if !m.starts_with("application/octet-stream") && !m.starts_with("text/plain") {
                return false;
            }
        }
        let head = &self.bytes[..self.bytes.len().min(512)];
        let head = String::from_utf8_lossy(head).to_ascii_lowercase();
        let head = head.trim_start();
        head.starts_with("<!doctype html") || head.starts_with("<html")
    }
}

/// Bounded HTTP GET with rotation, timeout, and size caps.
///
/// A 403 must surface as `FetchError::Http { status: 403 }` without retry;
/// the strategy layer decides whether to fall back to a different
/// extraction path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError>;

    /// Like [`Fetcher::get`], but an HTTP error status returns the
    /// response body instead of failing. Block pages and CDN challenge
    /// pages still carry `<title>`/`<meta>` tags the last-resort metadata
    /// extractor can use.
    async fn get_lenient(&self, url: &str) -> Result<Fetched, FetchError> {
        self.get(url).await
    }
}
