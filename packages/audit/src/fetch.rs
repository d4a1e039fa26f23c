//! Bounded HTTP fetcher.
//!
//! One GET with a rotating browser-like user agent, a hard timeout, a
//! streaming size cap, and a small retry budget for transient failures.
//! 403s are returned to the caller untouched: the strategy layer decides
//! whether a blocked site falls back to another extraction path.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::traits::{Fetched, Fetcher};

/// Fixed pool of user agents; one is picked at random per request so a
/// burst of audits does not present a single fingerprint.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
];

const MAX_RETRIES: u32 = 2;
const BACKOFF_BASE: Duration = Duration::from_millis(800);

/// Production [`Fetcher`] backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .expect("static header"),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().expect("static header"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("HTTP client construction only fails on TLS misconfiguration");

        Self {
            client,
            timeout,
            max_body_bytes,
        }
    }

    fn pick_user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    async fn get_once(&self, url: &str, allow_error_body: bool) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::pick_user_agent())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout { url: url.to_string() }
                } else {
                    FetchError::Network {
                        url: url.to_string(),
                        source: Box::new(e),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() >= 400 && !allow_error_body {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Reject early when the server declares an oversized body.
        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    max: self.max_body_bytes,
                });
            }
        }

        let final_url = response.url().to_string();
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Stream with a running cap: Content-Length is optional and
        // chunked responses can exceed any declared size.
        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = response;
        loop {
            let chunk = stream.chunk().await.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout { url: url.to_string() }
                } else {
                    FetchError::Network {
                        url: url.to_string(),
                        source: Box::new(e),
                    }
                }
            })?;
            let Some(chunk) = chunk else { break };
            if bytes.len() as u64 + chunk.len() as u64 > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    max: self.max_body_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = bytes.len(),
            mime = mime.as_deref().unwrap_or("-"),
            "fetched"
        );

        Ok(Fetched {
            bytes,
            mime,
            final_url,
            status: status.as_u16(),
        })
    }
}

impl HttpFetcher {
    /// The configured per-request deadline (used by plans that need to
    /// budget multiple fetches).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_with_retries(
        &self,
        url: &str,
        allow_error_body: bool,
    ) -> Result<Fetched, FetchError> {
        // Parse up front so callers get InvalidUrl instead of a connect error.
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let mut attempt = 0u32;
        loop {
            match self.get_once(url, allow_error_body).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    let backoff = BACKOFF_BASE * 2u32.pow(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        self.get_with_retries(url, false).await
    }

    async fn get_lenient(&self, url: &str) -> Result<Fetched, FetchError> {
        self.get_with_retries(url, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_pool_is_nonempty_and_browserlike() {
        assert!(!USER_AGENTS.is_empty());
        for ua in USER_AGENTS {
            assert!(ua.starts_with("Mozilla/5.0"));
        }
        // Picking never panics
        let _ = HttpFetcher::pick_user_agent();
    }

    #[tokio::test]
    async fn invalid_urls_fail_without_network() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1), 1024);
        assert!(matches!(
            fetcher.get("not a url").await,
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            fetcher.get("ftp://example.com/x").await,
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
