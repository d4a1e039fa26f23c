//! Headless browser rendering for script-heavy pages.
//!
//! Drives a locally installed Chromium in headless mode and reads the
//! rendered DOM. Image, font, and media loading are disabled to keep the
//! render light. Gated behind `PipelineConfig::enable_headless_browser`
//! because spawning a browser per audit is expensive.

use async_trait::async_trait;
use scraper::Html;
use tokio::process::Command;
use tracing::debug;

use super::shell;
use super::web::page_metadata_text;
use super::{Extracted, Extractor, StrategyContext};
use crate::error::{ExtractError, ExtractResult};
use crate::types::{ContentFormat, SourceType};

const BROWSER_BINARIES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Page chrome stripped before reading text.
const STRIP_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];
const STRIP_CLASSES: &[&str] = &[
    "advert",
    "ad",
    "ads",
    "sponsored",
    "newsletter",
    "cookie",
    "banner",
];

/// Minimum visible text before the strategy degrades to metadata.
const MIN_RENDERED_CHARS: usize = 200;

const MAX_DOM_BYTES: usize = 8 * 1024 * 1024;

pub struct HeadlessBrowser {
    url: String,
}

impl HeadlessBrowser {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Extractor for HeadlessBrowser {
    fn name(&self) -> &'static str {
        "headless_browser"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        if !ctx.config.enable_headless_browser {
            return Err(ExtractError::Disabled("headless browser"));
        }

        let binary = BROWSER_BINARIES
            .iter()
            .find(|b| shell::which(b).is_some())
            .ok_or(ExtractError::Subprocess {
                tool: "chromium",
                reason: "no headless browser installed".to_string(),
            })?;

        let mut cmd = Command::new(binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--blink-settings=imagesEnabled=false")
            .arg("--disable-remote-fonts")
            .arg("--mute-audio")
            .arg("--virtual-time-budget=8000")
            .arg("--dump-dom")
            .arg(&self.url);

        let dom_bytes = shell::run_stdout_bounded(
            "chromium",
            cmd,
            ctx.config.fetch_timeout,
            MAX_DOM_BYTES,
            &ctx.cancel,
        )
        .await?;
        let dom = String::from_utf8_lossy(&dom_bytes);

        let text = rendered_text(&dom);
        if text.chars().count() >= MIN_RENDERED_CHARS {
            return Ok(Extracted::new(text, self.name())
                .with_source(SourceType::Blog, ContentFormat::Article));
        }

        // Blocked or near-empty render (403 interstitials land here):
        // salvage the page metadata before giving up.
        debug!(url = %self.url, "rendered DOM too thin, degrading to metadata");
        let meta = page_metadata_text(&dom).ok_or(ExtractError::TooShort {
            len: text.chars().count(),
        })?;
        Ok(Extracted::new(meta, self.name())
            .with_source(SourceType::Blog, ContentFormat::Article)
            .metadata_only())
    }
}

/// Visible text of a rendered DOM with page chrome removed.
pub fn rendered_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    collect_visible(doc.tree.root(), &mut out);
    out.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_visible(node: ego_tree::NodeRef<'_, scraper::Node>, out: &mut String) {
    match node.value() {
        scraper::Node::Text(text) => {
            let t = text.trim();
            if !t.is_empty() {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(t);
            }
        }
        scraper::Node::Element(el) => {
            let name = el.name();
            if STRIP_TAGS.contains(&name) {
                return;
            }
            if el
                .classes()
                .any(|class| STRIP_CLASSES.contains(&class.to_ascii_lowercase().as_str()))
            {
                return;
            }
            for child in node.children() {
                collect_visible(child, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_visible(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_chrome_and_flagged_classes() {
        let html = r#"
            <html><body>
              <nav>Menu items</nav>
              <div class="cookie">We use cookies</div>
              <div class="ad">Buy now</div>
              <main><p>The rendered campaign page describes the product.</p></main>
              <footer>copyright</footer>
              <script>window.x = 1;</script>
            </body></html>
        "#;
        let text = rendered_text(html);
        assert!(text.contains("rendered campaign page"));
        assert!(!text.contains("Menu items"));
        assert!(!text.contains("cookies"));
        assert!(!text.contains("Buy now"));
        assert!(!text.contains("copyright"));
        assert!(!text.contains("window.x"));
    }

    #[test]
    fn keeps_unflagged_divs() {
        let html = r#"<div class="product-info">Detailed description here</div>"#;
        assert!(rendered_text(html).contains("Detailed description"));
    }

    #[tokio::test]
    async fn disabled_flag_short_circuits() {
        use crate::config::PipelineConfig;
        use crate::testing::{MockFetcher, MockOcr, MockTranscriber};
        use std::sync::Arc;
        use tokio_util::sync::CancellationToken;

        let ctx = StrategyContext {
            fetcher: Arc::new(MockFetcher::new()),
            transcriber: Arc::new(MockTranscriber::new("")),
            ocr: Arc::new(MockOcr::new("")),
            config: Arc::new(PipelineConfig::default()),
            cancel: CancellationToken::new(),
        };
        let err = HeadlessBrowser::new("https://example.com")
            .extract(&ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Disabled(_)));
    }
}
