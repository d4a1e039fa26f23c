//! Web page extraction strategies.
//!
//! Ordered cheapest-first: a remote plaintext proxy, then local
//! readability over the fetched HTML, and finally a metadata-only
//! degradation that salvages `<title>`/`<meta>` when the page itself is
//! unreachable or unreadable.

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{Extracted, Extractor, StrategyContext};
use crate::error::{ExtractError, ExtractResult};
use crate::types::{ContentFormat, SourceType};

/// Containers likely to hold the article body, in preference order.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".post-content",
    ".entry-content",
    ".content",
    ".main-content",
];

/// Fetches a remote plaintext rendering of the page. Cheap and resilient
/// to client-side rendering, so it runs first.
pub struct ReaderProxy {
    url: String,
}

impl ReaderProxy {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Extractor for ReaderProxy {
    fn name(&self) -> &'static str {
        "reader_proxy"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let base = ctx.config.reader_proxy_base.trim_end_matches('/');
        if base.is_empty() {
            return Err(ExtractError::Disabled("reader proxy"));
        }
        let proxied = format!("{base}/{}", self.url);
        let fetched = ctx.fetcher.get(&proxied).await?;
        let text = fetched.text();
        let trimmed_len = text.trim().chars().count();
        if trimmed_len == 0 {
            return Err(ExtractError::TooShort { len: 0 });
        }
        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Blog, ContentFormat::Article))
    }
}

/// Fetches the page and extracts the main article body locally.
pub struct ReadabilityLocal {
    url: String,
}

impl ReadabilityLocal {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Extractor for ReadabilityLocal {
    fn name(&self) -> &'static str {
        "readability_local"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let fetched = ctx.fetcher.get(&self.url).await?;
        if !fetched.looks_like_html() {
            return Err(ExtractError::Unsupported(
                "response is not an HTML page".to_string(),
            ));
        }

        let text = readable_text(&fetched.text());
        let len = text.trim().chars().count();
        if len == 0 {
            return Err(ExtractError::TooShort { len: 0 });
        }
        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Blog, ContentFormat::Article))
    }
}

/// Extract the main readable text from an HTML document.
///
/// Two passes: a readability-style paragraph-density pick, then the
/// known content-container selectors. The denser result wins.
pub fn readable_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let by_paragraphs = paragraph_text(&doc);
    let by_container = container_text(&doc);

    if by_container.chars().count() > by_paragraphs.chars().count() {
        by_container
    } else {
        by_paragraphs
    }
}

/// Paragraph-level extraction: headings and paragraph text in document
/// order. Script/style content never appears because only `h*`/`p`/`li`
/// nodes are read.
fn paragraph_text(doc: &Html) -> String {
    let selector = Selector::parse("h1, h2, h3, p, li").expect("static selector");
    let mut parts: Vec<String> = Vec::new();
    for el in doc.select(&selector) {
        let text = el.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join("\n")
}

/// Container-level extraction: the first known content container that
/// holds a substantial amount of text.
fn container_text(doc: &Html) -> String {
    for sel in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        let mut best = String::new();
        for el in doc.select(&selector) {
            let text = el.text().collect::<Vec<_>>().join(" ");
            let text = normalize_block(&text);
            if text.chars().count() > best.chars().count() {
                best = text;
            }
        }
        if best.chars().count() >= 200 {
            return best;
        }
    }
    String::new()
}

fn normalize_block(text: &str) -> String {
    text.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last-resort extractor: `<title>` and `<meta>` description only.
///
/// Uses the lenient fetch so a 403 block page still yields its tags.
pub struct MetadataOnly {
    url: String,
}

impl MetadataOnly {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Extractor for MetadataOnly {
    fn name(&self) -> &'static str {
        "metadata_only"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let fetched = ctx.fetcher.get_lenient(&self.url).await?;
        let text = page_metadata_text(&fetched.text()).ok_or(ExtractError::TooShort { len: 0 })?;
        Ok(Extracted::new(text, self.name())
            .with_source(SourceType::Blog, ContentFormat::Article)
            .metadata_only())
    }
}

/// Render `"Title: …; Description: …"` from a page's head tags.
pub fn page_metadata_text(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("static selector");
    let title = doc
        .select(&title_sel)
        .next()
        .map(|t| t.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());

    let meta_sel =
        Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
            .expect("static selector");
    let description = doc
        .select(&meta_sel)
        .filter_map(|m| m.value().attr("content"))
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|c| !c.is_empty());

    match (title, description) {
        (Some(t), Some(d)) => Some(format!("Title: {t}; Description: {d}")),
        (Some(t), None) => Some(format!("Title: {t}")),
        (None, Some(d)) => Some(format!("Description: {d}")),
        (None, None) => None,
    }
}
