//! YouTube extraction strategies.
//!
//! Cheapest first: published caption tracks, then public oEmbed metadata,
//! and only when explicitly enabled a full audio download feeding the
//! transcriber.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use super::shell;
use super::web::page_metadata_text;
use super::{Extracted, Extractor, StrategyContext};
use crate::error::{ExtractError, ExtractResult};
use crate::types::{ContentFormat, SourceType};

/// Caption languages tried in order.
const CAPTION_LANGS: &[&str] = &["en", "en-US", "hi"];

const MAX_CAPTION_CHARS: usize = 200_000;

/// Extract the video id from any of the supported YouTube URL shapes.
pub fn video_id(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    if !crate::fingerprint::is_youtube_host(&host) {
        return None;
    }

    // youtu.be/<id>
    if host == "youtu.be" {
        let seg = url.path_segments()?.next()?.trim().to_string();
        if !seg.is_empty() {
            return Some(seg);
        }
    }

    // youtube.com/watch?v=<id>
    if url.path().starts_with("/watch") {
        for (k, v) in url.query_pairs() {
            if k == "v" && !v.trim().is_empty() {
                return Some(v.trim().to_string());
            }
        }
    }

    // youtube.com/shorts/<id>, /embed/<id>, /live/<id>
    let mut segments = url.path_segments()?;
    let first = segments.next().unwrap_or("");
    let second = segments.next().unwrap_or("");
    if matches!(first, "shorts" | "embed" | "live") && !second.trim().is_empty() {
        return Some(second.to_string());
    }

    None
}

/// Fetches the published caption track for a video.
pub struct CaptionTrack {
    href: String,
}

impl CaptionTrack {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[async_trait]
impl Extractor for CaptionTrack {
    fn name(&self) -> &'static str {
        "caption_track"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        let id = video_id(&self.href).ok_or_else(|| {
            ExtractError::Unsupported(format!("not a YouTube video URL: {}", self.href))
        })?;

        for lang in CAPTION_LANGS {
            ctx.check_cancelled()?;
            let url = format!("https://video.google.com/timedtext?lang={lang}&v={id}");
            let fetched = match ctx.fetcher.get(&url).await {
                Ok(f) => f,
                Err(e) => {
                    debug!(video = %id, lang, error = %e, "caption fetch failed");
                    continue;
                }
            };
            let text = caption_xml_to_text(&fetched.text(), MAX_CAPTION_CHARS);
            if !text.is_empty() {
                return Ok(Extracted::new(text, self.name())
                    .with_source(SourceType::Youtube, ContentFormat::Speech));
            }
        }

        Err(ExtractError::NoCaptions)
    }
}

/// Concatenate the cue text of a timedtext XML document.
///
/// The format is a flat `<transcript><text ...>cue</text>…` list; cues are
/// entity-escaped. Kept deterministic: no XML parser, just cue bodies.
pub fn caption_xml_to_text(xml: &str, max_chars: usize) -> String {
    static CUE: OnceLock<Regex> = OnceLock::new();
    let cue = CUE.get_or_init(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("static regex"));

    let mut out = String::new();
    for cap in cue.captures_iter(xml) {
        let body = unescape_entities(&cap[1]);
        let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
        if body.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&body);
        if out.chars().count() >= max_chars {
            break;
        }
    }
    out.trim().to_string()
}

fn unescape_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
}

/// Public oEmbed metadata: video title and channel, plus whatever meta
/// description the watch page carries. Metadata-only fallback for videos
/// without captions.
pub struct OEmbed {
    href: String,
}

impl OEmbed {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[async_trait]
impl Extractor for OEmbed {
    fn name(&self) -> &'static str {
        "oembed"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        // The watch URL carries its own query string; it must travel as a
        // single encoded `url` value or its params leak into the oEmbed
        // request.
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("url", &self.href)
            .append_pair("format", "json")
            .finish();
        let oembed_url = format!("https://www.youtube.com/oembed?{query}");

        // Two independent fetches; both must settle before the strategy
        // returns, so join rather than racing.
        let (oembed, page) = tokio::join!(
            ctx.fetcher.get(&oembed_url),
            ctx.fetcher.get_lenient(&self.href),
        );

        let mut parts: Vec<String> = Vec::new();
        if let Ok(fetched) = oembed {
            if let Ok(meta) = serde_json::from_slice::<OEmbedResponse>(&fetched.bytes) {
                if let Some(title) = meta.title.filter(|t| !t.trim().is_empty()) {
                    parts.push(format!("Title: {}", title.trim()));
                }
                if let Some(channel) = meta.author_name.filter(|c| !c.trim().is_empty()) {
                    parts.push(format!("Channel: {}", channel.trim()));
                }
            }
        }
        if let Ok(fetched) = page {
            if let Some(meta) = page_metadata_text(&fetched.text()) {
                // The watch page title duplicates the oEmbed title; keep
                // only the description part when both are present.
                if parts.is_empty() {
                    parts.push(meta);
                } else if let Some(desc) = meta.split("Description: ").nth(1) {
                    parts.push(format!("Description: {desc}"));
                }
            }
        }

        if parts.is_empty() {
            return Err(ExtractError::TooShort { len: 0 });
        }

        Ok(Extracted::new(parts.join("; "), self.name())
            .with_source(SourceType::Youtube, ContentFormat::Article)
            .metadata_only())
    }
}

/// Downloads the best audio track to MP3 and transcribes it.
///
/// Off by default in production: slow, bandwidth-heavy, and the
/// transcriber call is billed. The temp directory is removed on every
/// exit path including cancellation.
pub struct AudioDownload {
    href: String,
}

impl AudioDownload {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[async_trait]
impl Extractor for AudioDownload {
    fn name(&self) -> &'static str {
        "audio_download"
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractResult<Extracted> {
        ctx.check_cancelled()?;
        if !ctx.config.enable_audio_download {
            return Err(ExtractError::Disabled("audio download"));
        }

        let tmp = tempfile::tempdir().map_err(|e| ExtractError::Subprocess {
            tool: "yt-dlp",
            reason: format!("tempdir failed: {e}"),
        })?;
        let out_template = tmp.path().join("%(id)s.%(ext)s");

        let mut cmd = Command::new("yt-dlp");
        cmd.arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("-o")
            .arg(out_template.as_os_str())
            .arg(&self.href);

        shell::run_stdout_bounded(
            "yt-dlp",
            cmd,
            ctx.config.audio_download_timeout,
            64 * 1024,
            &ctx.cancel,
        )
        .await?;

        let audio_path = find_mp3(tmp.path()).ok_or(ExtractError::Subprocess {
            tool: "yt-dlp",
            reason: "no audio file produced".to_string(),
        })?;
        let size = std::fs::metadata(&audio_path).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(ExtractError::Subprocess {
                tool: "yt-dlp",
                reason: "audio file is empty".to_string(),
            });
        }
        debug!(path = %audio_path.display(), bytes = size, "audio downloaded");

        let transcript = transcribe_with_deadline(
            ctx,
            &audio_path,
            "audio/mpeg",
            ctx.config.transcribe_timeout,
        )
        .await?;

        Ok(Extracted::new(transcript, self.name())
            .with_source(SourceType::Youtube, ContentFormat::Speech))
    }
}

async fn transcribe_with_deadline(
    ctx: &StrategyContext,
    path: &std::path::Path,
    mime: &str,
    deadline: Duration,
) -> ExtractResult<String> {
    let transcribe = ctx.transcriber.transcribe_file(path, mime);
    let result = tokio::select! {
        r = tokio::time::timeout(deadline, transcribe) => r,
        _ = ctx.cancel.cancelled() => return Err(ExtractError::Cancelled),
    };
    let text = result
        .map_err(|_| ExtractError::Transcribe("transcription timed out".into()))?
        .map_err(ExtractError::Transcribe)?;
    if text.trim().is_empty() {
        return Err(ExtractError::Transcribe("empty transcript".into()));
    }
    Ok(text)
}

fn find_mp3(dir: &std::path::Path) -> Option<std::path::PathBuf> {
    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("mp3") {
            return Some(path);
        }
    }
    None
}
