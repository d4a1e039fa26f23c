//! Input classification.
//!
//! Total over the declared input set: every [`AuditInput`] either maps to
//! a [`Kind`] or fails with `InvalidInput`. Classifying the same input
//! twice yields the same kind.

use url::Url;

use crate::error::AuditError;
use crate::types::{AuditInput, Kind};

/// File extensions that mark a URL as a direct media file.
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "mp4", "wav", "m4a", "aac", "ogg", "flac", "webm", "mov", "avi", "mkv", "flv",
];

/// Hosts that serve video content without a media file suffix.
const VIDEO_PLATFORM_HOSTS: &[&str] = &["vimeo.com", "dailymotion.com", "rumble.com"];

/// Classify an input into the kind that selects its extraction plan.
pub fn classify(input: &AuditInput) -> Result<Kind, AuditError> {
    match input {
        AuditInput::Text { body } => {
            if body.trim().is_empty() {
                return Err(AuditError::InvalidInput {
                    reason: "text body is empty".to_string(),
                });
            }
            Ok(Kind::Text)
        }
        AuditInput::Url { href } => classify_url(href),
        AuditInput::File { mime, filename, .. } => classify_file(mime, filename),
    }
}

fn classify_url(href: &str) -> Result<Kind, AuditError> {
    let url = Url::parse(href.trim()).map_err(|_| AuditError::InvalidInput {
        reason: format!("malformed URL: {href}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuditError::InvalidInput {
            reason: format!("unsupported URL scheme: {}", url.scheme()),
        });
    }

    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    if host.is_empty() {
        return Err(AuditError::InvalidInput {
            reason: "URL has no host".to_string(),
        });
    }

    if is_youtube_host(&host) {
        return Ok(Kind::YouTube);
    }

    let path = url.path().to_ascii_lowercase();
    let suffix = path.rsplit('.').next().unwrap_or("");
    if path.contains('.') && MEDIA_EXTENSIONS.contains(&suffix) {
        return Ok(Kind::MediaUrl);
    }
    if VIDEO_PLATFORM_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    {
        return Ok(Kind::MediaUrl);
    }

    Ok(Kind::WebPage)
}

fn classify_file(mime: &str, filename: &str) -> Result<Kind, AuditError> {
    let mime = mime.trim().to_ascii_lowercase();
    if mime.starts_with("image/") {
        return Ok(Kind::Image);
    }
    if mime.starts_with("audio/") {
        return Ok(Kind::Audio);
    }
    if mime.starts_with("video/") {
        return Ok(Kind::Video);
    }
    if matches!(
        mime.as_str(),
        "application/pdf"
            | "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    ) {
        return Ok(Kind::Document);
    }
    Err(AuditError::InvalidInput {
        reason: format!("unsupported file type {mime} ({filename})"),
    })
}

pub fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com" || h == "youtu.be" || h == "m.youtube.com" || h.ends_with(".youtube.com")
}
