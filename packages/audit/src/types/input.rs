//! Audit inputs and per-request options.

use serde::{Deserialize, Serialize};

/// One piece of marketing content submitted for audit.
///
/// The pipeline accepts heterogeneous inputs; `crate::fingerprint`
/// classifies them into a [`Kind`] that selects the extraction plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditInput {
    /// Plain text pasted by the caller.
    Text { body: String },

    /// A URL to fetch (web page, YouTube link, or direct media file).
    Url { href: String },

    /// An uploaded file (image, audio, video, or office document).
    File {
        #[serde(with = "serde_bytes_b64")]
        bytes: Vec<u8>,
        filename: String,
        mime: String,
    },
}

impl AuditInput {
    /// Short tag used for persisted records and logs.
    pub fn content_type(&self) -> &'static str {
        match self {
            AuditInput::Text { .. } => "text",
            AuditInput::Url { .. } => "url",
            AuditInput::File { mime, .. } => {
                if mime.starts_with("image/") {
                    "image"
                } else if mime.starts_with("audio/") {
                    "audio"
                } else if mime.starts_with("video/") {
                    "video"
                } else {
                    "document"
                }
            }
        }
    }
}

/// File bytes travel as base64 when inputs are serialized (e.g. test fixtures).
mod serde_bytes_b64 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

/// Target jurisdiction for the rule pack lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub country: String,
    /// Region level, only meaningful for federated packs (e.g. GCC states).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Jurisdiction {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Per-request audit options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditOptions {
    /// Caller identity; authentication itself is external, but an audit
    /// without an owner is rejected.
    pub user_id: String,

    /// Industry category selecting the rule pack (e.g. "healthcare").
    pub category: String,

    pub jurisdiction: Jurisdiction,

    /// Free-form analysis mode hint passed through to the prompt
    /// (e.g. "standard", "strict").
    #[serde(default = "default_mode")]
    pub analysis_mode: String,
}

fn default_mode() -> String {
    "standard".to_string()
}

impl AuditOptions {
    pub fn new(user_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            category: category.into(),
            jurisdiction: Jurisdiction::new("India"),
            analysis_mode: default_mode(),
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: Jurisdiction) -> Self {
        self.jurisdiction = jurisdiction;
        self
    }

    pub fn with_analysis_mode(mut self, mode: impl Into<String>) -> Self {
        self.analysis_mode = mode.into();
        self
    }
}

/// Classified input kind; selects the extraction strategy plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Text,
    WebPage,
    YouTube,
    MediaUrl,
    Image,
    Audio,
    Video,
    Document,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Text => "text",
            Kind::WebPage => "webpage",
            Kind::YouTube => "youtube",
            Kind::MediaUrl => "media_url",
            Kind::Image => "image",
            Kind::Audio => "audio",
            Kind::Video => "video",
            Kind::Document => "document",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_tags() {
        assert_eq!(AuditInput::Text { body: "x".into() }.content_type(), "text");
        let file = AuditInput::File {
            bytes: vec![1, 2, 3],
            filename: "ad.png".into(),
            mime: "image/png".into(),
        };
        assert_eq!(file.content_type(), "image");
        let file = AuditInput::File {
            bytes: vec![],
            filename: "brochure.pdf".into(),
            mime: "application/pdf".into(),
        };
        assert_eq!(file.content_type(), "document");
    }

    #[test]
    fn file_bytes_roundtrip_through_json() {
        let input = AuditInput::File {
            bytes: vec![0, 1, 2, 250, 251, 252],
            filename: "clip.mp3".into(),
            mime: "audio/mpeg".into(),
        };
        let json = serde_json::to_string(&input).unwrap();
        let back: AuditInput = serde_json::from_str(&json).unwrap();
        match back {
            AuditInput::File { bytes, .. } => assert_eq!(bytes, vec![0, 1, 2, 250, 251, 252]),
            _ => panic!("expected file input"),
        }
    }

    #[test]
    fn options_builder() {
        let opts = AuditOptions::new("user-1", "healthcare")
            .with_jurisdiction(Jurisdiction::new("GCC").with_region("UAE"))
            .with_analysis_mode("strict");
        assert_eq!(opts.jurisdiction.region.as_deref(), Some("UAE"));
        assert_eq!(opts.analysis_mode, "strict");
    }
}
