//! Pipeline configuration.
//!
//! Built once at startup from the environment (or programmatically in
//! tests) and passed through the pipeline; no component reads env vars
//! on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// All tunable knobs of the acquisition and audit pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Inputs shorter than this route to the light model.
    pub short_threshold: usize,

    /// Inputs longer than this route to the heavy model.
    pub long_threshold: usize,

    /// Cap on the text handed to the reasoner after claim reduction.
    pub max_content_for_ai: usize,

    /// Cap on pasted text input.
    pub max_text_length: usize,

    /// Cap on fetched or uploaded media, bytes.
    pub max_media_size: u64,

    /// Below this many embedded chars a PDF is considered scanned and
    /// goes through page OCR.
    pub min_pdf_chars: usize,

    /// Page OCR stops after this many pages.
    pub max_pdf_pages: usize,

    /// Language hint for OCR, tesseract syntax (e.g. "eng+hin").
    pub ocr_languages: String,

    /// Cleaned text below this is treated as a failed extraction attempt
    /// unless the source was metadata-only.
    pub min_cleaned_chars: usize,

    pub enable_headless_browser: bool,

    /// Off by default in production: downloading audio for transcription
    /// is slow and expensive.
    pub enable_audio_download: bool,

    /// One stricter rerun when a clean first pass looks suspiciously
    /// confident. Can double latency, so it is a switch.
    pub enable_failsafe_reanalysis: bool,

    pub jurisdiction_default: String,

    /// Base URL of the remote plaintext rendering proxy used as the first
    /// web strategy. Empty disables the strategy.
    pub reader_proxy_base: String,

    /// Root directory of the rule pack files.
    pub rules_root: String,

    #[serde(with = "duration_secs")]
    pub fetch_timeout: Duration,

    #[serde(with = "duration_secs")]
    pub reason_timeout: Duration,

    #[serde(with = "duration_secs")]
    pub transcribe_timeout: Duration,

    #[serde(with = "duration_secs")]
    pub audio_download_timeout: Duration,

    /// Aggregate deadline for rendering PDF pages to images.
    #[serde(with = "duration_secs")]
    pub pdf_render_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            short_threshold: 3_000,
            long_threshold: 10_000,
            max_content_for_ai: 10_000,
            max_text_length: 100_000,
            max_media_size: 100 * 1024 * 1024,
            min_pdf_chars: 500,
            max_pdf_pages: 25,
            ocr_languages: "eng+hin".to_string(),
            min_cleaned_chars: 300,
            enable_headless_browser: false,
            enable_audio_download: false,
            enable_failsafe_reanalysis: true,
            jurisdiction_default: "India".to_string(),
            reader_proxy_base: "https://r.jina.ai".to_string(),
            rules_root: "rules".to_string(),
            fetch_timeout: Duration::from_secs(60),
            reason_timeout: Duration::from_secs(30),
            transcribe_timeout: Duration::from_secs(180),
            audio_download_timeout: Duration::from_secs(120),
            pdf_render_timeout: Duration::from_secs(120),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the environment on top of the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_usize("SHORT_THRESHOLD") {
            cfg.short_threshold = v;
        }
        if let Some(v) = env_usize("LONG_THRESHOLD") {
            cfg.long_threshold = v;
        }
        if let Some(v) = env_usize("MAX_CONTENT_FOR_AI") {
            cfg.max_content_for_ai = v;
        }
        if let Some(v) = env_usize("MAX_TEXT_LENGTH") {
            cfg.max_text_length = v;
        }
        if let Some(v) = env_u64("MAX_MEDIA_SIZE") {
            cfg.max_media_size = v;
        }
        if let Some(v) = env_usize("MIN_PDF_CHARS") {
            cfg.min_pdf_chars = v;
        }
        if let Some(v) = env_usize("MAX_PDF_PAGES") {
            cfg.max_pdf_pages = v;
        }
        if let Some(v) = env_string("OCR_LANGUAGES") {
            cfg.ocr_languages = v;
        }
        if let Some(v) = env_bool("ENABLE_HEADLESS_BROWSER") {
            cfg.enable_headless_browser = v;
        }
        if let Some(v) = env_bool("ENABLE_AUDIO_DOWNLOAD") {
            cfg.enable_audio_download = v;
        }
        if let Some(v) = env_bool("ENABLE_FAILSAFE_REANALYSIS") {
            cfg.enable_failsafe_reanalysis = v;
        }
        if let Some(v) = env_string("JURISDICTION_DEFAULT") {
            cfg.jurisdiction_default = v;
        }
        if let Some(v) = env_string("READER_PROXY_BASE") {
            cfg.reader_proxy_base = v;
        }
        if let Some(v) = env_string("RULES_ROOT") {
            cfg.rules_root = v;
        }
        cfg
    }

    pub fn with_headless_browser(mut self, enabled: bool) -> Self {
        self.enable_headless_browser = enabled;
        self
    }

    pub fn with_audio_download(mut self, enabled: bool) -> Self {
        self.enable_audio_download = enabled;
        self
    }

    pub fn with_failsafe_reanalysis(mut self, enabled: bool) -> Self {
        self.enable_failsafe_reanalysis = enabled;
        self
    }

    pub fn with_rules_root(mut self, root: impl Into<String>) -> Self {
        self.rules_root = root.into();
        self
    }

    pub fn with_reader_proxy(mut self, base: impl Into<String>) -> Self {
        self.reader_proxy_base = base.into();
        self
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_usize(key: &str) -> Option<usize> {
    env_string(key).and_then(|s| s.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|s| s.parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Durations serialize as whole seconds in config dumps.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(de)?))
    }
}
