//! Vendor-backed service adapters.

mod gemini;

pub use gemini::{GeminiOcr, GeminiReasoner, GeminiTranscriber};
