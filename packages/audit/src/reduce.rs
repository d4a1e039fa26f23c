//! Claim reduction for long inputs.
//!
//! The reasoner does not need the whole page, it needs the sentences
//! that make claims. Above a length threshold the text is reduced to the
//! claim-bearing subset; when nothing matches, the leading slice is used
//! so the audit still sees representative content.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Texts at or below this length pass through untouched.
const REDUCTION_THRESHOLD: usize = 2_000;

fn claim_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            \b(cure[sd]?|treat(s|ed|ment)?|heal(s|ed|ing)?|prevent(s|ed|ion)?)\b |
            \b(medicine|drug|therapy)\b |
            \b(effective|works|improves|boosts)\b |
            \b(better|best|faster|stronger)\b |
            \d+\s*% |
            \bin\s+\d+\s+days?\b",
        )
        .expect("static regex")
    })
}

/// Reduce text to its claim-bearing sentences, capped at `max_chars`.
pub fn reduce_claims(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= REDUCTION_THRESHOLD {
        return clip(text, max_chars);
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut kept_chars = 0usize;

    for sentence in split_sentences(text) {
        if !claim_markers().is_match(sentence) {
            continue;
        }
        let len = sentence.chars().count();
        if kept_chars + len > max_chars {
            break;
        }
        kept.push(sentence);
        kept_chars += len + 1;
    }

    if kept.is_empty() {
        debug!("no claim-bearing sentences found, using the leading slice");
        return clip(text, max_chars);
    }

    let reduced = kept.join(" ");
    debug!(
        original_chars = text.chars().count(),
        reduced_chars = reduced.chars().count(),
        sentences = kept.len(),
        "claim reduction applied"
    );
    reduced
}

/// How many claim markers the text carries; the model router uses this
/// as its complexity signal.
pub(crate) fn claim_marker_count(text: &str) -> usize {
    claim_markers().find_iter(text).count()
}

/// Sentence-ish splitting: terminators plus newlines. Good enough for ad
/// copy, which is short sentences and bullet lines.
fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?', '\n', '।'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 10_000;

    #[test]
    fn short_text_passes_through() {
        let text = "This cream cures acne fast.";
        assert_eq!(reduce_claims(text, CAP), text);
    }

    #[test]
    fn keeps_claim_sentences_and_drops_filler() {
        let filler = "Our office is open on weekdays and parking is available behind the building near the garden gate entrance area. ";
        let claim = "The tonic cures joint pain in 7 days and improves mobility by 80%.";
        let text = format!("{}{claim} {}", filler.repeat(40), filler.repeat(40));
        assert!(text.chars().count() > REDUCTION_THRESHOLD);

        let reduced = reduce_claims(&text, CAP);
        assert!(reduced.contains("cures joint pain"));
        assert!(!reduced.contains("parking"));
        // Target reduction for claim-sparse pages is substantial
        assert!(reduced.chars().count() * 5 < text.chars().count());
    }

    #[test]
    fn numeric_claims_are_kept() {
        let filler = "General company history paragraph with no assertions about outcomes at all for anyone involved in any way. ";
        let text = format!(
            "{}Nine out of ten users saw results, a full 90% satisfaction score. {}",
            filler.repeat(25),
            filler.repeat(25)
        );
        let reduced = reduce_claims(&text, CAP);
        assert!(reduced.contains("90%"));
    }

    #[test]
    fn no_matches_falls_back_to_leading_slice() {
        let filler = "Plain descriptive copy about the venue and its decor with nothing resembling an assertion of benefit. ";
        let text = filler.repeat(60);
        let reduced = reduce_claims(&text, 500);
        assert_eq!(reduced.chars().count(), 500);
        assert!(text.starts_with(&reduced));
    }

    #[test]
    fn output_respects_the_cap() {
        let claim = "This medicine cures everything and works better than the best alternative in 3 days. ";
        let text = claim.repeat(400);
        let reduced = reduce_claims(&text, 1_000);
        assert!(reduced.chars().count() <= 1_000);
    }

    #[test]
    fn hindi_danda_is_a_sentence_boundary() {
        // Claim markers are English/numeric; Hindi ads still carry the
        // numeric ones ("100% इलाज").
        let filler = "सामान्य विवरण जिसमें कोई दावा नहीं है और केवल कार्यालय की जानकारी दी गई है। ";
        let text = format!(
            "{}यह दवा 100% इलाज की गारंटी देती है। {}",
            filler.repeat(30),
            filler.repeat(30)
        );
        let reduced = reduce_claims(&text, CAP);
        assert!(reduced.contains("100%"));
        assert!(!reduced.contains("कार्यालय"));
    }
}
