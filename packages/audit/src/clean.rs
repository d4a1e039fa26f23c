//! Text cleaning.
//!
//! Deliberately conservative: the cleaner exists to drop navigation
//! chrome and boilerplate, never paragraphs. Long lines are always kept,
//! and the content-loss guard in `crate::validate` catches any cleaning
//! pass that got too aggressive anyway.

use std::collections::HashSet;

use std::sync::OnceLock;

use regex::Regex;

/// Lines shorter than this are candidates for nav/boilerplate dropping.
const SHORT_LINE: usize = 90;

/// Lines at least this long are never dropped.
const LONG_LINE: usize = 120;

fn nav_terms() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(home|about|contact|privacy|terms|cookie|subscribe|newsletter|sign in|sign up|login|register|follow|share|advert|sponsored|related posts|comments|categories|tags|sidebar)\b",
        )
        .expect("static regex")
    })
}

fn sidebar_terms() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(popular|recent|recommended|archive|newsletter|share)\b")
            .expect("static regex")
    })
}

/// Normalize and de-boilerplate one extraction result.
pub fn clean(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut seen_short: HashSet<String> = HashSet::new();

    for line in raw.replace("\r\n", "\n").replace('\r', "\n").lines() {
        // Collapse intra-line whitespace runs.
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            continue;
        }

        let chars = line.chars().count();
        if chars >= LONG_LINE {
            out.push(line);
            continue;
        }

        if chars < SHORT_LINE
            && (nav_terms().is_match(&line) || sidebar_terms().is_match(&line))
        {
            continue;
        }

        // Dedupe repeated short fragments (menus render on every page).
        if chars < SHORT_LINE {
            let key = line.to_lowercase();
            if !seen_short.insert(key) {
                continue;
            }
        }

        out.push(line);
    }

    out.join("\n")
}
