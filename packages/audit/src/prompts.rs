//! Prompt templates for the reasoner.
//!
//! The system part carries the auditor role, the jurisdiction, the rule
//! pack, the mandatory output rules, and the exact JSON schema. The user
//! part is always the reduced (and possibly translated) content - never
//! the raw extraction.

use std::fmt::Write;

use crate::types::{AuditOptions, ContentMetadata, RulePack};

/// Rules rendered into the prompt; packs can be larger.
pub const MAX_PROMPT_RULES: usize = 50;

/// System instruction for the audit call.
pub fn audit_system_prompt(
    rules: &RulePack,
    options: &AuditOptions,
    meta: &ContentMetadata,
    strict_reanalysis: bool,
) -> String {
    let mut p = String::with_capacity(4_096);

    let region = options
        .jurisdiction
        .region
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default();

    let _ = writeln!(
        p,
        "You are a marketing compliance auditor for the {} industry in {}{region}.",
        options.category, options.jurisdiction.country
    );
    let _ = writeln!(
        p,
        "Analysis mode: {}. Content source: {} ({}), extracted via {}, language: {}.",
        options.analysis_mode,
        meta.source_type.as_str(),
        meta.content_format.as_str(),
        meta.extraction_method,
        meta.language.code()
    );

    if strict_reanalysis {
        let _ = writeln!(
            p,
            "\nIMPORTANT: carefully analyze and detect ANY misleading or prohibited \
             healthcare claims. Do not pass content that makes unprovable promises, \
             exaggerated outcomes, or guaranteed results."
        );
    }

    let _ = writeln!(p, "\nApplicable regulations:");
    if rules.is_empty() {
        let _ = writeln!(
            p,
            "(no rule pack loaded for this jurisdiction; audit against generally \
             accepted advertising standards)"
        );
    }
    for (ordinal, rule) in rules.top(MAX_PROMPT_RULES).iter().enumerate() {
        let section = rule
            .section
            .as_deref()
            .map(|s| format!(", {s}"))
            .unwrap_or_default();
        let _ = writeln!(
            p,
            "{}. {}{section}: {}",
            ordinal + 1,
            rule.regulation,
            rule.title
        );
    }

    let _ = writeln!(
        p,
        r#"
Audit the content against these regulations and respond with ONLY a JSON object in exactly this schema:

{{
  "score": <integer 0-100, 0 = fully compliant, 100 = maximally non-compliant>,
  "status": "Compliant" | "Needs Review" | "Non-Compliant",
  "summary": "<one-paragraph overview>",
  "financialPenalty": {{ "riskLevel": "None" | "Low" | "Medium" | "High", "description": "<exposure>" }},
  "ethicalMarketing": {{ "score": <integer 0-100>, "assessment": "<assessment>" }},
  "violations": [
    {{
      "severity": "CRITICAL" | "HIGH" | "MEDIUM" | "LOW",
      "regulation": "<regulation name, in English>",
      "violation_title": "<short title>",
      "evidence": "<verbatim quote from the content, in its source language>",
      "translation": "<English rendering of the evidence>",
      "guidance": ["<actionable point>", "<actionable point>"],
      "fix": ["<complete compliant rewrite>", "<complete compliant rewrite>"],
      "risk_score": <integer 0-100>
    }}
  ]
}}

Mandatory output rules:
- Every violation must carry at least 2 guidance points and at least 2 complete compliant rewrites.
- "evidence" must be quoted verbatim from the content.
- All user-visible strings (violation_title, guidance, fix, summary) must be written in the content's source language, EXCEPT regulation names, which always stay in English.
- If the content is metadata-only or very short, audit it best-effort and say so in the summary.
- Do not wrap the JSON in Markdown fences or add commentary."#
    );

    p
}

/// Translation prompt lives in `crate::translate`; this module only owns
/// the audit-call templates.
pub fn audit_user_prompt(content: &str) -> String {
    format!("Content to audit:\n\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticRules;
    use crate::traits::RuleRepository;
    use crate::types::{ContentFormat, Language, SourceType};

    fn meta() -> ContentMetadata {
        ContentMetadata {
            source_type: SourceType::Blog,
            content_format: ContentFormat::Article,
            language: Language::Hi,
            extraction_method: "readability_local".to_string(),
        }
    }

    #[tokio::test]
    async fn prompt_carries_rules_jurisdiction_and_schema() {
        let rules = StaticRules::healthcare()
            .load("India", None, "healthcare")
            .await
            .unwrap();
        let options = crate::types::AuditOptions::new("u", "healthcare");
        let prompt = audit_system_prompt(&rules, &options, &meta(), false);

        assert!(prompt.contains("healthcare industry in India"));
        assert!(prompt.contains("1. Drugs and Magic Remedies Act, 1954, Section 4"));
        assert!(prompt.contains("2. ASCI Code"));
        assert!(prompt.contains("\"violations\""));
        assert!(prompt.contains("at least 2 complete compliant rewrites"));
        assert!(prompt.contains("language: hi"));
        assert!(!prompt.contains("IMPORTANT: carefully analyze"));
    }

    #[tokio::test]
    async fn strict_variant_adds_the_reanalysis_instruction() {
        let rules = StaticRules::healthcare()
            .load("India", None, "healthcare")
            .await
            .unwrap();
        let options = crate::types::AuditOptions::new("u", "healthcare");
        let prompt = audit_system_prompt(&rules, &options, &meta(), true);
        assert!(prompt.contains("carefully analyze and detect ANY misleading"));
    }

    #[test]
    fn empty_pack_degrades_gracefully() {
        let options = crate::types::AuditOptions::new("u", "retail");
        let prompt = audit_system_prompt(&RulePack::default(), &options, &meta(), false);
        assert!(prompt.contains("no rule pack loaded"));
    }

    #[test]
    fn rule_count_is_capped() {
        let rules: Vec<_> = (0..80)
            .map(|i| crate::types::Rule {
                id: format!("r{i}"),
                regulation: "Act".to_string(),
                section: None,
                title: format!("rule number {i}"),
                jurisdiction_path: String::new(),
            })
            .collect();
        let pack = RulePack::new(rules);
        let options = crate::types::AuditOptions::new("u", "retail");
        let prompt = audit_system_prompt(&pack, &options, &meta(), false);
        assert!(prompt.contains("50. Act"));
        assert!(!prompt.contains("51. Act"));
    }
}
