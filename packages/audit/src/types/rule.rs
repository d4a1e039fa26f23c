//! Regulatory rules and rule packs.

use serde::{Deserialize, Serialize};

/// One regulatory rule, loaded read-only from the pack files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,

    /// Regulation name, e.g. "Drugs and Magic Remedies Act, 1954".
    pub regulation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    pub title: String,

    /// Where the rule came from, e.g. "india/healthcare".
    #[serde(default)]
    pub jurisdiction_path: String,
}

/// Ordered rule list for one (country, region, category) selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulePack {
    pub rules: Vec<Rule>,
}

impl RulePack {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// The leading rules rendered into the prompt; the pack may hold more
    /// than the reasoner should see.
    pub fn top(&self, k: usize) -> &[Rule] {
        &self.rules[..self.rules.len().min(k)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> Rule {
        Rule {
            id: id.to_string(),
            regulation: "Test Act".to_string(),
            section: None,
            title: format!("rule {id}"),
            jurisdiction_path: "india/common".to_string(),
        }
    }

    #[test]
    fn top_is_bounded() {
        let pack = RulePack::new(vec![rule("a"), rule("b"), rule("c")]);
        assert_eq!(pack.top(2).len(), 2);
        assert_eq!(pack.top(50).len(), 3);
        assert_eq!(pack.top(0).len(), 0);
    }

    #[test]
    fn deserializes_minimal_rule_object() {
        let json = r#"{"id": "dmr-1", "regulation": "DMR Act", "title": "No cure claims"}"#;
        let r: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(r.id, "dmr-1");
        assert!(r.section.is_none());
        assert!(r.jurisdiction_path.is_empty());
    }
}
