//! File-backed rule repository.
//!
//! Rule packs are read-only JSON arrays grouped by directory:
//!
//! ```text
//! {root}/{country}/common/*.json
//! {root}/{country}/{category}/*.json
//! {root}/gcc/{region}/common/*.json        (extra region level for GCC)
//! {root}/gcc/{region}/{category}/*.json
//! ```
//!
//! Packs are loaded lazily on first request and cached for the process
//! lifetime; the files never change while the server runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::traits::{RuleRepository, ServiceError};
use crate::types::{Rule, RulePack};

/// Rule repository reading JSON packs from a directory tree.
pub struct FsRuleRepository {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<String, RulePack>>>,
}

impl FsRuleRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cache_key(country: &str, region: Option<&str>, category: &str) -> String {
        format!(
            "{}/{}/{}",
            country.to_ascii_lowercase(),
            region.unwrap_or("-").to_ascii_lowercase(),
            category.to_ascii_lowercase()
        )
    }

    /// Directory holding this jurisdiction's packs. GCC packs carry an
    /// extra region level; a missing region falls back to the country root.
    fn jurisdiction_dir(&self, country: &str, region: Option<&str>) -> PathBuf {
        let country = country.to_ascii_lowercase();
        match region {
            Some(region) if country == "gcc" => {
                self.root.join(&country).join(region.to_ascii_lowercase())
            }
            _ => self.root.join(&country),
        }
    }

    async fn read_pack_dir(dir: &Path, jurisdiction_path: &str) -> Vec<Rule> {
        let mut files = match tokio::fs::read_dir(dir).await {
            Ok(rd) => {
                let mut names = Vec::new();
                let mut rd = rd;
                while let Ok(Some(ent)) = rd.next_entry().await {
                    let path = ent.path();
                    if path.extension().and_then(|e| e.to_str()) == Some("json") {
                        names.push(path);
                    }
                }
                names
            }
            Err(_) => return Vec::new(),
        };
        // Deterministic pack order regardless of directory iteration order.
        files.sort();

        let mut rules = Vec::new();
        for path in files {
            let bytes = match tokio::fs::read(&path).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read rule file");
                    continue;
                }
            };
            match serde_json::from_slice::<Vec<Rule>>(&bytes) {
                Ok(mut file_rules) => {
                    for rule in &mut file_rules {
                        if rule.jurisdiction_path.is_empty() {
                            rule.jurisdiction_path = jurisdiction_path.to_string();
                        }
                    }
                    rules.extend(file_rules);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "rule file is not a JSON rule array");
                }
            }
        }
        rules
    }

    async fn load_uncached(
        &self,
        country: &str,
        region: Option<&str>,
        category: &str,
    ) -> RulePack {
        let base = self.jurisdiction_dir(country, region);
        let path_tag = |leaf: &str| {
            let mut tag = country.to_ascii_lowercase();
            if let Some(r) = region {
                if country.eq_ignore_ascii_case("gcc") {
                    tag.push('/');
                    tag.push_str(&r.to_ascii_lowercase());
                }
            }
            tag.push('/');
            tag.push_str(leaf);
            tag
        };

        let mut rules =
            Self::read_pack_dir(&base.join("common"), &path_tag("common")).await;
        let category_dir = category.to_ascii_lowercase();
        rules.extend(
            Self::read_pack_dir(&base.join(&category_dir), &path_tag(&category_dir)).await,
        );

        debug!(
            country = %country,
            region = region.unwrap_or("-"),
            category = %category,
            rule_count = rules.len(),
            "rule pack loaded"
        );
        RulePack::new(rules)
    }
}

#[async_trait]
impl RuleRepository for FsRuleRepository {
    async fn load(
        &self,
        country: &str,
        region: Option<&str>,
        category: &str,
    ) -> Result<RulePack, ServiceError> {
        let key = Self::cache_key(country, region, category);
        if let Some(pack) = self.cache.read().await.get(&key) {
            return Ok(pack.clone());
        }

        let pack = self.load_uncached(country, region, category).await;
        self.cache.write().await.insert(key, pack.clone());
        Ok(pack)
    }
}
