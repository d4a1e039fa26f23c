//! Model routing.
//!
//! Selects the reasoner model and generation parameters for one audit. A
//! single default model is always acceptable; deployments can add a light
//! model for short inputs, a heavy model for long or claim-dense inputs,
//! and a fallback tried once when the selected model fails.

use serde::{Deserialize, Serialize};

use crate::reduce;
use crate::traits::GenerationConfig;

/// Claim markers at or above this count mark an input as complex.
const COMPLEXITY_MARKERS: usize = 12;

/// A routed model choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelChoice {
    pub model: String,
    pub config: GenerationConfig,
}

/// Routing table: which model serves which inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRouter {
    /// Served when no tier matches.
    pub default_model: String,

    /// Served for inputs under the short threshold, when set.
    pub light_model: Option<String>,

    /// Served for long or complex inputs, when set.
    pub heavy_model: Option<String>,

    /// Tried once when the routed model fails.
    pub fallback_model: Option<String>,

    pub short_threshold: usize,
    pub long_threshold: usize,
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self {
            default_model: "gemini-2.0-flash".to_string(),
            light_model: None,
            heavy_model: None,
            fallback_model: Some("gemini-1.5-flash".to_string()),
            short_threshold: 3_000,
            long_threshold: 10_000,
        }
    }
}

impl ModelRouter {
    /// Single-model deployment: no tiers, no fallback.
    pub fn single(model: impl Into<String>) -> Self {
        Self {
            default_model: model.into(),
            light_model: None,
            heavy_model: None,
            fallback_model: None,
            short_threshold: 3_000,
            long_threshold: 10_000,
        }
    }

    pub fn with_light(mut self, model: impl Into<String>) -> Self {
        self.light_model = Some(model.into());
        self
    }

    pub fn with_heavy(mut self, model: impl Into<String>) -> Self {
        self.heavy_model = Some(model.into());
        self
    }

    pub fn with_fallback(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    pub fn with_thresholds(mut self, short: usize, long: usize) -> Self {
        self.short_threshold = short;
        self.long_threshold = long;
        self
    }

    /// Route one input. Length tiers first, then the complexity predicate
    /// can promote a mid-length input to the heavy model.
    pub fn select(&self, content: &str) -> ModelChoice {
        let chars = content.chars().count();

        if chars >= self.long_threshold || self.is_complex(content) {
            if let Some(heavy) = &self.heavy_model {
                return ModelChoice {
                    model: heavy.clone(),
                    config: GenerationConfig::default().with_max_output_tokens(8_192),
                };
            }
        }
        if chars < self.short_threshold {
            if let Some(light) = &self.light_model {
                return ModelChoice {
                    model: light.clone(),
                    config: GenerationConfig::default().with_max_output_tokens(2_048),
                };
            }
        }

        ModelChoice {
            model: self.default_model.clone(),
            config: GenerationConfig::default().with_max_output_tokens(4_096),
        }
    }

    /// The fallback choice, when configured and distinct from `used`.
    pub fn fallback(&self, used: &str) -> Option<ModelChoice> {
        let fallback = self.fallback_model.as_deref()?;
        if fallback == used {
            return None;
        }
        Some(ModelChoice {
            model: fallback.to_string(),
            config: GenerationConfig::default().with_max_output_tokens(4_096),
        })
    }

    fn is_complex(&self, content: &str) -> bool {
        reduce::claim_marker_count(content) >= COMPLEXITY_MARKERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ModelRouter {
        ModelRouter::default()
            .with_light("light-model")
            .with_heavy("heavy-model")
            .with_fallback("fallback-model")
    }

    #[test]
    fn short_inputs_route_light() {
        let choice = router().select("A short advert line.");
        assert_eq!(choice.model, "light-model");
        assert_eq!(choice.config.max_output_tokens, 2_048);
        assert_eq!(choice.config.temperature, 0.0);
    }

    #[test]
    fn long_inputs_route_heavy() {
        let long = "word ".repeat(2_500);
        let choice = router().select(&long);
        assert_eq!(choice.model, "heavy-model");
        assert_eq!(choice.config.max_output_tokens, 8_192);
    }

    #[test]
    fn mid_length_routes_default() {
        let mid = "plain sentence without assertions here. ".repeat(100);
        let choice = router().select(&mid);
        assert_eq!(choice.model, "gemini-2.0-flash");
        assert_eq!(choice.config.max_output_tokens, 4_096);
    }

    #[test]
    fn claim_dense_input_promotes_to_heavy() {
        let dense = "This medicine cures and heals and prevents disease, works better and faster, 90% effective in 7 days. ".repeat(4);
        assert!(dense.chars().count() < 10_000);
        let choice = router().select(&dense);
        assert_eq!(choice.model, "heavy-model");
    }

    #[test]
    fn single_model_deployment_has_no_tiers() {
        let single = ModelRouter::single("only-model");
        let long = "word ".repeat(5_000);
        assert_eq!(single.select(&long).model, "only-model");
        assert_eq!(single.select("short").model, "only-model");
        assert!(single.fallback("only-model").is_none());
    }

    #[test]
    fn fallback_never_repeats_the_failed_model() {
        let r = ModelRouter::default(); // fallback gemini-1.5-flash
        assert!(r.fallback("gemini-2.0-flash").is_some());
        assert!(r.fallback("gemini-1.5-flash").is_none());
    }
}
