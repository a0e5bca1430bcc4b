use crate::registry::TrustTier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Budget applied to a secondary tool when no policy names one.
pub const DEFAULT_SECONDARY_BUDGET_USD: f64 = 0.10;

const DEFAULT_METERED_TOOLS: &[&str] = &["http", "fetch", "playwright", "lighthouse", "latency-sampler"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TierPolicy {
    #[serde(default)]
    pub default_budget_usd: Option<f64>,
    #[serde(default)]
    pub budget_overrides: HashMap<String, f64>,
}

/// Size-proportional spend estimate for metered tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostModel {
    pub base_usd: f64,
    pub per_byte_usd: f64,
    pub ceiling_usd: f64,
    pub metered_tools: Vec<String>,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base_usd: 0.001,
            per_byte_usd: 0.000_001,
            ceiling_usd: 0.01,
            metered_tools: DEFAULT_METERED_TOOLS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl CostModel {
    pub fn is_metered(&self, tool_id: &str) -> bool {
        self.metered_tools.iter().any(|t| t == tool_id)
    }

    /// Estimate for a payload of `size_bytes`, clamped to `ceiling_usd`.
    /// Unmetered tools cost nothing.
    pub fn estimate(&self, tool_id: &str, size_bytes: usize) -> f64 {
        if !self.is_metered(tool_id) {
            return 0.0;
        }
        let raw = self.base_usd + size_bytes as f64 * self.per_byte_usd;
        raw.min(self.ceiling_usd).max(0.0)
    }
}

/// Per-tier default budgets and per-tool overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyTable {
    #[serde(default)]
    pub tiers: HashMap<TrustTier, TierPolicy>,
    #[serde(default)]
    pub cost: CostModel,
}

impl PolicyTable {
    /// Tool-specific override, then the tier default, then the built-in default.
    pub fn budget_for(&self, tier: TrustTier, tool_id: &str) -> f64 {
        self.tiers
            .get(&tier)
            .and_then(|policy| {
                policy
                    .budget_overrides
                    .get(tool_id)
                    .copied()
                    .or(policy.default_budget_usd)
            })
            .unwrap_or(DEFAULT_SECONDARY_BUDGET_USD)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_resolution_order() {
        let yaml = r#"
tiers:
  secondary:
    default_budget_usd: 0.25
    budget_overrides:
      playwright: 1.5
"#;
        let table: PolicyTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.budget_for(TrustTier::Secondary, "playwright"), 1.5);
        assert_eq!(table.budget_for(TrustTier::Secondary, "http"), 0.25);
        assert_eq!(table.budget_for(TrustTier::Primary, "http"), DEFAULT_SECONDARY_BUDGET_USD);
    }

    #[test]
    fn test_empty_table_uses_defaults() {
        let table = PolicyTable::default();
        assert_eq!(table.budget_for(TrustTier::Secondary, "http"), DEFAULT_SECONDARY_BUDGET_USD);
        assert_eq!(table.cost, CostModel::default());
    }

    #[test]
    fn test_cost_model_clamps_to_ceiling() {
        let model = CostModel::default();
        assert!((model.estimate("http", 100) - 0.0011).abs() < 1e-12);
        assert_eq!(model.estimate("http", 50_000_000), 0.01);
        assert_eq!(model.estimate("write", 100), 0.0);
    }

    #[test]
    fn test_partial_cost_section_keeps_defaults() {
        let table: PolicyTable = serde_yaml::from_str("cost:\n  ceiling_usd: 0.5\n").unwrap();
        assert_eq!(table.cost.ceiling_usd, 0.5);
        assert_eq!(table.cost.base_usd, 0.001);
        assert!(table.cost.is_metered("fetch"));
    }
}
