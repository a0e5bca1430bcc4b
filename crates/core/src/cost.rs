use crate::error::GateError;
use hookgate_policy::PolicyData;
use hookgate_sandbox::Params;

/// Size assumed for a call with no parameters.
const EMPTY_PARAMS_SIZE: usize = 100;

/// Estimated spend for one call: the registry's fixed per-call figure when
/// present, else the size-based model for metered tools, else zero.
pub fn estimate_cost(policy: &PolicyData, tool_id: &str, params: &Params) -> Result<f64, GateError> {
    if let Some(fixed) = policy.entry(tool_id).and_then(|entry| entry.cost_usd) {
        return Ok(if fixed.is_finite() { fixed.max(0.0) } else { 0.0 });
    }

    let model = policy.cost_model();
    if !model.is_metered(tool_id) {
        return Ok(0.0);
    }
    let size = if params.is_empty() {
        EMPTY_PARAMS_SIZE
    } else {
        serde_json::to_vec(params)?.len()
    };
    Ok(model.estimate(tool_id, size))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use hookgate_policy::{Registry, ToolEntry, TrustTier};
    use proptest::prelude::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_registry_override_wins() {
        let mut registry = Registry::default();
        registry.insert(
            "http",
            ToolEntry {
                tier: TrustTier::Secondary,
                side_effects: vec![],
                cost_usd: Some(0.03),
            },
        );
        let policy = PolicyData::new(Some(registry), None);
        let cost = estimate_cost(&policy, "http", &params(json!({"url": "http://x"}))).unwrap();
        assert_eq!(cost, 0.03);
    }

    #[test]
    fn test_metered_tool_uses_size() {
        let policy = PolicyData::default();
        let empty = estimate_cost(&policy, "fetch", &Params::new()).unwrap();
        assert!((empty - (0.001 + 100.0 * 0.000_001)).abs() < 1e-12);

        let big = params(json!({"body": "x".repeat(100_000)}));
        assert_eq!(estimate_cost(&policy, "fetch", &big).unwrap(), 0.01);
    }

    #[test]
    fn test_unmetered_tool_is_free() {
        let policy = PolicyData::default();
        assert_eq!(estimate_cost(&policy, "Bash", &params(json!({"command": "ls"}))).unwrap(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_estimate_is_clamped(body in ".{0,4000}") {
            let policy = PolicyData::default();
            let cost = estimate_cost(&policy, "http", &params(json!({"body": body}))).unwrap();
            prop_assert!(cost > 0.0);
            prop_assert!(cost <= 0.01);
        }
    }
}
