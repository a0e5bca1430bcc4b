use crate::config::{GateConfig, GateMode};
use crate::decision::{CheckBreakdown, Decision, SkipReason};
use crate::request::ToolRequest;
use chrono::{DateTime, Utc};
use hookgate_audit::{EventKind, HookContext};
use hookgate_policy::TrustTier;
use serde::Serialize;
use serde_json::{Map, Value};

/// Audit line for one `PreToolUse` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct PreToolRecord {
    pub ts: DateTime<Utc>,
    pub event: EventKind,
    #[serde(flatten)]
    pub context: HookContext,
    pub tool: String,
    pub blocked: bool,
    pub warned: bool,
    pub reason: Option<String>,
    pub est_cost: f64,
    pub tier: TrustTier,
    pub secondary: bool,
    pub side_effects: Vec<String>,
    pub enrichments: Option<Map<String, Value>>,
    pub params_keys: Vec<String>,
    pub mode: GateMode,
    pub checks: CheckBreakdown,
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaker_tripped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreToolRecord {
    pub fn from_decision(decision: &Decision, request: &ToolRequest, config: &GateConfig) -> Self {
        Self {
            ts: Utc::now(),
            event: EventKind::PreToolUse,
            context: config.context(request.session_id.as_deref()),
            tool: request.tool_id.clone(),
            blocked: decision.is_deny(),
            warned: decision.warned(),
            reason: decision.reason.clone(),
            est_cost: round6(decision.estimated_cost),
            tier: decision.tier,
            secondary: decision.tier.is_secondary(),
            side_effects: decision.side_effects.iter().cloned().collect(),
            enrichments: decision.enrichments.clone(),
            params_keys: request.param_keys(),
            mode: decision.mode,
            checks: decision.checks,
            skipped: decision.skipped,
            breaker_tripped: None,
            error: None,
        }
    }

    /// Record for an evaluation that failed and was let through.
    pub fn from_error(
        tool: &str,
        session_id: Option<&str>,
        config: &GateConfig,
        error: &str,
        breaker_tripped: bool,
    ) -> Self {
        Self {
            ts: Utc::now(),
            event: EventKind::PreToolUse,
            context: config.context(session_id),
            tool: tool.to_string(),
            blocked: false,
            warned: false,
            reason: None,
            est_cost: 0.0,
            tier: TrustTier::Unknown,
            secondary: false,
            side_effects: Vec::new(),
            enrichments: None,
            params_keys: Vec::new(),
            mode: config.mode,
            checks: CheckBreakdown::default(),
            skipped: None,
            breaker_tripped: Some(breaker_tripped),
            error: Some(error.to_string()),
        }
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
