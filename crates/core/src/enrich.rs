use crate::config::GateConfig;
use crate::request::ToolRequest;
use hookgate_sandbox::{Params, ToolKind};
use serde_json::json;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Advisory parameter defaults for HTTP-like tools. The caller may ignore
/// them; they never change the decision.
pub fn enrichments(request: &ToolRequest, config: &GateConfig) -> Option<Params> {
    if ToolKind::classify(&request.tool_id) != ToolKind::Http {
        return None;
    }

    let mut hints = Params::new();
    if !request.params.contains_key("timeout") {
        hints.insert("timeout".to_string(), json!(DEFAULT_TIMEOUT_MS));
    }
    if !request.params.contains_key("headers") && config.api_base.is_some() {
        hints.insert("headers".to_string(), json!({"Accept": "application/json"}));
    }

    if hints.is_empty() {
        None
    } else {
        Some(hints)
    }
}
