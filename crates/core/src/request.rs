use crate::error::GateError;
use hookgate_sandbox::Params;
use hookgate_store::session_or_unknown;
use serde::Deserialize;
use serde_json::Value;

/// One proposed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub tool_id: String,
    pub params: Params,
    pub session_id: Option<String>,
    pub agent: String,
}

impl ToolRequest {
    pub fn new(tool_id: impl Into<String>, params: Params) -> Self {
        Self {
            tool_id: tool_id.into(),
            params,
            session_id: None,
            agent: "unknown".to_string(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Ledger key; requests without a session share `unknown`.
    pub fn session_key(&self) -> &str {
        session_or_unknown(self.session_id.as_deref())
    }

    pub fn param_keys(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }
}

/// Raw hook payload as the host sends it. Field names vary between hosts,
/// so every logical field has aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookInput {
    tool_name: Option<Value>,
    tool: Option<Value>,
    name: Option<Value>,
    tool_input: Option<Value>,
    parameters: Option<Value>,
    input: Option<Value>,
    session_id: Option<Value>,
    conversation_id: Option<Value>,
    request_id: Option<Value>,
    tool_response: Option<Value>,
}

impl HookInput {
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        if raw.trim().is_empty() {
            return Err(GateError::MalformedRequest("empty hook payload".to_string()));
        }
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(GateError::MalformedRequest(
                "hook payload is not a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Like `parse`, but an empty payload is the empty object.
    pub fn parse_or_default(raw: &str) -> Result<Self, GateError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::parse(raw)
    }

    pub fn tool_id(&self) -> String {
        first_text(&[&self.tool_name, &self.tool, &self.name]).unwrap_or_default()
    }

    pub fn session_id(&self) -> Option<String> {
        first_text(&[&self.session_id, &self.conversation_id, &self.request_id])
    }

    /// First non-empty parameter alias, whatever its shape.
    pub fn params_value(&self) -> Option<&Value> {
        [&self.tool_input, &self.parameters, &self.input]
            .into_iter()
            .flatten()
            .find(|v| !is_empty_value(v))
    }

    /// Parameters of the call; absent parameters are the empty map.
    pub fn params(&self) -> Result<Params, GateError> {
        match self.params_value() {
            None => Ok(Params::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(GateError::MalformedRequest(format!(
                "tool parameters must be an object, got {}",
                type_name(other)
            ))),
        }
    }

    pub fn tool_response(&self) -> Option<&Value> {
        self.tool_response.as_ref().filter(|v| !v.is_null())
    }

    pub fn into_request(self, agent: &str) -> Result<ToolRequest, GateError> {
        Ok(ToolRequest {
            tool_id: self.tool_id(),
            params: self.params()?,
            session_id: self.session_id(),
            agent: agent.to_string(),
        })
    }
}

/// First alias holding a non-empty string (numbers are accepted as text).
fn first_text(candidates: &[&Option<Value>]) -> Option<String> {
    candidates.iter().find_map(|candidate| match candidate {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_field_names() {
        let input = HookInput::parse(
            r#"{"tool_name":"Bash","tool_input":{"command":"ls"},"session_id":"s1"}"#,
        )
        .unwrap();
        let request = input.into_request("builder").unwrap();
        assert_eq!(request.tool_id, "Bash");
        assert_eq!(request.params["command"], "ls");
        assert_eq!(request.session_key(), "s1");
        assert_eq!(request.agent, "builder");
    }

    #[test]
    fn test_aliases() {
        let input =
            HookInput::parse(r#"{"name":"fetch","parameters":{"url":"http://x"},"conversation_id":"c9"}"#)
                .unwrap();
        assert_eq!(input.tool_id(), "fetch");
        assert_eq!(input.session_id().as_deref(), Some("c9"));
        assert_eq!(input.params().unwrap()["url"], "http://x");

        let input = HookInput::parse(r#"{"tool":"","name":"Write","input":{"path":"a"},"request_id":42}"#)
            .unwrap();
        assert_eq!(input.tool_id(), "Write");
        assert_eq!(input.session_id().as_deref(), Some("42"));
    }

    #[test]
    fn test_empty_first_alias_falls_through() {
        let input = HookInput::parse(r#"{"tool_input":{},"parameters":{"k":1}}"#).unwrap();
        assert_eq!(input.params().unwrap()["k"], 1);
    }

    #[test]
    fn test_missing_fields_default() {
        let request = HookInput::parse("{}").unwrap().into_request("a").unwrap();
        assert_eq!(request.tool_id, "");
        assert!(request.params.is_empty());
        assert_eq!(request.session_key(), "unknown");
    }

    #[test]
    fn test_parse_or_default_accepts_empty() {
        let input = HookInput::parse_or_default("").unwrap();
        assert!(input.session_id().is_none());
        assert!(HookInput::parse_or_default("[]").is_err());
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(HookInput::parse(""), Err(GateError::MalformedRequest(_))));
        assert!(matches!(HookInput::parse("  \n"), Err(GateError::MalformedRequest(_))));
        assert!(matches!(HookInput::parse("[1,2]"), Err(GateError::MalformedRequest(_))));
        assert!(matches!(HookInput::parse("{nope"), Err(GateError::Json(_))));

        let input = HookInput::parse(r#"{"tool_name":"Bash","tool_input":"rm -rf /"}"#).unwrap();
        assert!(matches!(input.params(), Err(GateError::MalformedRequest(_))));
    }
}
