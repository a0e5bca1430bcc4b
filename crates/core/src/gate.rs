use crate::config::GateConfig;
use crate::decision::{Decision, SkipReason};
use crate::engine::AdmissionEngine;
use crate::error::GateError;
use crate::project::ProjectLayout;
use crate::record::PreToolRecord;
use crate::request::{HookInput, ToolRequest};
use hookgate_audit::AuditLog;
use hookgate_policy::{PolicyData, TrustTier};
use hookgate_store::{session_or_unknown, CircuitBreaker, FileLedgerStore, UNKNOWN_SESSION};
use serde::Serialize;
use std::collections::BTreeSet;

/// What the host is told to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    /// Refuse the call; the reason goes to the diagnostic channel.
    Block(String),
    /// The gate failed and the call proceeds anyway.
    InternalError(String),
}

impl Verdict {
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Proceed => 0,
            Verdict::Block(_) => 2,
            Verdict::InternalError(_) => 1,
        }
    }
}

/// Outermost boundary of one hook invocation.
///
/// Every failure below this point is converted into `Verdict::InternalError`
/// and counted against the circuit breaker. Nothing here blocks on failure.
pub struct Gate {
    layout: ProjectLayout,
    config: GateConfig,
}

impl Gate {
    pub fn new(layout: ProjectLayout, config: GateConfig) -> Self {
        Self { layout, config }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(self.layout.breaker_sentinel(), self.layout.session_dir())
            .with_threshold(self.config.trip_threshold)
    }

    pub fn ledger(&self) -> FileLedgerStore {
        FileLedgerStore::new(self.layout.ledger_dir())
    }

    /// Admission decision for a `PreToolUse` payload.
    pub fn pre_tool(&self, raw: &str) -> Verdict {
        let parsed = HookInput::parse(raw);

        if self.breaker().is_tripped() {
            return self.pass_tripped(parsed.ok());
        }

        let input = match parsed {
            Ok(input) => input,
            Err(e) => return self.fail_open("", None, e),
        };
        let tool = input.tool_id();
        let session_id = input.session_id();

        match self.evaluate(input) {
            Ok((request, decision)) => {
                self.audit(&PreToolRecord::from_decision(&decision, &request, &self.config));
                match (decision.allow, decision.reason) {
                    (false, reason) => Verdict::Block(reason.unwrap_or_default()),
                    (true, Some(reason)) => {
                        tracing::warn!("Allowed {} in warn mode: {}", request.tool_id, reason);
                        Verdict::Proceed
                    }
                    (true, None) => Verdict::Proceed,
                }
            }
            Err(e) => self.fail_open(&tool, session_id.as_deref(), e),
        }
    }

    fn evaluate(&self, input: HookInput) -> Result<(ToolRequest, Decision), GateError> {
        let request = input.into_request(&self.config.agent)?;
        let policy = PolicyData::load(self.layout.root());
        let ledger = self.ledger();
        let breaker = self.breaker();
        let engine = AdmissionEngine::new(&self.config, &policy, &ledger, &breaker, self.layout.root());
        let decision = engine.evaluate(&request)?;
        Ok((request, decision))
    }

    /// Degraded mode: nothing that can fail runs, the only trace is the
    /// audit line.
    fn pass_tripped(&self, input: Option<HookInput>) -> Verdict {
        let input = input.unwrap_or_default();
        let request = ToolRequest {
            tool_id: input.tool_id(),
            params: input.params().unwrap_or_default(),
            session_id: input.session_id(),
            agent: self.config.agent.clone(),
        };
        let decision = Decision::pending(TrustTier::Unknown, BTreeSet::new(), self.config.mode)
            .skip(SkipReason::BreakerTripped);
        self.audit(&PreToolRecord::from_decision(&decision, &request, &self.config));
        Verdict::Proceed
    }

    fn fail_open(&self, tool: &str, session_id: Option<&str>, error: GateError) -> Verdict {
        tracing::warn!("Gate error, allowing {}: {}", tool, error);
        let message = error.to_string();
        let tripped = self.record_failure(session_id);
        self.audit(&PreToolRecord::from_error(tool, session_id, &self.config, &message, tripped));
        Verdict::InternalError(message)
    }

    /// Count one internal error and trip the breaker once the threshold is
    /// met. Returns whether the breaker is now tripped.
    pub fn record_failure(&self, session_id: Option<&str>) -> bool {
        let breaker = self.breaker();
        let session = session_or_unknown(session_id);
        let should_trip = breaker
            .record_error(session)
            .or_else(|_| breaker.record_error(UNKNOWN_SESSION));

        match should_trip {
            Ok(true) => match breaker.trip() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to trip circuit breaker: {}", e);
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                tracing::warn!("Failed to record gate error: {}", e);
                false
            }
        }
    }

    pub(crate) fn append<T: Serialize>(&self, record: &T) -> Result<(), GateError> {
        AuditLog::new(self.layout.log_path())?.append(record)?;
        Ok(())
    }

    /// Best-effort append to the audit log.
    pub(crate) fn audit<T: Serialize>(&self, record: &T) {
        if let Err(e) = self.append(record) {
            tracing::warn!("Failed to write audit record: {}", e);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn gate(temp: &TempDir, vars: &[(&str, &str)]) -> Gate {
        let layout = ProjectLayout::new(temp.path());
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = GateConfig::from_lookup(&layout, |k| vars.get(k).cloned());
        Gate::new(layout, config)
    }

    fn audit_lines(temp: &TempDir) -> Vec<serde_json::Value> {
        fs::read_to_string(temp.path().join("runs/observability/hooks.jsonl"))
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Verdict::Proceed.exit_code(), 0);
        assert_eq!(Verdict::Block("x".into()).exit_code(), 2);
        assert_eq!(Verdict::InternalError("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_block_writes_audit_record() {
        let temp = TempDir::new().unwrap();
        let gate = gate(&temp, &[("HOOKS_MODE", "block"), ("AUV_ID", "AUV-9")]);
        let verdict = gate.pre_tool(
            r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf /"},"session_id":"s1"}"#,
        );
        assert!(matches!(verdict, Verdict::Block(ref reason) if reason.contains("Dangerous shell pattern")));

        let lines = audit_lines(&temp);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["blocked"], true);
        assert_eq!(lines[0]["checks"]["shell"], true);
        assert_eq!(lines[0]["auv"], "AUV-9");
    }

    #[test]
    fn test_malformed_input_fails_open_and_counts() {
        let temp = TempDir::new().unwrap();
        let gate = gate(&temp, &[("HOOKS_MODE", "block"), ("AUV_ID", "AUV-9")]);
        let verdict = gate.pre_tool("not json");
        assert_eq!(verdict.exit_code(), 1);
        assert_eq!(gate.breaker().error_count(UNKNOWN_SESSION).unwrap(), 1);
        assert_eq!(audit_lines(&temp)[0]["breaker_tripped"], false);
    }

    #[test]
    fn test_invalid_session_id_counts_under_unknown() {
        let temp = TempDir::new().unwrap();
        let gate = gate(
            &temp,
            &[("HOOKS_MODE", "block"), ("AUV_ID", "AUV-9"), ("HOOKS_ERROR_TRIP", "1")],
        );
        fs::create_dir_all(temp.path().join("mcp")).unwrap();
        fs::write(
            temp.path().join("mcp/registry.yaml"),
            "tools:\n  http_fetch: { tier: secondary, cost_usd: 0.01 }\n",
        )
        .unwrap();
        fs::create_dir_all(temp.path().join(".claude")).unwrap();
        fs::write(temp.path().join(".claude/secondary_consent.txt"), "ok").unwrap();

        let verdict = gate.pre_tool(r#"{"tool_name":"http_fetch","session_id":"../escape"}"#);
        assert_eq!(verdict.exit_code(), 1);
        assert!(gate.breaker().is_tripped());
    }

    #[test]
    fn test_tripped_gate_skips_even_unparseable_input() {
        let temp = TempDir::new().unwrap();
        let gate = gate(&temp, &[("HOOKS_MODE", "block"), ("AUV_ID", "AUV-9")]);
        gate.breaker().trip().unwrap();

        assert_eq!(gate.pre_tool("garbage"), Verdict::Proceed);
        assert_eq!(
            gate.pre_tool(r#"{"tool_name":"Bash","tool_input":{"command":"sudo reboot"}}"#),
            Verdict::Proceed
        );
        let lines = audit_lines(&temp);
        assert!(lines.iter().all(|l| l["skipped"] == "breaker_tripped"));
        assert_eq!(gate.breaker().error_count(UNKNOWN_SESSION).unwrap(), 0);
    }
}
