#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use hookgate_core::{Gate, GateConfig, ProjectLayout, Verdict};
use hookgate_store::{FileLedgerStore, LedgerStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn gate(root: &Path, vars: &[(&str, &str)]) -> Gate {
    let layout = ProjectLayout::new(root);
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = GateConfig::from_lookup(&layout, |k| env.get(k).cloned());
    Gate::new(layout, config)
}

fn audit_lines(root: &Path) -> Vec<Value> {
    fs::read_to_string(root.join("runs/observability/hooks.jsonl"))
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn post(gate: &Gate, session: &str, tool: &str, response: Value) {
    let raw = json!({
        "tool_name": tool,
        "tool_input": {"command": "x"},
        "tool_response": response,
        "session_id": session,
    });
    assert_eq!(gate.post_tool(&raw.to_string()), Verdict::Proceed);
}

#[test]
fn test_session_start_resets_ledger_and_snapshots_env() {
    let temp = TempDir::new().unwrap();
    let ledger = FileLedgerStore::new(temp.path().join("runs/observability/ledgers"));
    ledger.commit_charge("s1", 0.07, 1.0).unwrap();

    let gate = gate(temp.path(), &[("STAGING_URL", "https://staging.example.com")]);
    assert_eq!(gate.session_start(r#"{"session_id":"s1"}"#), Verdict::Proceed);

    assert_eq!(ledger.load("s1").unwrap().accumulated_cost, 0.0);
    let record = &audit_lines(temp.path())[0];
    assert_eq!(record["event"], "SessionStart");
    assert_eq!(record["env"]["STAGING_URL"], "https://staging.example.com");
    assert!(record["env"]["API_BASE"].is_null());
    assert!(temp.path().join(".claude/session/s1.offset.json").exists());
}

#[test]
fn test_session_start_offset_is_log_length_before_its_record() {
    let temp = TempDir::new().unwrap();
    let gate = gate(temp.path(), &[]);
    post(&gate, "s0", "Bash", json!("ok"));
    let before = fs::metadata(temp.path().join("runs/observability/hooks.jsonl")).unwrap().len();

    gate.session_start(r#"{"session_id":"s1"}"#);
    let offset = fs::read_to_string(temp.path().join(".claude/session/s1.offset.json")).unwrap();
    let offset: Value = serde_json::from_str(&offset).unwrap();
    assert_eq!(offset["size"], before);
}

#[test]
fn test_post_tool_redacts_and_classifies() {
    let temp = TempDir::new().unwrap();
    let gate = gate(temp.path(), &[]);

    post(&gate, "s1", "Bash", json!("api_key=abcdef1234567890 ok"));
    post(&gate, "s1", "Bash", json!("Error: command not found"));

    let lines = audit_lines(temp.path());
    assert_eq!(lines[0]["ok"], true);
    let snippet = lines[0]["response_snippet"].as_str().unwrap();
    assert!(snippet.contains("REDACTED"));
    assert!(!snippet.contains("abcdef1234567890"));
    assert_eq!(lines[1]["ok"], false);
    assert!(lines[0]["request_size"].as_u64().unwrap() > 0);
}

#[test]
fn test_post_tool_without_response_is_failure() {
    let temp = TempDir::new().unwrap();
    let gate = gate(temp.path(), &[]);
    assert_eq!(gate.post_tool(r#"{"tool_name":"Read","session_id":"s1"}"#), Verdict::Proceed);

    let record = &audit_lines(temp.path())[0];
    assert_eq!(record["ok"], false);
    assert_eq!(record["response_size"], 0);
    assert_eq!(record["response_snippet"], "");
}

#[test]
fn test_session_end_writes_card_for_this_session_only() {
    let temp = TempDir::new().unwrap();
    let earlier = gate(temp.path(), &[("AUV_ID", "AUV-5")]);
    post(&earlier, "s1", "Bash", json!("before start"));

    let gate = gate(temp.path(), &[("AUV_ID", "AUV-5")]);
    gate.session_start(r#"{"session_id":"s1"}"#);
    post(&gate, "s1", "Bash", json!("ok"));
    post(&gate, "s1", "Bash", json!("fail to run"));
    post(&gate, "s1", "Write", json!({"written": true}));
    post(&gate, "s2", "Bash", json!("other session"));

    assert_eq!(gate.session_end(r#"{"session_id":"s1"}"#), Verdict::Proceed);

    let card: Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("runs/AUV-5/result-cards/session-s1.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(card["event"], "SessionEnd");
    assert_eq!(card["summary"]["total_tools"], 3);
    assert_eq!(card["summary"]["failures"], 1);
    assert_eq!(card["summary"]["per_tool"]["Bash"]["fail"], 1);

    let last = audit_lines(temp.path()).pop().unwrap();
    assert_eq!(last["event"], "SessionEnd");
    assert_eq!(last["summary_total"], 3);
}

#[test]
fn test_session_end_skipped_outside_orchestration() {
    let temp = TempDir::new().unwrap();
    let gate = gate(temp.path(), &[]);
    assert_eq!(gate.session_end(r#"{"session_id":"s1"}"#), Verdict::Proceed);
    assert!(audit_lines(temp.path()).is_empty());
}

#[test]
fn test_subagent_stop_filters_by_agent() {
    let temp = TempDir::new().unwrap();
    let main = gate(temp.path(), &[("AUV_ID", "AUV-5"), ("CLAUDE_AGENT_NAME", "main")]);
    let tester = gate(
        temp.path(),
        &[("AUV_ID", "AUV-5"), ("CLAUDE_AGENT_NAME", "tester"), ("HOOKS_MODE", "warn")],
    );
    post(&main, "s1", "Bash", json!("ok"));
    post(&tester, "s1", "Bash", json!("error: boom"));

    assert_eq!(tester.subagent_stop(r#"{"session_id":"s1"}"#), Verdict::Proceed);
    let card: Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("runs/AUV-5/result-cards/subagent-tester-s1.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(card["summary"]["total_tools"], 1);
    assert_eq!(card["summary"]["failures"], 1);
}

#[test]
fn test_subagent_stop_skipped_when_mode_off() {
    let temp = TempDir::new().unwrap();
    let gate = gate(temp.path(), &[("AUV_ID", "AUV-5")]);
    assert_eq!(gate.subagent_stop(r#"{"session_id":"s1"}"#), Verdict::Proceed);
    assert!(!temp.path().join("runs/AUV-5").exists());
}

#[test]
fn test_lifecycle_failure_is_counted() {
    let temp = TempDir::new().unwrap();
    let gate = gate(temp.path(), &[]);
    let verdict = gate.session_start("[1, 2, 3]");
    assert_eq!(verdict.exit_code(), 1);
    assert_eq!(gate.breaker().error_count("unknown").unwrap(), 1);
}
