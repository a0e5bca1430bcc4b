use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hook lifecycle event, serialized with the host's event names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    PreToolUse,
    PostToolUse,
    SessionStart,
    SessionEnd,
    SubagentStop,
}

/// Identifiers common to every record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HookContext {
    pub session_id: Option<String>,
    pub agent: String,
    /// Orchestration run identifier.
    pub auv: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostToolRecord {
    pub ts: DateTime<Utc>,
    pub event: EventKind,
    #[serde(flatten)]
    pub context: HookContext,
    pub tool: String,
    pub ok: bool,
    pub request_size: usize,
    pub response_size: usize,
    pub response_snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartRecord {
    pub ts: DateTime<Utc>,
    pub event: EventKind,
    #[serde(flatten)]
    pub context: HookContext,
    pub env: BTreeMap<String, Option<String>>,
}

/// Closing line for a session or sub-agent roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub ts: DateTime<Utc>,
    pub event: EventKind,
    #[serde(flatten)]
    pub context: HookContext,
    pub summary_total: u64,
    pub summary_failures: u64,
}
