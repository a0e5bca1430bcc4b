use crate::audit_log::AuditError;
use crate::records::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolTally {
    pub ok: u64,
    pub fail: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub total_tools: u64,
    pub failures: u64,
    pub per_tool: BTreeMap<String, ToolTally>,
}

/// Which `PostToolUse` records count toward a roll-up.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter<'a> {
    pub session_id: Option<&'a str>,
    /// Restrict to one agent (sub-agent roll-ups).
    pub agent: Option<&'a str>,
}

impl SummaryFilter<'_> {
    fn matches(&self, record: &Value) -> bool {
        if record.get("event").and_then(Value::as_str) != Some("PostToolUse") {
            return false;
        }
        if record.get("session_id").and_then(Value::as_str) != self.session_id {
            return false;
        }
        match self.agent {
            Some(agent) => record.get("agent").and_then(Value::as_str) == Some(agent),
            None => true,
        }
    }
}

/// Persisted roll-up written under `runs/<run>/result-cards/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCard {
    pub ts: DateTime<Utc>,
    pub event: EventKind,
    pub session_id: Option<String>,
    pub agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auv: Option<String>,
    pub summary: SessionSummary,
}

impl ResultCard {
    pub fn write(&self, path: &Path) -> Result<(), AuditError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Tally tool outcomes from the log, starting at `offset` and reading at most
/// the last `max_bytes` after it. Unparseable lines are skipped.
pub fn summarize(
    log_path: &Path,
    filter: &SummaryFilter<'_>,
    offset: u64,
    max_bytes: u64,
) -> Result<SessionSummary, AuditError> {
    let mut file = match File::open(log_path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionSummary::default()),
        Err(e) => return Err(e.into()),
    };

    let len = file.metadata()?.len();
    // The log may have been rotated since the offset was taken.
    let offset = if offset > len { 0 } else { offset };
    let start = offset.max(len.saturating_sub(max_bytes));
    // Drop the first line only when the tail scan starts inside a record.
    let mut skip_partial = false;
    if start > offset {
        file.seek(SeekFrom::Start(start - 1))?;
        let mut prev = [0u8; 1];
        file.read_exact(&mut prev)?;
        skip_partial = prev[0] != b'\n';
    } else {
        file.seek(SeekFrom::Start(start))?;
    }

    let mut reader = BufReader::new(file.take(len - start));
    let mut buf = Vec::new();
    let mut summary = SessionSummary::default();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if std::mem::take(&mut skip_partial) {
            continue;
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if !filter.matches(&record) {
            continue;
        }

        let tool = record
            .get("tool")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let ok = record.get("ok").and_then(Value::as_bool).unwrap_or(false);

        let tally = summary.per_tool.entry(tool).or_default();
        if ok {
            tally.ok += 1;
        } else {
            tally.fail += 1;
            summary.failures += 1;
        }
        summary.total_tools += 1;
    }

    tracing::debug!(
        "Summarized {} tool events ({} failures) from {}",
        summary.total_tools,
        summary.failures,
        log_path.display()
    );
    Ok(summary)
}
