//! Session lifecycle hooks. None of them can block; a failure is counted
//! against the circuit breaker and reported as an internal error.

use crate::config::GateMode;
use crate::error::GateError;
use crate::gate::{Gate, Verdict};
use crate::request::HookInput;
use chrono::Utc;
use hookgate_audit::{
    summarize, AuditLog, EventKind, PostToolRecord, Redactor, ResultCard, SessionStartRecord, SessionSummary,
    SummaryFilter, SummaryRecord,
};
use hookgate_store::{session_or_unknown, LedgerStore, LogOffsets};
use serde_json::Value;
use std::collections::BTreeMap;

const SNIPPET_CHARS: usize = 1000;
const UNKNOWN_RUN: &str = "AUV-unknown";

impl Gate {
    /// Zero the session ledger, remember where the session's log lines
    /// begin and record the environment snapshot.
    pub fn session_start(&self, raw: &str) -> Verdict {
        self.run_hook("session-start", raw, |input| {
            let session_id = input.session_id();
            let key = session_or_unknown(session_id.as_deref());

            self.ledger().reset(key)?;
            let log = AuditLog::new(self.layout().log_path())?;
            LogOffsets::new(self.layout().session_dir()).save(key, log.size()?)?;

            let config = self.config();
            let env = BTreeMap::from([
                ("STAGING_URL".to_string(), config.staging_url.clone()),
                ("API_BASE".to_string(), config.api_base.clone()),
            ]);
            log.append(&SessionStartRecord {
                ts: Utc::now(),
                event: EventKind::SessionStart,
                context: config.context(session_id.as_deref()),
                env,
            })?;
            Ok(())
        })
    }

    /// Record the outcome of a finished tool call with secrets masked.
    pub fn post_tool(&self, raw: &str) -> Verdict {
        self.run_hook("post-tool", raw, |input| {
            let response = input.tool_response();
            let request_size = match input.params_value() {
                Some(value @ (Value::Object(_) | Value::Array(_))) => serde_json::to_vec(value)?.len(),
                _ => 0,
            };
            let (response_size, snippet) = match response {
                Some(value) => {
                    let text = serde_json::to_string(value)?;
                    (text.len(), Redactor::new().snippet(&text, SNIPPET_CHARS))
                }
                None => (0, String::new()),
            };

            self.append(&PostToolRecord {
                ts: Utc::now(),
                event: EventKind::PostToolUse,
                context: self.config().context(input.session_id().as_deref()),
                tool: input.tool_id(),
                ok: response.is_some_and(response_ok),
                request_size,
                response_size,
                response_snippet: snippet,
            })
        })
    }

    /// Roll up the session's tool outcomes into a result card.
    pub fn session_end(&self, raw: &str) -> Verdict {
        self.run_hook("session-end", raw, |input| {
            if !self.config().governs() {
                return Ok(());
            }
            let session_id = input.session_id();
            let summary = self.rollup(session_id.as_deref(), None)?;

            if let Some(run_id) = &self.config().run_id {
                let name = format!("session-{}.json", card_key(session_id.as_deref()));
                self.write_card(run_id, &name, EventKind::SessionEnd, session_id.as_deref(), &summary)?;
            }
            self.append_summary(EventKind::SessionEnd, session_id.as_deref(), &summary)
        })
    }

    /// Roll up the current agent's share of the session.
    pub fn subagent_stop(&self, raw: &str) -> Verdict {
        self.run_hook("subagent-stop", raw, |input| {
            let config = self.config();
            if config.disabled
                || self.breaker().is_tripped()
                || !config.governs()
                || config.mode == GateMode::Off
            {
                return Ok(());
            }
            let session_id = input.session_id();
            let summary = self.rollup(session_id.as_deref(), Some(config.agent.as_str()))?;

            let run_id = config.run_id.as_deref().unwrap_or(UNKNOWN_RUN);
            let name = format!(
                "subagent-{}-{}.json",
                config.agent,
                card_key(session_id.as_deref())
            );
            self.write_card(run_id, &name, EventKind::SubagentStop, session_id.as_deref(), &summary)?;
            self.append_summary(EventKind::SubagentStop, session_id.as_deref(), &summary)
        })
    }

    fn run_hook<F>(&self, hook: &str, raw: &str, body: F) -> Verdict
    where
        F: FnOnce(&HookInput) -> Result<(), GateError>,
    {
        let input = match HookInput::parse_or_default(raw) {
            Ok(input) => input,
            Err(e) => return self.hook_failed(hook, None, e),
        };
        match body(&input) {
            Ok(()) => Verdict::Proceed,
            Err(e) => self.hook_failed(hook, input.session_id().as_deref(), e),
        }
    }

    fn hook_failed(&self, hook: &str, session_id: Option<&str>, error: GateError) -> Verdict {
        tracing::warn!("{} hook failed: {}", hook, error);
        self.record_failure(session_id);
        Verdict::InternalError(error.to_string())
    }

    fn rollup(&self, session_id: Option<&str>, agent: Option<&str>) -> Result<SessionSummary, GateError> {
        let offset = LogOffsets::new(self.layout().session_dir()).load(session_or_unknown(session_id));
        let filter = SummaryFilter { session_id, agent };
        Ok(summarize(
            &self.layout().log_path(),
            &filter,
            offset,
            self.config().max_log_bytes,
        )?)
    }

    fn write_card(
        &self,
        run_id: &str,
        name: &str,
        event: EventKind,
        session_id: Option<&str>,
        summary: &SessionSummary,
    ) -> Result<(), GateError> {
        let card = ResultCard {
            ts: Utc::now(),
            event,
            session_id: session_id.map(str::to_string),
            agent: self.config().agent.clone(),
            auv: self.config().run_id.clone(),
            summary: summary.clone(),
        };
        card.write(&self.layout().result_cards_dir(run_id).join(name))?;
        Ok(())
    }

    fn append_summary(
        &self,
        event: EventKind,
        session_id: Option<&str>,
        summary: &SessionSummary,
    ) -> Result<(), GateError> {
        self.append(&SummaryRecord {
            ts: Utc::now(),
            event,
            context: self.config().context(session_id),
            summary_total: summary.total_tools,
            summary_failures: summary.failures,
        })
    }
}

/// A response counts as failed when it reads like an error message.
fn response_ok(response: &Value) -> bool {
    let text = match response {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let head: String = text.trim().to_lowercase().chars().take(5).collect();
    head != "error" && head != "fail "
}

fn card_key(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if !id.is_empty() => id.replace(['/', '\\'], "_"),
        _ => Utc::now().timestamp().to_string(),
    }
}
