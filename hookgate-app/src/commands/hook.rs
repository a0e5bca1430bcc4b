use hookgate_core::{Gate, Verdict};
use std::io::{self, IsTerminal, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreTool,
    PostTool,
    SessionStart,
    SessionEnd,
    SubagentStop,
}

/// Feed stdin to the hook. Only `PreTool` can block; the other hooks always
/// exit 0.
pub fn run(gate: &Gate, kind: HookKind) -> u8 {
    let raw = read_payload();
    let verdict = match kind {
        HookKind::PreTool => gate.pre_tool(&raw),
        HookKind::PostTool => gate.post_tool(&raw),
        HookKind::SessionStart => gate.session_start(&raw),
        HookKind::SessionEnd => gate.session_end(&raw),
        HookKind::SubagentStop => gate.subagent_stop(&raw),
    };

    if let Verdict::Block(reason) = &verdict {
        eprintln!("{}", reason);
    }
    match kind {
        HookKind::PreTool => exit_code(&verdict),
        _ => 0,
    }
}

fn exit_code(verdict: &Verdict) -> u8 {
    match verdict.exit_code() {
        0 => 0,
        2 => 2,
        _ => 1,
    }
}

/// A terminal on stdin means there is no payload; a read failure is
/// reported the same way and becomes a malformed request downstream.
fn read_payload() -> String {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return String::new();
    }
    let mut raw = String::new();
    if let Err(e) = stdin.read_to_string(&mut raw) {
        tracing::warn!("Failed to read hook payload: {}", e);
        return String::new();
    }
    raw
}
